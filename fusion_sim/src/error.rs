// fusion_sim/src/error.rs

use thiserror::Error;

use fusion_core::error::{ConfigError, FilterError};

/// Everything that can stop the driver.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] figment::Error),

    #[error("invalid filter configuration: {0}")]
    InvalidFilter(#[from] ConfigError),

    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("record at line {line} rejected by the filter: {source}")]
    Filter {
        line: usize,
        #[source]
        source: FilterError,
    },
}
