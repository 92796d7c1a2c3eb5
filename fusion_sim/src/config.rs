// fusion_sim/src/config.rs

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use fusion_core::config::UkfConfig;

use crate::error::SimError;

/// Prefix of the environment variables layered over the file, e.g.
/// `FUSION_FILTER__STD_A=0.5`.
pub const ENV_PREFIX: &str = "FUSION_";

/// The synthetic target driven by the `synth` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    pub seed: u64,
    /// Number of records to generate, lidar and radar alternating.
    pub steps: usize,
    /// Time between consecutive records, microseconds.
    pub dt_us: i64,
    // --- Initial truth state ---
    pub px: f64,
    pub py: f64,
    pub speed: f64,
    pub yaw: f64,
    pub yaw_rate: f64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            steps: 500,
            dt_us: 50_000,
            px: 0.6,
            py: 0.6,
            speed: 5.0,
            yaw: 0.3,
            yaw_rate: 0.2,
        }
    }
}

impl ScenarioConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        if self.dt_us <= 0 {
            return Err(SimError::InvalidScenario(format!(
                "dt_us must be positive, got {}",
                self.dt_us
            )));
        }
        let initial = [self.px, self.py, self.speed, self.yaw, self.yaw_rate];
        if initial.iter().any(|v| !v.is_finite()) {
            return Err(SimError::InvalidScenario(
                "initial state must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// The complete driver configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    pub filter: UkfConfig,
    pub scenario: ScenarioConfig,
}

impl SimConfig {
    /// Built-in defaults, then the optional TOML file, then the environment.
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(SimConfig::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Loads and validates the configuration. A `path` that does not exist
    /// is an error rather than an empty layer.
    pub fn load(path: Option<&Path>) -> Result<Self, SimError> {
        if let Some(path) = path {
            if !path.is_file() {
                return Err(SimError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("config file {} not found", path.display()),
                )));
            }
            info!("Loading configuration from: {}", path.display());
        }

        let config: SimConfig = Self::figment(path).extract()?;
        config.filter.validate()?;
        config.scenario.validate()?;
        Ok(config)
    }

    /// Renders the configuration in the same TOML layout it is read from.
    pub fn to_toml(&self) -> Result<String, SimError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
