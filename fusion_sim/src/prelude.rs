// fusion_sim/src/prelude.rs

// Re-export the entire fusion_core prelude so the driver can reach the
// filter, its config and the measurement types from one place.
pub use fusion_core::prelude::*;

// Re-export common driver types.
pub use crate::cli::{Cli, Command};
pub use crate::config::{ScenarioConfig, SimConfig};
pub use crate::error::SimError;
pub use crate::records::{format_record, parse_records, Record};
pub use crate::runner::{RunReport, CSV_HEADER};
pub use crate::synthetic::{generate, SyntheticTrack};
