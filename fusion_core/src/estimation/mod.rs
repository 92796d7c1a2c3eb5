// fusion_core/src/estimation/mod.rs

use crate::error::FilterError;
use crate::messages::{MeasurementPackage, SensorType};
use crate::state::FilterState;

/// What a single call to [`StateEstimator::process`] did with its record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProcessOutcome {
    /// The first accepted record seeded the state; no prediction ran.
    Initialized { sensor: SensorType },
    /// A full predict/update cycle ran.
    Updated { sensor: SensorType, nis: f64 },
    /// The sensor is disabled; the record was dropped without side effects.
    Ignored { sensor: SensorType },
}

impl ProcessOutcome {
    pub fn sensor(&self) -> SensorType {
        match *self {
            ProcessOutcome::Initialized { sensor }
            | ProcessOutcome::Updated { sensor, .. }
            | ProcessOutcome::Ignored { sensor } => sensor,
        }
    }

    pub fn nis(&self) -> Option<f64> {
        match *self {
            ProcessOutcome::Updated { nis, .. } => Some(nis),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProcessOutcome::Initialized { .. } => "initialized",
            ProcessOutcome::Updated { .. } => "updated",
            ProcessOutcome::Ignored { .. } => "ignored",
        }
    }
}

/// The contract for any algorithm that performs the "State Estimator" role.
/// Its sole responsibility is to estimate the state of one tracked object.
pub trait StateEstimator: Send + Sync {
    /// The single, unified method for processing a measurement record.
    fn process(&mut self, package: &MeasurementPackage) -> Result<ProcessOutcome, FilterError>;

    /// Returns a reference to the current best estimate of the state.
    fn state(&self) -> Result<&FilterState, FilterError>;

    /// Drops the estimate; the next accepted record initializes again.
    fn reset(&mut self);
}

pub mod filters;
pub mod sigma_points;
pub mod ukf;
