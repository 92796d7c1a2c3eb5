// fusion_core/src/error.rs

use thiserror::Error;

use crate::messages::SensorType;
use crate::types::TimestampUs;

/// Runtime failures raised while processing a measurement.
///
/// A failed call leaves the filter exactly as it was, so the caller can skip
/// the record, reset the filter, or stop.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("the filter has not been initialized by a measurement yet")]
    UninitializedAccess,

    #[error("augmented covariance is not positive semi-definite; cannot draw sigma points")]
    SingularCovariance,

    #[error("{sensor} innovation covariance is not invertible")]
    SingularInnovation { sensor: SensorType },

    #[error("radar range {range:.3e} is too close to zero to linearize bearing and range rate")]
    DegenerateMeasurement { range: f64 },

    #[error("invalid {sensor} measurement: {reason}")]
    InvalidMeasurement { sensor: SensorType, reason: String },

    #[error("cannot advance from {previous_us} us by {dt_seconds} s: time step out of range")]
    InvalidTimeStep {
        previous_us: TimestampUs,
        dt_seconds: f64,
    },

    #[error("measurement at {timestamp_us} us is older than the last one at {previous_us} us")]
    OutOfOrderMeasurement {
        previous_us: TimestampUs,
        timestamp_us: TimestampUs,
    },
}

/// Construction-time validation failures for [`crate::config::UkfConfig`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("standard deviation `{name}` must be positive, got {value}")]
    NonPositiveStdDev { name: &'static str, value: f64 },

    #[error("standard deviation `{name}` must not be negative, got {value}")]
    NegativeStdDev { name: &'static str, value: f64 },

    #[error("parameter `{name}` must be finite, got {value}")]
    NonFiniteParameter { name: &'static str, value: f64 },

    #[error("sigma-point scaling lambda = {lambda} gives lambda + n_aug <= 0 (n_aug = {n_aug})")]
    InvalidScaling { lambda: f64, n_aug: usize },

    #[error("both lidar and radar are disabled; the filter could never initialize")]
    NoSensorEnabled,
}
