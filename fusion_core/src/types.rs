// fusion_core/src/types.rs

use nalgebra::{SMatrix, SVector};

// --- Core Dimensions ---
/// Dimension of the CTRV state `[px, py, v, yaw, yaw_rate]`.
pub const N_X: usize = 5;
/// Dimension of the augmented state: the CTRV state plus the two process-noise terms.
pub const N_AUG: usize = 7;
/// Number of sigma points drawn in the augmented space.
pub const N_SIGMA: usize = 2 * N_AUG + 1;

/// Dimension of a lidar observation `[px, py]`.
pub const N_LIDAR: usize = 2;
/// Dimension of a radar observation `[range, bearing, range_rate]`.
pub const N_RADAR: usize = 3;

// --- Core Type Aliases ---
// Everything is fixed-size so the per-cycle temporaries live on the stack.
pub type StateVector = SVector<f64, N_X>;
pub type Covariance = SMatrix<f64, N_X, N_X>;

pub type AugmentedVector = SVector<f64, N_AUG>;
pub type AugmentedCovariance = SMatrix<f64, N_AUG, N_AUG>;

/// Augmented sigma points, one per column.
pub type AugmentedSigmaPoints = SMatrix<f64, N_AUG, N_SIGMA>;
/// Sigma points after propagation through the motion model, one per column.
pub type PredictedSigmaPoints = SMatrix<f64, N_X, N_SIGMA>;
/// Sigma points projected into an `M`-dimensional measurement space.
pub type MeasurementSigmaPoints<const M: usize> = SMatrix<f64, M, N_SIGMA>;

pub type Weights = SVector<f64, N_SIGMA>;

/// Timestamps are integer microseconds, as delivered by the sensors.
pub type TimestampUs = i64;

/// Converts a microsecond interval to seconds.
pub fn micros_to_seconds(micros: i64) -> f64 {
    micros as f64 / 1.0e6
}
