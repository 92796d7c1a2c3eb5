// fusion_core/src/models/measurement/mod.rs

use nalgebra::{SMatrix, SVector};
use std::fmt::Debug;

use crate::error::FilterError;
use crate::estimation::sigma_points::weighted_mean;
use crate::messages::SensorType;
use crate::types::{MeasurementSigmaPoints, StateVector, Weights};

// --- MEASUREMENT MODEL TRAIT ---
// Represents the mathematical model of a sensor. `z = h(x) + v`
/// `M` is the dimension of the sensor's observation vector.
pub trait MeasurementModel<const M: usize>: Debug + Send + Sync {
    /// The sensor this model describes.
    const SENSOR: SensorType;

    /// Returns the measurement noise covariance matrix `R`.
    fn noise_covariance(&self) -> &SMatrix<f64, M, M>;

    /// Predicts the ideal measurement `z = h(x)` for one state-space point.
    fn project(&self, x: &StateVector) -> Result<SVector<f64, M>, FilterError>;

    /// Weighted mean of projected sigma points. Models with angular
    /// components override this to average angles on the circle.
    fn mean(&self, points: &MeasurementSigmaPoints<M>, weights: &Weights) -> SVector<f64, M> {
        weighted_mean(points, weights)
    }

    /// The difference `a - b` of two observations, with angular components
    /// wrapped. Every measurement residual in the update goes through here.
    fn residual(&self, a: &SVector<f64, M>, b: &SVector<f64, M>) -> SVector<f64, M> {
        a - b
    }

    /// Seeds a state mean from a first observation. Components the sensor
    /// cannot observe are set to zero.
    fn initial_state(&self, z: &SVector<f64, M>) -> StateVector;
}

/// Builds a diagonal noise covariance from per-component standard deviations.
pub fn diagonal_noise<const M: usize>(std_devs: [f64; M]) -> SMatrix<f64, M, M> {
    SMatrix::from_diagonal(&SVector::from(std_devs.map(|s| s * s)))
}

pub mod lidar;
pub mod radar;

pub use lidar::LidarModel;
pub use radar::RadarModel;
