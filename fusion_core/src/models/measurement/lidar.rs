// fusion_core/src/models/measurement/lidar.rs

use nalgebra::{Matrix2, Vector2};

use crate::error::FilterError;
use crate::messages::SensorType;
use crate::models::measurement::{diagonal_noise, MeasurementModel};
use crate::state::layout::{PX, PY};
use crate::types::{StateVector, N_LIDAR};

/// A lidar reports the object's Cartesian position directly, so the
/// projection is linear and involves no angles.
#[derive(Debug, Clone)]
pub struct LidarModel {
    /// The 2x2 measurement noise covariance matrix, R.
    r_matrix: Matrix2<f64>,
}

impl LidarModel {
    pub fn new(std_px: f64, std_py: f64) -> Self {
        Self {
            r_matrix: diagonal_noise([std_px, std_py]),
        }
    }
}

impl MeasurementModel<N_LIDAR> for LidarModel {
    const SENSOR: SensorType = SensorType::Lidar;

    fn noise_covariance(&self) -> &Matrix2<f64> {
        &self.r_matrix
    }

    fn project(&self, x: &StateVector) -> Result<Vector2<f64>, FilterError> {
        Ok(Vector2::new(x[PX], x[PY]))
    }

    fn initial_state(&self, z: &Vector2<f64>) -> StateVector {
        StateVector::new(z.x, z.y, 0.0, 0.0, 0.0)
    }
}
