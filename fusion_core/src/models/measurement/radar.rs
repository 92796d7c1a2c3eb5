// fusion_core/src/models/measurement/radar.rs

use nalgebra::{Matrix3, Vector3};
use tracing::warn;

use crate::config::DegenerateRangePolicy;
use crate::error::FilterError;
use crate::estimation::sigma_points::weighted_mean;
use crate::messages::SensorType;
use crate::models::measurement::{diagonal_noise, MeasurementModel};
use crate::state::layout::{PX, PY, SPEED, YAW};
use crate::types::{MeasurementSigmaPoints, StateVector, Weights, N_RADAR};
use crate::utils::angles::normalize_angle;

/// Squared range under which a point counts as sitting on the sensor.
pub const MIN_RANGE_SQUARED: f64 = 1e-3;

const BEARING: usize = 1;

/// A measurement model for a polar radar: `[range, bearing, range_rate]`.
///
/// Bearing and range rate are undefined for a point at the sensor origin.
/// Such points are either clamped to a minimum range or rejected, depending
/// on the configured [`DegenerateRangePolicy`].
#[derive(Debug, Clone)]
pub struct RadarModel {
    /// The 3x3 measurement noise covariance matrix, R.
    r_matrix: Matrix3<f64>,
    degenerate_range: DegenerateRangePolicy,
}

impl RadarModel {
    pub fn new(
        std_range: f64,
        std_bearing: f64,
        std_range_rate: f64,
        degenerate_range: DegenerateRangePolicy,
    ) -> Self {
        Self {
            r_matrix: diagonal_noise([std_range, std_bearing, std_range_rate]),
            degenerate_range,
        }
    }

    pub fn min_range() -> f64 {
        MIN_RANGE_SQUARED.sqrt()
    }
}

impl MeasurementModel<N_RADAR> for RadarModel {
    const SENSOR: SensorType = SensorType::Radar;

    fn noise_covariance(&self) -> &Matrix3<f64> {
        &self.r_matrix
    }

    fn project(&self, x: &StateVector) -> Result<Vector3<f64>, FilterError> {
        let px = x[PX];
        let py = x[PY];
        let v = x[SPEED];
        let yaw = x[YAW];

        let range_squared = px * px + py * py;
        let range = if range_squared < MIN_RANGE_SQUARED {
            match self.degenerate_range {
                DegenerateRangePolicy::Reject => {
                    return Err(FilterError::DegenerateMeasurement {
                        range: range_squared.sqrt(),
                    })
                }
                DegenerateRangePolicy::Clamp => {
                    warn!(range = range_squared.sqrt(), "clamping near-zero radar range");
                    Self::min_range()
                }
            }
        } else {
            range_squared.sqrt()
        };

        let bearing = py.atan2(px);
        let range_rate = (px * v * yaw.cos() + py * v * yaw.sin()) / range;

        Ok(Vector3::new(range, bearing, range_rate))
    }

    fn mean(&self, points: &MeasurementSigmaPoints<N_RADAR>, weights: &Weights) -> Vector3<f64> {
        let mut mean = weighted_mean(points, weights);
        // Bearings may straddle the +-pi seam; average them as unit vectors.
        let (sin_sum, cos_sum) = points
            .row(BEARING)
            .iter()
            .zip(weights.iter())
            .fold((0.0, 0.0), |(s, c), (bearing, w)| {
                (s + w * bearing.sin(), c + w * bearing.cos())
            });
        mean[BEARING] = sin_sum.atan2(cos_sum);
        mean
    }

    fn residual(&self, a: &Vector3<f64>, b: &Vector3<f64>) -> Vector3<f64> {
        let mut diff = a - b;
        diff[BEARING] = normalize_angle(diff[BEARING]);
        diff
    }

    fn initial_state(&self, z: &Vector3<f64>) -> StateVector {
        let (range, bearing) = (z[0], z[BEARING]);
        StateVector::new(range * bearing.cos(), range * bearing.sin(), 0.0, 0.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn model(policy: DegenerateRangePolicy) -> RadarModel {
        RadarModel::new(0.3, 0.03, 0.3, policy)
    }

    #[test]
    fn projects_into_polar_coordinates() {
        // Moving straight away from the sensor along +y.
        let z = model(DegenerateRangePolicy::Clamp)
            .project(&StateVector::new(0.0, 4.0, 2.0, FRAC_PI_2, 0.0))
            .unwrap();
        assert_abs_diff_eq!(z[0], 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(z[1], FRAC_PI_2, epsilon = 1e-12);
        assert_abs_diff_eq!(z[2], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn near_zero_range_is_clamped() {
        let z = model(DegenerateRangePolicy::Clamp)
            .project(&StateVector::new(1e-4, 0.0, 1.0, 0.0, 0.0))
            .unwrap();
        assert_abs_diff_eq!(z[0], RadarModel::min_range(), epsilon = 1e-15);
        assert!(z.iter().all(|v| v.is_finite()));

        // Exactly on the sensor still yields finite values.
        let z = model(DegenerateRangePolicy::Clamp)
            .project(&StateVector::zeros())
            .unwrap();
        assert!(z.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn near_zero_range_is_rejected_when_configured() {
        let err = model(DegenerateRangePolicy::Reject)
            .project(&StateVector::new(0.01, 0.01, 1.0, 0.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, FilterError::DegenerateMeasurement { .. }));
    }

    #[test]
    fn residual_wraps_bearing() {
        let m = model(DegenerateRangePolicy::Clamp);
        let d = m.residual(&Vector3::new(1.0, PI - 0.05, 0.0), &Vector3::new(0.5, -PI + 0.05, 0.0));
        assert_abs_diff_eq!(d[0], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(d[1], -0.1, epsilon = 1e-12);
    }

    #[test]
    fn bearing_mean_respects_the_seam() {
        let m = model(DegenerateRangePolicy::Clamp);
        let weights = Weights::from_element(1.0 / 15.0);
        let mut points = MeasurementSigmaPoints::<N_RADAR>::zeros();
        for i in 0..15 {
            let bearing = if i % 2 == 0 { PI - 0.02 } else { -PI + 0.02 };
            points.set_column(i, &Vector3::new(2.0, bearing, 0.5));
        }
        let mean = m.mean(&points, &weights);
        assert_abs_diff_eq!(mean[0], 2.0, epsilon = 1e-12);
        assert!(mean[1].abs() > PI - 0.03);
        assert_abs_diff_eq!(mean[2], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn initial_state_converts_polar_to_cartesian() {
        let m = model(DegenerateRangePolicy::Clamp);
        assert_eq!(
            m.initial_state(&Vector3::new(5.0, 0.0, 3.0)),
            StateVector::new(5.0, 0.0, 0.0, 0.0, 0.0)
        );
        let x = m.initial_state(&Vector3::new(2.0, FRAC_PI_2, 0.0));
        assert_abs_diff_eq!(x[PX], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x[PY], 2.0, epsilon = 1e-12);
    }
}
