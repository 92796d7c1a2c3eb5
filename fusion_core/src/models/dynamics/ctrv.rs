// fusion_core/src/models/dynamics/ctrv.rs

use crate::models::dynamics::MotionModel;
use crate::state::layout::{NU_ACCEL, NU_YAW_ACCEL, PX, PY, SPEED, YAW, YAW_RATE};
use crate::types::{AugmentedVector, StateVector};
use crate::utils::angles::normalize_angle;

/// Below this yaw rate (rad/s) the turn is treated as a straight line.
pub const STRAIGHT_LINE_YAW_RATE: f64 = 1e-3;

/// Constant turn rate and velocity magnitude (CTRV) kinematics.
///
/// State: `[px, py, v, yaw, yaw_rate]`. Between two updates the object keeps
/// its speed and turns at a constant rate; the longitudinal and yaw
/// accelerations carried in the augmented sigma point perturb that motion.
#[derive(Debug, Clone, Copy, Default)]
pub struct CtrvModel;

impl CtrvModel {
    /// Noise-free CTRV motion of the position over `dt`.
    fn deterministic_position(
        px: f64,
        py: f64,
        v: f64,
        yaw: f64,
        yaw_rate: f64,
        dt: f64,
    ) -> (f64, f64) {
        if yaw_rate.abs() <= STRAIGHT_LINE_YAW_RATE {
            // Constant-velocity closed form; avoids dividing by a vanishing yaw rate.
            (px + v * yaw.cos() * dt, py + v * yaw.sin() * dt)
        } else {
            let yaw_end = yaw + yaw_rate * dt;
            let radius = v / yaw_rate;
            (
                px + radius * (yaw_end.sin() - yaw.sin()),
                py + radius * (yaw.cos() - yaw_end.cos()),
            )
        }
    }
}

impl MotionModel for CtrvModel {
    fn propagate(&self, sigma_point: &AugmentedVector, dt: f64) -> StateVector {
        // --- Extract state and noise terms ---
        let px = sigma_point[PX];
        let py = sigma_point[PY];
        let v = sigma_point[SPEED];
        let yaw = sigma_point[YAW];
        let yaw_rate = sigma_point[YAW_RATE];
        let nu_a = sigma_point[NU_ACCEL];
        let nu_yawdd = sigma_point[NU_YAW_ACCEL];

        let (px_p, py_p) = Self::deterministic_position(px, py, v, yaw, yaw_rate, dt);
        let half_dt2 = 0.5 * dt * dt;

        // --- Add the effect of the noise terms ---
        StateVector::new(
            px_p + half_dt2 * yaw.cos() * nu_a,
            py_p + half_dt2 * yaw.sin() * nu_a,
            v + dt * nu_a,
            yaw + yaw_rate * dt + half_dt2 * nu_yawdd,
            yaw_rate + dt * nu_yawdd,
        )
    }

    fn residual(&self, a: &StateVector, b: &StateVector) -> StateVector {
        let mut diff = a - b;
        diff[YAW] = normalize_angle(diff[YAW]);
        diff
    }

    fn normalize(&self, mut x: StateVector) -> StateVector {
        x[YAW] = normalize_angle(x[YAW]);
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn augmented(x: [f64; 5], nu_a: f64, nu_yawdd: f64) -> AugmentedVector {
        AugmentedVector::from_column_slice(&[x[0], x[1], x[2], x[3], x[4], nu_a, nu_yawdd])
    }

    #[test]
    fn straight_line_below_yaw_rate_threshold() {
        let model = CtrvModel;
        let dt = 0.5;
        for yaw_rate in [0.0, 1e-3, -1e-3, 5e-4] {
            let out = model.propagate(&augmented([1.0, 2.0, 4.0, FRAC_PI_2 / 3.0, yaw_rate], 0.0, 0.0), dt);
            let yaw = FRAC_PI_2 / 3.0;
            assert!(out.iter().all(|v| v.is_finite()));
            assert_abs_diff_eq!(out[PX], 1.0 + 4.0 * yaw.cos() * dt, epsilon = 1e-12);
            assert_abs_diff_eq!(out[PY], 2.0 + 4.0 * yaw.sin() * dt, epsilon = 1e-12);
            assert_abs_diff_eq!(out[YAW], yaw + yaw_rate * dt, epsilon = 1e-12);
        }
    }

    #[test]
    fn quarter_turn_follows_the_circle() {
        // Radius v / yaw_rate = 2, a quarter turn starting eastwards.
        let model = CtrvModel;
        let out = model.propagate(&augmented([0.0, 0.0, 2.0, 0.0, FRAC_PI_2], 0.0, 0.0), 1.0);
        assert_abs_diff_eq!(out[PX], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out[PY], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out[SPEED], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out[YAW], FRAC_PI_2, epsilon = 1e-12);
        assert_abs_diff_eq!(out[YAW_RATE], FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn noise_terms_enter_as_accelerations() {
        let model = CtrvModel;
        let dt = 0.2;
        let out = model.propagate(&augmented([0.0, 0.0, 0.0, 0.0, 0.0], 1.5, -0.5), dt);
        assert_abs_diff_eq!(out[PX], 0.5 * dt * dt * 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(out[PY], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out[SPEED], dt * 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(out[YAW], 0.5 * dt * dt * -0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(out[YAW_RATE], dt * -0.5, epsilon = 1e-12);
    }

    #[test]
    fn stationary_point_stays_put() {
        let model = CtrvModel;
        let x = [3.0, -1.0, 0.0, 0.7, 0.0];
        let out = model.propagate(&augmented(x, 0.0, 0.0), 10.0);
        assert_abs_diff_eq!(out, StateVector::from_column_slice(&x), epsilon = 1e-12);
    }

    #[test]
    fn residual_wraps_heading_only() {
        let model = CtrvModel;
        let a = StateVector::new(10.0, 0.0, 0.0, PI - 0.1, 0.0);
        let b = StateVector::new(0.0, 0.0, 0.0, -PI + 0.1, 0.0);
        let d = model.residual(&a, &b);
        assert_abs_diff_eq!(d[PX], 10.0);
        assert_abs_diff_eq!(d[YAW], -0.2, epsilon = 1e-12);
    }
}
