// fusion_core/src/state.rs

use nalgebra::Vector2;
use std::fmt;

use crate::types::{Covariance, StateVector, TimestampUs};

pub mod layout;

/// An enum naming every variable of the CTRV state vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateVariable {
    // --- Cartesian Position ---
    Px,
    Py,
    // --- Speed magnitude along the heading ---
    Speed,
    // --- Heading, kept in (-pi, pi] ---
    Yaw,
    YawRate,
}

impl StateVariable {
    /// Position of this variable in the state vector.
    pub const fn index(self) -> usize {
        match self {
            StateVariable::Px => layout::PX,
            StateVariable::Py => layout::PY,
            StateVariable::Speed => layout::SPEED,
            StateVariable::Yaw => layout::YAW,
            StateVariable::YawRate => layout::YAW_RATE,
        }
    }

    /// A short, stable name used for column headers.
    pub const fn name(self) -> &'static str {
        match self {
            StateVariable::Px => "px",
            StateVariable::Py => "py",
            StateVariable::Speed => "v",
            StateVariable::Yaw => "yaw",
            StateVariable::YawRate => "yaw_rate",
        }
    }
}

impl fmt::Display for StateVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The estimate owned by a filter: the state mean `x`, its covariance `P`,
/// and the timestamp of the last measurement folded into it.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    /// The state mean `x`.
    pub x: StateVector,
    /// The covariance matrix `P`.
    pub p: Covariance,
    /// The timestamp of the last update, in microseconds.
    pub timestamp_us: TimestampUs,
}

impl FilterState {
    /// Creates a state with the given mean and an identity covariance.
    pub fn with_unit_covariance(x: StateVector, timestamp_us: TimestampUs) -> Self {
        Self {
            x,
            p: Covariance::identity(),
            timestamp_us,
        }
    }

    /// Reads a single variable out of the mean.
    pub fn get(&self, var: StateVariable) -> f64 {
        self.x[var.index()]
    }

    /// The variance of a single variable, read off the diagonal of `P`.
    pub fn variance(&self, var: StateVariable) -> f64 {
        self.p[(var.index(), var.index())]
    }

    pub fn position(&self) -> Vector2<f64> {
        Vector2::new(self.get(StateVariable::Px), self.get(StateVariable::Py))
    }

    /// Cartesian velocity implied by speed and heading.
    pub fn velocity(&self) -> Vector2<f64> {
        let v = self.get(StateVariable::Speed);
        let yaw = self.get(StateVariable::Yaw);
        Vector2::new(v * yaw.cos(), v * yaw.sin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::layout::ctrv_state_layout;
    use approx::assert_abs_diff_eq;

    #[test]
    fn layout_indices_match_variables() {
        for (i, var) in ctrv_state_layout().iter().enumerate() {
            assert_eq!(var.index(), i);
        }
    }

    #[test]
    fn velocity_follows_heading() {
        let state = FilterState::with_unit_covariance(
            StateVector::new(1.0, 2.0, 2.0, std::f64::consts::FRAC_PI_2, 0.0),
            0,
        );
        let v = state.velocity();
        assert_abs_diff_eq!(v.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v.y, 2.0, epsilon = 1e-12);
        assert_eq!(state.variance(StateVariable::Yaw), 1.0);
    }
}
