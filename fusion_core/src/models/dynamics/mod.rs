// fusion_core/src/models/dynamics/mod.rs

use crate::types::{AugmentedVector, StateVector};
use std::fmt::Debug;

/// A trait for the motion models driven by the unscented filter.
///
/// The model maps one augmented sigma point (state plus process-noise terms)
/// to the state it predicts `dt` seconds later. It is a closed-form map, so
/// no Jacobian and no numerical integrator are involved.
pub trait MotionModel: Debug + Send + Sync {
    /// Propagates one augmented sigma point forward by `dt` seconds.
    fn propagate(&self, sigma_point: &AugmentedVector, dt: f64) -> StateVector;

    /// The difference `a - b` of two states, with angular components wrapped.
    ///
    /// Every covariance sum over state residuals goes through this method.
    fn residual(&self, a: &StateVector, b: &StateVector) -> StateVector {
        a - b
    }

    /// Brings a state back into its canonical form (e.g. wrapped angles).
    fn normalize(&self, x: StateVector) -> StateVector {
        x
    }
}

pub mod ctrv;

pub use ctrv::CtrvModel;
