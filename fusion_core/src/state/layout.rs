// fusion_core/src/state/layout.rs
use crate::state::StateVariable;
use crate::types::{N_AUG, N_X};

// --- Indices into the CTRV state vector ---
pub const PX: usize = 0;
pub const PY: usize = 1;
pub const SPEED: usize = 2;
pub const YAW: usize = 3;
pub const YAW_RATE: usize = 4;

// --- Indices of the noise terms appended to the augmented state ---
pub const NU_ACCEL: usize = N_X;
pub const NU_YAW_ACCEL: usize = N_X + 1;

const _: () = assert!(NU_YAW_ACCEL + 1 == N_AUG);

/// Returns the layout of the 5-dimensional CTRV state vector.
///
/// The state is composed of:
/// - Position (2) in the tracking plane
/// - Speed magnitude (1)
/// - Heading and heading rate (2)
pub fn ctrv_state_layout() -> [StateVariable; N_X] {
    [
        StateVariable::Px,      // index 0
        StateVariable::Py,      // index 1
        StateVariable::Speed,   // index 2
        StateVariable::Yaw,     // index 3
        StateVariable::YawRate, // index 4
    ]
}
