// fusion_core/src/utils/angles.rs

use num_traits::{Float, FloatConst};

/// Wraps an arbitrary angle into `(-pi, pi]`.
///
/// Angles already in range are returned untouched, which makes the wrap
/// idempotent bit for bit. Everything else takes one exact `fmod` and at most
/// one shift by `2pi`, so the cost does not depend on how far out the input is.
pub fn normalize_angle<T: Float + FloatConst>(angle: T) -> T {
    let pi = T::PI();
    if angle > -pi && angle <= pi {
        return angle;
    }

    let two_pi = pi + pi;
    // `%` is exact and lands in (-2pi, 2pi).
    let wrapped = angle % two_pi;
    if wrapped > pi {
        wrapped - two_pi
    } else if wrapped <= -pi {
        wrapped + two_pi
    } else {
        wrapped
    }
}

/// Difference `a - b` of two angles, wrapped into `(-pi, pi]`.
pub fn angle_difference<T: Float + FloatConst>(a: T, b: T) -> T {
    normalize_angle(a - b)
}
