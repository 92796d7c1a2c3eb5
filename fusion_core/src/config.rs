// fusion_core/src/config.rs

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::messages::SensorType;
use crate::types::{N_AUG, N_X};

/// How the sigma-point scaling parameter `lambda` is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LambdaConvention {
    /// `lambda = 3 - n_x`, even though points are drawn in the augmented space.
    #[default]
    StateDim,
    /// `lambda = 3 - n_aug`.
    AugmentedDim,
}

impl LambdaConvention {
    pub fn lambda(self) -> f64 {
        match self {
            LambdaConvention::StateDim => 3.0 - N_X as f64,
            LambdaConvention::AugmentedDim => 3.0 - N_AUG as f64,
        }
    }
}

/// What the radar model does with a sigma point sitting (almost) on the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegenerateRangePolicy {
    /// Clamp the range to a small positive floor and keep going.
    #[default]
    Clamp,
    /// Fail the update with `FilterError::DegenerateMeasurement`.
    Reject,
}

/// # UkfConfig
/// Every construction-time tunable of the estimator. It is validated once
/// when the filter is built and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)] // Fail if the TOML has fields not in our struct
pub struct UkfConfig {
    /// Process noise standard deviation of longitudinal acceleration, m/s^2.
    pub std_a: f64,
    /// Process noise standard deviation of yaw acceleration, rad/s^2.
    pub std_yawdd: f64,
    /// Lidar noise standard deviation of px, m.
    pub std_laspx: f64,
    /// Lidar noise standard deviation of py, m.
    pub std_laspy: f64,
    /// Radar noise standard deviation of range, m.
    pub std_radr: f64,
    /// Radar noise standard deviation of bearing, rad.
    pub std_radphi: f64,
    /// Radar noise standard deviation of range rate, m/s.
    pub std_radrd: f64,
    /// If false, lidar measurements are ignored entirely, initialization included.
    pub use_laser: bool,
    /// If false, radar measurements are ignored entirely, initialization included.
    pub use_radar: bool,
    pub lambda: LambdaConvention,
    pub degenerate_range: DegenerateRangePolicy,
}

impl Default for UkfConfig {
    fn default() -> Self {
        Self {
            std_a: 0.25,
            std_yawdd: 0.25,
            std_laspx: 0.15,
            std_laspy: 0.15,
            std_radr: 0.3,
            std_radphi: 0.03,
            std_radrd: 0.3,
            use_laser: true,
            use_radar: true,
            lambda: LambdaConvention::default(),
            degenerate_range: DegenerateRangePolicy::default(),
        }
    }
}

impl UkfConfig {
    /// Checks every parameter once. Process noise may be zero; measurement
    /// noise must be strictly positive so `R` stays invertible.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("std_a", self.std_a), ("std_yawdd", self.std_yawdd)] {
            check_finite(name, value)?;
            if value < 0.0 {
                return Err(ConfigError::NegativeStdDev { name, value });
            }
        }

        for (name, value) in [
            ("std_laspx", self.std_laspx),
            ("std_laspy", self.std_laspy),
            ("std_radr", self.std_radr),
            ("std_radphi", self.std_radphi),
            ("std_radrd", self.std_radrd),
        ] {
            check_finite(name, value)?;
            if value <= 0.0 {
                return Err(ConfigError::NonPositiveStdDev { name, value });
            }
        }

        if !self.use_laser && !self.use_radar {
            return Err(ConfigError::NoSensorEnabled);
        }

        let lambda = self.lambda.lambda();
        if lambda + N_AUG as f64 <= 0.0 {
            return Err(ConfigError::InvalidScaling {
                lambda,
                n_aug: N_AUG,
            });
        }
        Ok(())
    }

    pub fn is_enabled(&self, sensor: SensorType) -> bool {
        match sensor {
            SensorType::Lidar => self.use_laser,
            SensorType::Radar => self.use_radar,
        }
    }
}

fn check_finite(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFiniteParameter { name, value })
    }
}
