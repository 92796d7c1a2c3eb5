// fusion_core/src/prelude.rs

// --- Core Abstractions (The main contracts of the library) ---
pub use crate::estimation::{ProcessOutcome, StateEstimator};
pub use crate::models::dynamics::MotionModel;
pub use crate::models::measurement::MeasurementModel;

// --- Core Data Structures (The "nouns" of the library) ---
pub use crate::config::{DegenerateRangePolicy, LambdaConvention, UkfConfig};
pub use crate::error::{ConfigError, FilterError};
pub use crate::messages::{MeasurementData, MeasurementPackage, SensorType};
pub use crate::state::{FilterState, StateVariable};
pub use crate::types::{Covariance, StateVector, TimestampUs};

// --- Estimation Algorithms ---
pub use crate::estimation::filters::UnscentedKalmanFilter;
pub use crate::estimation::ukf::{ukf_predict, ukf_update, UkfMeasurementParams, UkfParams};

// --- Concrete Model Implementations ---
pub use crate::consistency::{chi_square_95, NisMonitor};
pub use crate::models::dynamics::CtrvModel;
pub use crate::models::measurement::{LidarModel, RadarModel};
