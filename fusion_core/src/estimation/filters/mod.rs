// fusion_core/src/estimation/filters/mod.rs

pub mod ukf;

pub use ukf::UnscentedKalmanFilter;
