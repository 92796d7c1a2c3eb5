// fusion_sim/src/lib.rs

// This prelude is for convenience for other files WITHIN the fusion_sim crate.
pub mod prelude;

pub mod cli;
pub mod config;
pub mod error;
pub mod records;
pub mod runner;
pub mod synthetic;
