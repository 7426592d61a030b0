//! # minerace-sim: configuration and worker orchestration.
//!
//! - [`config::SimConfig`] - difficulty, worker set, stop condition
//! - [`simulation::Simulation`] - spawns one thread per producer plus the
//!   validator, and joins them on shutdown

pub mod config;
pub mod error;
pub mod simulation;

pub use config::SimConfig;
pub use error::SimError;
pub use simulation::{SimReport, Simulation};
