//! Error types for running a simulation.
use thiserror::Error;

use minerace_core::error::ConfigError;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("invalid configuration: {0}")] Config(#[from] ConfigError),
    #[error("failed to spawn {worker}: {source}")] Spawn { worker: String, source: std::io::Error },
    #[error("worker {0} panicked")] WorkerPanicked(String),
}
