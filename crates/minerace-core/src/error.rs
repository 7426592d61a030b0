//! Error types for minerace.
use thiserror::Error;

use crate::types::Checksum;

/// Which admission check rejected a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionCheck {
    ProofOfWork,
    Height,
    Linkage,
}

impl std::fmt::Display for AdmissionCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProofOfWork => f.write_str("proof-of-work"),
            Self::Height => f.write_str("height"),
            Self::Linkage => f.write_str("linkage"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("checksum mismatch: received {received}, calculated {calculated}")] ChecksumMismatch { received: Checksum, calculated: Checksum },
    #[error("insufficient work: {checksum} has {leading_zeros} leading zero bits, need {difficulty}")] InsufficientWork { checksum: Checksum, leading_zeros: u32, difficulty: u32 },
    #[error("difficulty mismatch: got {got}, expected {expected}")] DifficultyMismatch { got: u32, expected: u32 },
    #[error("stale height: got {got}, expected {expected}")] StaleHeight { got: u64, expected: u64 },
    #[error("unexpected height: got {got}, expected {expected}")] UnexpectedHeight { got: u64, expected: u64 },
    #[error("broken linkage: prev checksum {got}, head checksum {expected}")] BrokenLinkage { got: Checksum, expected: Checksum },
}

impl AdmissionError {
    /// The check that produced this rejection.
    pub fn check(&self) -> AdmissionCheck {
        match self {
            Self::ChecksumMismatch { .. }
            | Self::InsufficientWork { .. }
            | Self::DifficultyMismatch { .. } => AdmissionCheck::ProofOfWork,
            Self::StaleHeight { .. } | Self::UnexpectedHeight { .. } => AdmissionCheck::Height,
            Self::BrokenLinkage { .. } => AdmissionCheck::Linkage,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("height mismatch: expected {expected}, got {got}")] HeightMismatch { expected: u64, got: u64 },
    #[error("linkage mismatch at height {height}: prev {got}, expected {expected}")] LinkageMismatch { height: u64, got: Checksum, expected: Checksum },
    #[error("checksum mismatch at height {height}: stored {stored}, calculated {calculated}")] ChecksumMismatch { height: u64, stored: Checksum, calculated: Checksum },
    #[error("insufficient work at height {height}: {checksum}")] InsufficientWork { height: u64, checksum: Checksum },
    #[error("length {length} does not match head height {head_height}")] LengthMismatch { length: u64, head_height: u64 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("difficulty {got} out of range 0..={max}")] DifficultyOutOfRange { got: u32, max: u32 },
    #[error("no producers configured")] NoProducers,
    #[error("byzantine interval must be non-zero")] ZeroInterval,
}
