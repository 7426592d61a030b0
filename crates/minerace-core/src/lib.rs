//! # minerace-core
//! Block and chain model, checksum digests, difficulty predicate and the
//! admission rules the validator applies to every candidate.

pub mod block_validation;
pub mod chain;
pub mod constants;
pub mod difficulty;
pub mod digest;
pub mod error;
pub mod genesis;
pub mod types;

pub use chain::{Chain, ChainTip};
pub use difficulty::{meets_difficulty, Difficulty};
pub use digest::{ChecksumProvider, Crc32Checksum, Sha256Checksum};
pub use types::{Block, BlockHeader, Checksum, ProducerId};

/// Wall-clock source in Unix seconds.
///
/// Injected everywhere a timestamp is taken so tests can pin time.
pub type Clock = std::sync::Arc<dyn Fn() -> u64 + Send + Sync>;

/// The system clock.
pub fn system_clock() -> Clock {
    std::sync::Arc::new(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    })
}
