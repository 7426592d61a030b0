//! Protocol and simulation constants.

/// Width of a block checksum in bits (W).
pub const CHECKSUM_BITS: u32 = u32::BITS;

/// Largest difficulty that is still a valid configuration.
///
/// At this value only a checksum of exactly zero satisfies the target.
pub const MAX_DIFFICULTY: u32 = CHECKSUM_BITS;

/// Identifier of the first producer. Producers are numbered upward from here.
pub const FIRST_PRODUCER_ID: u32 = 1;

/// Default number of honest miners.
pub const DEFAULT_HONEST_MINERS: usize = 4;

/// Default number of byzantine miners.
pub const DEFAULT_BYZANTINE_MINERS: usize = 1;

/// Default pause between byzantine submissions, in milliseconds.
pub const DEFAULT_BYZANTINE_INTERVAL_MS: u64 = 1_000;

/// Nonces tried between two checks of the shutdown flag during a search.
pub const SEARCH_POLL_INTERVAL: u64 = 4_096;
