//! Proof-of-work difficulty.
//!
//! Difficulty is the number of leading zero bits a block checksum must
//! carry. It is fixed for the whole run and copied into every block header.
//!
//! # Range
//!
//! Any value in `0 ..= CHECKSUM_BITS` is a valid configuration. Zero accepts
//! every checksum; `CHECKSUM_BITS` accepts only the all-zero checksum.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{CHECKSUM_BITS, MAX_DIFFICULTY};
use crate::error::ConfigError;
use crate::types::Checksum;

/// Whether the top `difficulty` bits of `checksum` are all zero.
///
/// Equivalent to `checksum >> (W - difficulty) == 0`, written without the
/// shift so that `difficulty == 0` and `difficulty >= W` cannot overflow.
pub fn meets_difficulty(checksum: Checksum, difficulty: u32) -> bool {
    if difficulty >= CHECKSUM_BITS {
        return checksum == Checksum::ZERO;
    }
    checksum.leading_zeros() >= difficulty
}

/// A validated difficulty in `0 ..= MAX_DIFFICULTY`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(try_from = "u32", into = "u32")]
pub struct Difficulty(u32);

impl Difficulty {
    /// Zero difficulty: every checksum qualifies.
    pub const TRIVIAL: Self = Self(0);

    /// Validate a raw difficulty.
    pub fn new(bits: u32) -> Result<Self, ConfigError> {
        if bits > MAX_DIFFICULTY {
            return Err(ConfigError::DifficultyOutOfRange {
                got: bits,
                max: MAX_DIFFICULTY,
            });
        }
        Ok(Self(bits))
    }

    /// Required leading zero bits.
    pub fn bits(&self) -> u32 {
        self.0
    }

    /// Whether `checksum` satisfies this difficulty.
    pub fn is_met_by(&self, checksum: Checksum) -> bool {
        meets_difficulty(checksum, self.0)
    }

    /// Expected number of checksums to try before one qualifies.
    pub fn expected_attempts(&self) -> u64 {
        1u64 << self.0
    }
}

impl TryFrom<u32> for Difficulty {
    type Error = ConfigError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        Self::new(bits)
    }
}

impl From<Difficulty> for u32 {
    fn from(d: Difficulty) -> Self {
        d.0
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
