//! Block checksum digests.
//!
//! The protocol only needs a deterministic W-bit value that reacts to every
//! checksummed field; it makes no cryptographic claim. [`Crc32Checksum`] is
//! the default. [`Sha256Checksum`] truncates SHA-256 to the same width and
//! spreads small nonce changes better at high difficulty.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::types::{BlockHeader, Checksum};

/// Computes a block checksum from its header fields.
///
/// Implementations must be deterministic: the validator recomputes every
/// candidate's checksum and rejects any mismatch.
pub trait ChecksumProvider: Send + Sync {
    /// Checksum over height, timestamp, prev_checksum, nonce and producer.
    fn checksum(&self, header: &BlockHeader) -> Checksum;
}

/// CRC-32 (IEEE) over [`BlockHeader::digest_input`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Crc32Checksum;

impl ChecksumProvider for Crc32Checksum {
    fn checksum(&self, header: &BlockHeader) -> Checksum {
        Checksum(crc32fast::hash(&header.digest_input()))
    }
}

/// First four bytes (big-endian) of SHA-256 over [`BlockHeader::digest_input`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Checksum;

impl ChecksumProvider for Sha256Checksum {
    fn checksum(&self, header: &BlockHeader) -> Checksum {
        let hash = Sha256::digest(header.digest_input());
        Checksum(u32::from_be_bytes([hash[0], hash[1], hash[2], hash[3]]))
    }
}

/// Digest selector used by configuration and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigestKind {
    #[default]
    Crc32,
    Sha256,
}

impl DigestKind {
    /// Instantiate the selected provider.
    pub fn provider(&self) -> Arc<dyn ChecksumProvider> {
        match self {
            Self::Crc32 => Arc::new(Crc32Checksum),
            Self::Sha256 => Arc::new(Sha256Checksum),
        }
    }
}

impl fmt::Display for DigestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Crc32 => f.write_str("crc32"),
            Self::Sha256 => f.write_str("sha256"),
        }
    }
}

impl FromStr for DigestKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "crc32" => Ok(Self::Crc32),
            "sha256" => Ok(Self::Sha256),
            other => Err(format!("unknown digest: {other} (expected crc32 or sha256)")),
        }
    }
}
