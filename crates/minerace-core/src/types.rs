//! Core types: checksums, producer ids, block headers and blocks.
//!
//! A [`Block`] is a [`BlockHeader`] plus its checksum and an ownership edge to
//! the previous block. The edge is only ever set by [`Chain`](crate::Chain)
//! when the block is linked, so a candidate travelling between threads always
//! has `prev == None`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::digest::ChecksumProvider;

/// A W-bit block checksum, compared as an unsigned integer.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
pub struct Checksum(pub u32);

impl Checksum {
    /// The all-zero checksum. Used as the genesis `prev_checksum`.
    pub const ZERO: Self = Self(0);

    /// Number of leading zero bits.
    pub fn leading_zeros(&self) -> u32 {
        self.0.leading_zeros()
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl From<u32> for Checksum {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Identifier of the producer that built a block.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub struct ProducerId(pub u32);

impl ProducerId {
    /// Sentinel carried by the genesis block, which has no producer.
    pub const GENESIS: Self = Self(u32::MAX);

    /// Whether this is the genesis sentinel.
    pub fn is_genesis(&self) -> bool {
        *self == Self::GENESIS
    }
}

impl fmt::Display for ProducerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_genesis() {
            f.write_str("genesis")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// The fields covered by a block's checksum, plus the difficulty it claims.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockHeader {
    /// Position in the chain. Genesis is 0.
    pub height: u64,
    /// Unix seconds at creation or at the last nonce update.
    pub timestamp: u64,
    /// Checksum of the block at `height - 1`.
    pub prev_checksum: Checksum,
    /// Required leading zero bits. Not part of the digest input.
    pub difficulty: u32,
    /// Proof-of-work search variable.
    pub nonce: u64,
    /// Producer that built the block.
    pub producer: ProducerId,
}

impl BlockHeader {
    /// Size of the digest input in bytes.
    pub const DIGEST_INPUT_SIZE: usize = 8 + 8 + 4 + 8 + 4;

    /// Serialize the digest input: height || timestamp || prev_checksum ||
    /// nonce || producer, all little-endian.
    pub fn digest_input(&self) -> [u8; Self::DIGEST_INPUT_SIZE] {
        let mut data = [0u8; Self::DIGEST_INPUT_SIZE];
        data[0..8].copy_from_slice(&self.height.to_le_bytes());
        data[8..16].copy_from_slice(&self.timestamp.to_le_bytes());
        data[16..20].copy_from_slice(&self.prev_checksum.0.to_le_bytes());
        data[20..28].copy_from_slice(&self.nonce.to_le_bytes());
        data[28..32].copy_from_slice(&self.producer.0.to_le_bytes());
        data
    }
}

/// A block: header, checksum and the edge to its predecessor.
///
/// Blocks are moved, never shared: a producer owns its candidate, hands it
/// to the mining slot, the validator takes it out and either links it into
/// the chain or drops it.
pub struct Block {
    /// Checksummed fields.
    pub header: BlockHeader,
    /// Stored checksum. The validator recomputes it rather than trusting it.
    pub checksum: Checksum,
    pub(crate) prev: Option<Box<Block>>,
}

impl Block {
    /// Build an unlinked block and compute its checksum.
    pub fn new(header: BlockHeader, digest: &dyn ChecksumProvider) -> Self {
        let checksum = digest.checksum(&header);
        Self {
            header,
            checksum,
            prev: None,
        }
    }

    /// Recompute and store the checksum after a header change.
    pub fn reseal(&mut self, digest: &dyn ChecksumProvider) {
        self.checksum = digest.checksum(&self.header);
    }

    /// The previous block, if this block has been linked into a chain.
    pub fn prev(&self) -> Option<&Block> {
        self.prev.as_deref()
    }

    /// Height shortcut.
    pub fn height(&self) -> u64 {
        self.header.height
    }

    /// Producer shortcut.
    pub fn producer(&self) -> ProducerId {
        self.header.producer
    }

    /// Whether the block has been linked into a chain.
    pub fn is_linked(&self) -> bool {
        self.prev.is_some()
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("header", &self.header)
            .field("checksum", &self.checksum)
            .field("linked", &self.is_linked())
            .finish()
    }
}
