//! Genesis block construction.
//!
//! The genesis block is built once at startup: height 0, nonce 0, no
//! producer, an all-zero `prev_checksum` and a checksum over its own fields.
//! It is not mined, so it is exempt from the difficulty target.

use crate::difficulty::Difficulty;
use crate::digest::ChecksumProvider;
use crate::types::{Block, BlockHeader, Checksum, ProducerId};

/// Build the genesis block for a run.
pub fn genesis_block(
    difficulty: Difficulty,
    timestamp: u64,
    digest: &dyn ChecksumProvider,
) -> Block {
    let header = BlockHeader {
        height: 0,
        timestamp,
        prev_checksum: Checksum::ZERO,
        difficulty: difficulty.bits(),
        nonce: 0,
        producer: ProducerId::GENESIS,
    };
    Block::new(header, digest)
}

/// Whether a header has the shape of a genesis header.
pub fn is_genesis(header: &BlockHeader) -> bool {
    header.height == 0
        && header.producer.is_genesis()
        && header.prev_checksum == Checksum::ZERO
        && header.nonce == 0
}
