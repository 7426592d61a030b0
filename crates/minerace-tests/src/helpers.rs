//! Shared test helpers for integration tests.

use std::sync::Arc;
use std::time::Duration;

use minerace_consensus::{MemorySink, SharedState};
use minerace_core::genesis::is_genesis;
use minerace_core::{Block, BlockHeader, Chain, Checksum, ChecksumProvider, Difficulty, ProducerId};
use minerace_sim::SimConfig;

/// Fixed timestamp used by [`shared_state`].
pub const TEST_TIME: u64 = 1_700_000_000;

/// Checksum with exactly `nonce` leading zero bits.
///
/// A search at difficulty `d` ends at nonce `d`, and an unmined candidate
/// (nonce 0) fails every difficulty above zero.
pub struct ShiftedNonce;

impl ChecksumProvider for ShiftedNonce {
    fn checksum(&self, header: &BlockHeader) -> Checksum {
        Checksum(u32::MAX.checked_shr(header.nonce as u32).unwrap_or(0))
    }
}

/// Shared state on a fixed clock, recording into a fresh [`MemorySink`].
pub fn shared_state(
    difficulty: u32,
    digest: Arc<dyn ChecksumProvider>,
) -> (Arc<SharedState>, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let shared = Arc::new(SharedState::new(
        Difficulty::new(difficulty).expect("test difficulty in range"),
        digest,
        Arc::new(|| TEST_TIME),
        sink.clone(),
    ));
    (shared, sink)
}

/// A sealed candidate on the current head with the given nonce.
pub fn candidate(shared: &SharedState, producer: u32, nonce: u64) -> Block {
    let tip = shared.tip();
    Block::new(
        BlockHeader {
            height: tip.next_height(),
            timestamp: TEST_TIME + tip.next_height(),
            prev_checksum: tip.checksum,
            difficulty: shared.difficulty().bits(),
            nonce,
            producer: ProducerId(producer),
        },
        shared.digest(),
    )
}

/// Put a block straight into the slot, bypassing every producer rule.
pub fn inject(shared: &SharedState, block: Block) -> Option<Block> {
    shared
        .slot()
        .lock()
        .publish(block)
        .expect("slot open")
}

/// Threaded run at difficulty 0 with fast byzantine cadence.
pub fn fast_config(honest: usize, byzantine: usize, blocks: u64) -> SimConfig {
    SimConfig {
        difficulty: 0,
        honest_miners: honest,
        byzantine_miners: byzantine,
        byzantine_interval: Duration::from_millis(1),
        target_blocks: Some(blocks),
        ..SimConfig::default()
    }
}

/// Heights from head to genesis.
pub fn heights(chain: &Chain) -> Vec<u64> {
    chain.iter().map(|b| b.height()).collect()
}

/// Assert the structural chain invariants: contiguous heights down to 0,
/// every `prev_checksum` naming the next block back, length = head + 1.
pub fn assert_chain_consistent(chain: &Chain) {
    let blocks: Vec<&Block> = chain.iter().collect();
    assert_eq!(blocks.len() as u64, chain.length());
    assert_eq!(chain.head().height() + 1, chain.length());
    for pair in blocks.windows(2) {
        assert_eq!(pair[0].height(), pair[1].height() + 1);
        assert_eq!(pair[0].header.prev_checksum, pair[1].checksum);
    }
    let genesis = blocks.last().expect("chain is never empty");
    assert!(is_genesis(&genesis.header));
    assert!(genesis.prev().is_none());
}
