//! State shared by every worker in a run.

use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use minerace_core::{Chain, ChainTip, ChecksumProvider, Clock, Difficulty};

use crate::events::{Event, EventSink};
use crate::slot::MiningSlot;

/// The chain, the mining slot, and the collaborators every worker needs.
///
/// The chain and the slot have separate locks. See the crate docs for the
/// acquisition order.
pub struct SharedState {
    chain: RwLock<Chain>,
    slot: MiningSlot,
    difficulty: Difficulty,
    digest: Arc<dyn ChecksumProvider>,
    clock: Clock,
    events: Arc<dyn EventSink>,
}

impl fmt::Debug for SharedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedState")
            .field("difficulty", &self.difficulty)
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}

impl SharedState {
    /// Build the genesis block at the clock's current time and start an
    /// empty, open slot.
    pub fn new(
        difficulty: Difficulty,
        digest: Arc<dyn ChecksumProvider>,
        clock: Clock,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let chain = Chain::new(difficulty, clock(), digest.as_ref());
        Self {
            chain: RwLock::new(chain),
            slot: MiningSlot::new(),
            difficulty,
            digest,
            clock,
            events,
        }
    }

    /// Read access to the chain.
    pub fn chain(&self) -> RwLockReadGuard<'_, Chain> {
        self.chain.read()
    }

    /// Write access to the chain. Only the validator calls this, and only
    /// while holding the slot lock.
    pub(crate) fn chain_mut(&self) -> RwLockWriteGuard<'_, Chain> {
        self.chain.write()
    }

    /// Snapshot of the current head.
    pub fn tip(&self) -> ChainTip {
        self.chain.read().tip()
    }

    pub fn slot(&self) -> &MiningSlot {
        &self.slot
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn digest(&self) -> &dyn ChecksumProvider {
        self.digest.as_ref()
    }

    /// Current time from the injected clock.
    pub fn now(&self) -> u64 {
        (self.clock)()
    }

    pub(crate) fn emit(&self, event: Event) {
        self.events.record(&event);
    }

    /// Close the slot. Every worker returns at its next suspension point.
    pub fn shutdown(&self) {
        self.slot.close();
    }

    pub fn is_shut_down(&self) -> bool {
        self.slot.is_closed()
    }
}
