//! Block producers.
//!
//! One [`Producer`] type covers both the honest miner and the byzantine one;
//! [`Behavior`] selects which contract it follows.
//!
//! An honest round is BUILD → SEARCH → PUBLISH-ATTEMPT:
//!
//! 1. wait for the slot to be free,
//! 2. snapshot the head under the chain lock and build a candidate on it,
//! 3. search nonces with no lock held until the difficulty is met,
//! 4. under the slot lock, re-read the head; publish if the candidate still
//!    extends it, otherwise drop it as stale.
//!
//! A byzantine round builds the same candidate and publishes it immediately,
//! nonce untouched, over whatever the slot holds.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use minerace_core::constants::SEARCH_POLL_INTERVAL;
use minerace_core::{Block, BlockHeader, ProducerId};

use crate::events::Event;
use crate::shared::SharedState;
use crate::slot::SlotClosed;

/// Which mining contract a producer follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Search for a valid nonce and respect the slot.
    Honest,
    /// Skip the search, ignore slot occupancy, submit every `interval`.
    Byzantine { interval: Duration },
}

impl Behavior {
    pub fn is_byzantine(&self) -> bool {
        matches!(self, Self::Byzantine { .. })
    }
}

/// Result of one submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// The candidate is now in the slot.
    Published { height: u64 },
    /// The chain moved past the candidate; it was dropped unpublished.
    Stale { height: u64, head_height: u64 },
}

/// A block producer bound to a shared run.
#[derive(Debug, Clone)]
pub struct Producer {
    id: ProducerId,
    behavior: Behavior,
    shared: Arc<SharedState>,
}

impl Producer {
    pub fn new(id: ProducerId, behavior: Behavior, shared: Arc<SharedState>) -> Self {
        Self {
            id,
            behavior,
            shared,
        }
    }

    pub fn honest(id: ProducerId, shared: Arc<SharedState>) -> Self {
        Self::new(id, Behavior::Honest, shared)
    }

    pub fn byzantine(id: ProducerId, interval: Duration, shared: Arc<SharedState>) -> Self {
        Self::new(id, Behavior::Byzantine { interval }, shared)
    }

    pub fn id(&self) -> ProducerId {
        self.id
    }

    pub fn behavior(&self) -> Behavior {
        self.behavior
    }

    /// Build a candidate on the current head.
    ///
    /// The chain read lock is held only while copying the head's coordinates.
    pub fn build_candidate(&self) -> Block {
        let tip = self.shared.tip();
        let header = BlockHeader {
            height: tip.next_height(),
            timestamp: self.shared.now(),
            prev_checksum: tip.checksum,
            difficulty: self.shared.difficulty().bits(),
            nonce: 0,
            producer: self.id,
        };
        Block::new(header, self.shared.digest())
    }

    /// Increment the nonce until the candidate meets the run difficulty.
    ///
    /// This is the one unbounded operation in the system: it holds no lock,
    /// never blocks, and its expected length doubles with each difficulty
    /// bit. Every [`SEARCH_POLL_INTERVAL`] tries the batch is reported as
    /// [`Event::Hashed`] and the shutdown flag is polled; the remainder is
    /// reported when the search ends.
    /// Returns the number of checksums evaluated, the initial one included.
    pub fn search(&self, candidate: &mut Block) -> Result<u64, SlotClosed> {
        let difficulty = self.shared.difficulty();
        let digest = self.shared.digest();
        let mut attempts = 1u64;
        let mut reported = 0u64;
        while !difficulty.is_met_by(candidate.checksum) {
            if attempts % SEARCH_POLL_INTERVAL == 0 {
                self.report_hashes(candidate, attempts - reported);
                reported = attempts;
                if self.shared.is_shut_down() {
                    return Err(SlotClosed);
                }
            }
            candidate.header.nonce = candidate.header.nonce.wrapping_add(1);
            candidate.header.timestamp = self.shared.now();
            candidate.reseal(digest);
            attempts += 1;
        }
        self.report_hashes(candidate, attempts - reported);
        Ok(attempts)
    }

    fn report_hashes(&self, candidate: &Block, count: u64) {
        if count == 0 {
            return;
        }
        self.shared.emit(Event::Hashed {
            producer: self.id,
            height: candidate.height(),
            checksum: candidate.checksum,
            count,
        });
    }

    /// Try to hand `candidate` to the validator.
    ///
    /// Honest: wait for a free slot, then publish only if the candidate still
    /// extends the head. The head is read while the slot lock is held, and
    /// the validator holds that lock while it updates the chain, so the
    /// check cannot interleave with an acceptance.
    ///
    /// Byzantine: publish at once, displacing any pending candidate.
    ///
    /// Events are emitted after the slot lock is released.
    pub fn submit(&self, candidate: Block) -> Result<Submission, SlotClosed> {
        let height = candidate.height();
        let checksum = candidate.checksum;
        let mut slot = self.shared.slot().lock();

        let displaced = match self.behavior {
            Behavior::Honest => {
                slot.wait_until_free()?;
                let tip = self.shared.tip();
                if height != tip.next_height() {
                    drop(slot);
                    self.shared.emit(Event::Stale {
                        producer: self.id,
                        height,
                        checksum,
                        head_height: tip.height,
                    });
                    return Ok(Submission::Stale {
                        height,
                        head_height: tip.height,
                    });
                }
                slot.publish(candidate)?
            }
            Behavior::Byzantine { .. } => slot.publish(candidate)?,
        };
        drop(slot);

        if let Some(displaced) = displaced {
            self.shared.emit(Event::Superseded {
                producer: displaced.producer(),
                height: displaced.height(),
                checksum: displaced.checksum,
                by: self.id,
            });
        }
        self.shared.emit(Event::Published {
            producer: self.id,
            height,
            checksum,
            byzantine: self.behavior.is_byzantine(),
        });
        Ok(Submission::Published { height })
    }

    /// One full round of this producer's contract.
    pub fn step(&self) -> Result<Submission, SlotClosed> {
        match self.behavior {
            Behavior::Honest => {
                self.shared.slot().wait_until_free()?;
                let mut candidate = self.build_candidate();
                let attempts = self.search(&mut candidate)?;
                self.shared.emit(Event::Mined {
                    producer: self.id,
                    height: candidate.height(),
                    checksum: candidate.checksum,
                    nonce: candidate.header.nonce,
                    attempts,
                });
                self.submit(candidate)
            }
            Behavior::Byzantine { .. } => {
                let candidate = self.build_candidate();
                self.submit(candidate)
            }
        }
    }

    /// Run rounds until the slot closes.
    pub fn run(self) {
        info!(producer = %self.id, byzantine = self.behavior.is_byzantine(), "producer started");
        loop {
            if self.step().is_err() {
                break;
            }
            if let Behavior::Byzantine { interval } = self.behavior {
                if self.shared.slot().sleep(interval).is_err() {
                    break;
                }
            }
        }
        debug!(producer = %self.id, "producer stopped");
    }
}
