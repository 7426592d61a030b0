//! The validator: sole consumer of the mining slot and sole writer of the
//! chain.
//!
//! Each round is WAIT → CHECK → {ACCEPT, REJECT} → WAIT. The slot lock is
//! held for the whole round and the chain write lock is taken inside it, so
//! a producer that re-checks the head under the slot lock sees either the
//! chain before this round or after it, never in between. Rejections are
//! reported and the loop continues; nothing a producer submits can stop it.

use std::sync::Arc;

use tracing::{debug, info};

use minerace_core::error::AdmissionError;
use minerace_core::{Checksum, ProducerId};

use crate::events::Event;
use crate::shared::SharedState;
use crate::slot::SlotClosed;

/// Outcome of one validation round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted {
        producer: ProducerId,
        height: u64,
        checksum: Checksum,
    },
    Rejected {
        producer: ProducerId,
        height: u64,
        checksum: Checksum,
        reason: AdmissionError,
    },
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// Drains the slot and extends the chain.
#[derive(Debug)]
pub struct Validator {
    shared: Arc<SharedState>,
    stop_after: Option<u64>,
    accepted: u64,
}

impl Validator {
    pub fn new(shared: Arc<SharedState>) -> Self {
        Self {
            shared,
            stop_after: None,
            accepted: 0,
        }
    }

    /// Shut the run down once `blocks` candidates have been accepted.
    pub fn with_stop_after(mut self, blocks: u64) -> Self {
        self.stop_after = Some(blocks);
        self
    }

    /// Blocks accepted by this validator so far.
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    /// Run one round: wait for a candidate, check it, link or drop it.
    pub fn process_next(&mut self) -> Result<Verdict, SlotClosed> {
        let mut slot = self.shared.slot().lock();
        let candidate = slot.drain()?;
        let header = candidate.header;
        let checksum = candidate.checksum;

        let admitted = self
            .shared
            .chain_mut()
            .admit(candidate, self.shared.digest());

        let verdict = match admitted {
            Ok(()) => {
                self.shared.emit(Event::Accepted {
                    producer: header.producer,
                    height: header.height,
                    checksum,
                    prev_checksum: header.prev_checksum,
                    timestamp: header.timestamp,
                    difficulty: header.difficulty,
                    nonce: header.nonce,
                });
                Verdict::Accepted {
                    producer: header.producer,
                    height: header.height,
                    checksum,
                }
            }
            Err(reason) => {
                self.shared.emit(Event::Rejected {
                    producer: header.producer,
                    height: header.height,
                    checksum,
                    check: reason.check(),
                    reason: reason.clone(),
                });
                Verdict::Rejected {
                    producer: header.producer,
                    height: header.height,
                    checksum,
                    reason,
                }
            }
        };
        drop(slot);

        if verdict.is_accepted() {
            self.accepted += 1;
            if self.stop_after.is_some_and(|target| self.accepted >= target) {
                info!(accepted = self.accepted, "validator reached block target, shutting down");
                self.shared.shutdown();
            }
        }
        Ok(verdict)
    }

    /// Process rounds until the slot closes.
    pub fn run(mut self) -> u64 {
        info!(length = self.shared.tip().length, "validator started");
        while self.process_next().is_ok() {}
        debug!(accepted = self.accepted, "validator stopped");
        self.accepted
    }
}
