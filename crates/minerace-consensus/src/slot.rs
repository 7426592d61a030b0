//! The mining slot: a one-element handoff buffer.
//!
//! Producers deposit candidates, the validator drains them. One mutex guards
//! the pending candidate and the shutdown flag, one condition variable
//! signals every transition. Producers and the validator wait on the same
//! condvar, so every transition uses `notify_all`; a `notify_one` could wake
//! a producer when the validator was the one that needed to run.
//!
//! The slot is "occupied" exactly when it holds a candidate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use thiserror::Error;

use minerace_core::Block;

/// The slot was closed; the worker should stop.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("mining slot closed")]
pub struct SlotClosed;

#[derive(Default)]
struct SlotState {
    candidate: Option<Block>,
    closed: bool,
}

/// Single-capacity rendezvous between producers and the validator.
#[derive(Default)]
pub struct MiningSlot {
    state: Mutex<SlotState>,
    cond: Condvar,
    // Mirror of `state.closed` for lock-free polling from the nonce search.
    closed: AtomicBool,
}

impl std::fmt::Debug for MiningSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiningSlot")
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl MiningSlot {
    /// An empty, open slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the slot lock.
    pub fn lock(&self) -> SlotGuard<'_> {
        SlotGuard {
            slot: self,
            state: self.state.lock(),
        }
    }

    /// Block until the slot is free, then release the lock.
    pub fn wait_until_free(&self) -> Result<(), SlotClosed> {
        self.lock().wait_until_free()
    }

    /// Close the slot and wake every waiter. Any pending candidate is dropped.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.candidate = None;
        self.closed.store(true, Ordering::Release);
        self.cond.notify_all();
    }

    /// Whether [`close`](Self::close) has been called. Never blocks.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Whether a candidate is pending.
    pub fn is_occupied(&self) -> bool {
        self.state.lock().candidate.is_some()
    }

    /// Sleep for `interval`, returning early with `Err` if the slot closes.
    pub fn sleep(&self, interval: Duration) -> Result<(), SlotClosed> {
        let deadline = Instant::now() + interval;
        let mut state = self.state.lock();
        while !state.closed {
            if self.cond.wait_until(&mut state, deadline).timed_out() {
                return if state.closed { Err(SlotClosed) } else { Ok(()) };
            }
        }
        Err(SlotClosed)
    }
}

/// Held slot lock.
///
/// Every waiting method releases the lock while blocked and re-acquires it
/// before returning, so the caller observes a consistent slot afterwards.
pub struct SlotGuard<'a> {
    slot: &'a MiningSlot,
    state: MutexGuard<'a, SlotState>,
}

impl SlotGuard<'_> {
    /// Whether a candidate is pending.
    pub fn is_occupied(&self) -> bool {
        self.state.candidate.is_some()
    }

    /// Whether the slot has been closed.
    pub fn is_closed(&self) -> bool {
        self.state.closed
    }

    /// Producer-side wait: block until no candidate is pending.
    pub fn wait_until_free(&mut self) -> Result<(), SlotClosed> {
        loop {
            if self.state.closed {
                return Err(SlotClosed);
            }
            if self.state.candidate.is_none() {
                return Ok(());
            }
            self.slot.cond.wait(&mut self.state);
        }
    }

    /// Producer-side publish: install `candidate` and wake the validator.
    ///
    /// Returns whatever candidate was displaced. Only a producer that skipped
    /// [`wait_until_free`](Self::wait_until_free) can displace one.
    pub fn publish(&mut self, candidate: Block) -> Result<Option<Block>, SlotClosed> {
        if self.state.closed {
            return Err(SlotClosed);
        }
        let displaced = self.state.candidate.replace(candidate);
        self.slot.cond.notify_all();
        Ok(displaced)
    }

    /// Consumer-side wait and drain: block until a candidate is pending, take
    /// it, and wake waiting producers.
    pub fn drain(&mut self) -> Result<Block, SlotClosed> {
        loop {
            if self.state.closed {
                return Err(SlotClosed);
            }
            if let Some(candidate) = self.state.candidate.take() {
                self.slot.cond.notify_all();
                return Ok(candidate);
            }
            self.slot.cond.wait(&mut self.state);
        }
    }
}
