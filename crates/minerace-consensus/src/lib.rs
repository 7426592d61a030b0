//! # minerace-consensus: Mining slot, producers and the validator.
//!
//! Wires the core admission rules into the concurrent handoff:
//! - [`slot::MiningSlot`] - single-capacity rendezvous between producers and
//!   the validator
//! - [`producer::Producer`] - honest or byzantine block producer
//! - [`validator::Validator`] - drains the slot and extends the chain
//! - [`events`] / [`stats`] - structured records of every decision
//!
//! # Lock order
//!
//! Two locks exist: the slot mutex and the chain `RwLock`. Whenever both are
//! held, the slot is taken first. The validator keeps the slot locked from
//! pickup until the chain is updated, and the honest miner's pre-publish
//! height check runs under the slot lock, so that check is serialized with
//! acceptance.

pub mod events;
pub mod producer;
pub mod shared;
pub mod slot;
pub mod stats;
pub mod validator;

pub use events::{Event, EventSink, FanOut, MemorySink, TracingSink};
pub use producer::{Behavior, Producer, Submission};
pub use shared::SharedState;
pub use slot::{MiningSlot, SlotClosed};
pub use stats::{MiningStats, StatsSnapshot};
pub use validator::{Validator, Verdict};
