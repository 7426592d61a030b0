//! Structured records of mining and validation decisions.
//!
//! Every producer and validator decision is reported as an [`Event`] through
//! an [`EventSink`]. [`TracingSink`] turns events into `tracing` records,
//! [`MemorySink`] keeps them for inspection in tests, and
//! [`MiningStats`](crate::stats::MiningStats) counts them.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Serialize, Serializer};
use tracing::{debug, info, trace, warn};

use minerace_core::error::{AdmissionCheck, AdmissionError};
use minerace_core::{Checksum, ProducerId};

/// One observable decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    /// A batch of nonces was tried. `checksum` is the last one computed.
    Hashed {
        producer: ProducerId,
        height: u64,
        checksum: Checksum,
        count: u64,
    },
    /// An honest producer found a nonce meeting the difficulty.
    Mined {
        producer: ProducerId,
        height: u64,
        checksum: Checksum,
        nonce: u64,
        attempts: u64,
    },
    /// A candidate was deposited into the slot.
    Published {
        producer: ProducerId,
        height: u64,
        checksum: Checksum,
        byzantine: bool,
    },
    /// A pending candidate was overwritten before the validator saw it.
    Superseded {
        producer: ProducerId,
        height: u64,
        checksum: Checksum,
        by: ProducerId,
    },
    /// A producer dropped its own candidate because the chain moved on.
    Stale {
        producer: ProducerId,
        height: u64,
        checksum: Checksum,
        head_height: u64,
    },
    /// The validator linked a candidate into the chain.
    Accepted {
        producer: ProducerId,
        height: u64,
        checksum: Checksum,
        prev_checksum: Checksum,
        timestamp: u64,
        difficulty: u32,
        nonce: u64,
    },
    /// The validator discarded a candidate.
    Rejected {
        producer: ProducerId,
        height: u64,
        checksum: Checksum,
        check: AdmissionCheck,
        #[serde(serialize_with = "serialize_display")]
        reason: AdmissionError,
    },
}

fn serialize_display<T: fmt::Display, S: Serializer>(value: &T, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(value)
}

impl Event {
    /// Short name of the event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Hashed { .. } => "hashed",
            Self::Mined { .. } => "mined",
            Self::Published { .. } => "published",
            Self::Superseded { .. } => "superseded",
            Self::Stale { .. } => "stale",
            Self::Accepted { .. } => "accepted",
            Self::Rejected { .. } => "rejected",
        }
    }

    /// Producer the event is about.
    pub fn producer(&self) -> ProducerId {
        match self {
            Self::Hashed { producer, .. }
            | Self::Mined { producer, .. }
            | Self::Published { producer, .. }
            | Self::Superseded { producer, .. }
            | Self::Stale { producer, .. }
            | Self::Accepted { producer, .. }
            | Self::Rejected { producer, .. } => *producer,
        }
    }

    /// Height of the block the event is about.
    pub fn height(&self) -> u64 {
        match self {
            Self::Hashed { height, .. }
            | Self::Mined { height, .. }
            | Self::Published { height, .. }
            | Self::Superseded { height, .. }
            | Self::Stale { height, .. }
            | Self::Accepted { height, .. }
            | Self::Rejected { height, .. } => *height,
        }
    }

    /// Checksum of the block the event is about.
    pub fn checksum(&self) -> Checksum {
        match self {
            Self::Hashed { checksum, .. }
            | Self::Mined { checksum, .. }
            | Self::Published { checksum, .. }
            | Self::Superseded { checksum, .. }
            | Self::Stale { checksum, .. }
            | Self::Accepted { checksum, .. }
            | Self::Rejected { checksum, .. } => *checksum,
        }
    }
}

/// Receives events. Called from worker threads, and by the validator under
/// the slot lock, so implementations must not block for long.
pub trait EventSink: Send + Sync {
    fn record(&self, event: &Event);
}

/// Emits every event as a `tracing` record with structured fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: &Event) {
        match event {
            Event::Hashed { producer, height, count, .. } => trace!(
                kind = "hashed",
                producer = %producer,
                height,
                count,
                "miner #{producer}: tried {count} nonces for block #{height}"
            ),
            Event::Mined { producer, height, checksum, nonce, attempts } => info!(
                kind = "mined",
                producer = %producer,
                height,
                checksum = %checksum,
                nonce,
                attempts,
                "miner #{producer}: mined block #{height} with checksum {checksum}"
            ),
            Event::Published { producer, height, checksum, byzantine } => debug!(
                kind = "published",
                producer = %producer,
                height,
                checksum = %checksum,
                byzantine,
                "producer #{producer}: published block #{height}"
            ),
            Event::Superseded { producer, height, checksum, by } => warn!(
                kind = "superseded",
                producer = %producer,
                height,
                checksum = %checksum,
                by = %by,
                "candidate #{height} from #{producer} overwritten by #{by}"
            ),
            Event::Stale { producer, height, checksum, head_height } => debug!(
                kind = "stale",
                producer = %producer,
                height,
                checksum = %checksum,
                head_height,
                "miner #{producer}: dropped stale block #{height}, head is #{head_height}"
            ),
            Event::Accepted {
                producer,
                height,
                checksum,
                prev_checksum,
                timestamp,
                difficulty,
                nonce,
            } => info!(
                kind = "accepted",
                producer = %producer,
                height,
                checksum = %checksum,
                prev_checksum = %prev_checksum,
                timestamp,
                difficulty,
                nonce,
                "validator: new block added by #{producer} at height {height}"
            ),
            Event::Rejected { producer, height, checksum, check, reason } => warn!(
                kind = "rejected",
                producer = %producer,
                height,
                checksum = %checksum,
                check = %check,
                "validator: rejected block #{height} by #{producer} on {check} check: {reason}"
            ),
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all events recorded so far, in order.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Recorded `Accepted` events, in acceptance order.
    pub fn accepted(&self) -> Vec<Event> {
        self.filtered(|e| matches!(e, Event::Accepted { .. }))
    }

    /// Recorded `Rejected` events.
    pub fn rejected(&self) -> Vec<Event> {
        self.filtered(|e| matches!(e, Event::Rejected { .. }))
    }

    fn filtered(&self, keep: impl Fn(&Event) -> bool) -> Vec<Event> {
        self.events.lock().iter().filter(|e| keep(e)).cloned().collect()
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: &Event) {
        self.events.lock().push(event.clone());
    }
}

/// Forwards each event to several sinks in order.
#[derive(Default, Clone)]
pub struct FanOut {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanOut {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sink.
    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl fmt::Debug for FanOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FanOut")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl EventSink for FanOut {
    fn record(&self, event: &Event) {
        for sink in &self.sinks {
            sink.record(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected() -> Event {
        Event::Rejected {
            producer: ProducerId(1),
            height: 4,
            checksum: Checksum(0xffff_0000),
            check: AdmissionCheck::Height,
            reason: AdmissionError::StaleHeight { got: 4, expected: 5 },
        }
    }

    #[test]
    fn accessors() {
        let e = rejected();
        assert_eq!(e.kind(), "rejected");
        assert_eq!(e.producer(), ProducerId(1));
        assert_eq!(e.height(), 4);
        assert_eq!(e.checksum(), Checksum(0xffff_0000));
    }

    #[test]
    fn rejected_serializes_with_kind_and_reason() {
        let json = serde_json::to_value(rejected()).unwrap();
        assert_eq!(json["kind"], "rejected");
        assert_eq!(json["check"], "height");
        assert_eq!(json["producer"], 1);
        assert_eq!(json["reason"], "stale height: got 4, expected 5");
    }

    #[test]
    fn memory_sink_filters() {
        let sink = MemorySink::new();
        sink.record(&rejected());
        sink.record(&Event::Accepted {
            producer: ProducerId(2),
            height: 5,
            checksum: Checksum(1),
            prev_checksum: Checksum(2),
            timestamp: 0,
            difficulty: 0,
            nonce: 0,
        });
        assert_eq!(sink.events().len(), 2);
        assert_eq!(sink.accepted().len(), 1);
        assert_eq!(sink.rejected().len(), 1);
    }

    #[test]
    fn fan_out_reaches_every_sink() {
        let a = Arc::new(MemorySink::new());
        let b = Arc::new(MemorySink::new());
        let fan = FanOut::new()
            .with(a.clone())
            .with(b.clone())
            .with(Arc::new(TracingSink));
        fan.record(&rejected());
        assert_eq!(a.events(), vec![rejected()]);
        assert_eq!(b.events(), vec![rejected()]);
        assert!(format!("{fan:?}").contains("3"));
    }
}
