//! Running counters for a simulation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::Serialize;

use minerace_core::error::AdmissionCheck;

use crate::events::{Event, EventSink};

/// Statistics tracker fed by the event stream.
#[derive(Debug)]
pub struct MiningStats {
    accepted: AtomicU64,
    rejected_pow: AtomicU64,
    rejected_height: AtomicU64,
    rejected_linkage: AtomicU64,
    published: AtomicU64,
    stale: AtomicU64,
    superseded: AtomicU64,
    hashes: AtomicU64,
    start_time: Instant,
}

/// Point-in-time copy of [`MiningStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatsSnapshot {
    pub accepted: u64,
    pub rejected_pow: u64,
    pub rejected_height: u64,
    pub rejected_linkage: u64,
    pub published: u64,
    pub stale: u64,
    pub superseded: u64,
    pub hashes: u64,
}

impl StatsSnapshot {
    /// Rejections across all checks.
    pub fn rejected(&self) -> u64 {
        self.rejected_pow + self.rejected_height + self.rejected_linkage
    }
}

impl Default for MiningStats {
    fn default() -> Self {
        Self::new()
    }
}

impl MiningStats {
    pub fn new() -> Self {
        Self {
            accepted: AtomicU64::new(0),
            rejected_pow: AtomicU64::new(0),
            rejected_height: AtomicU64::new(0),
            rejected_linkage: AtomicU64::new(0),
            published: AtomicU64::new(0),
            stale: AtomicU64::new(0),
            superseded: AtomicU64::new(0),
            hashes: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected_pow: self.rejected_pow.load(Ordering::Relaxed),
            rejected_height: self.rejected_height.load(Ordering::Relaxed),
            rejected_linkage: self.rejected_linkage.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            superseded: self.superseded.load(Ordering::Relaxed),
            hashes: self.hashes.load(Ordering::Relaxed),
        }
    }

    /// Checksums computed per second since creation, across all miners.
    pub fn hashrate(&self) -> f64 {
        let hashes = self.hashes.load(Ordering::Relaxed) as f64;
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            hashes / elapsed
        } else {
            0.0
        }
    }
}

impl EventSink for MiningStats {
    fn record(&self, event: &Event) {
        let counter = match event {
            Event::Hashed { count, .. } => {
                self.hashes.fetch_add(*count, Ordering::Relaxed);
                return;
            }
            // Its attempts already arrived as `Hashed` batches.
            Event::Mined { .. } => return,
            Event::Published { .. } => &self.published,
            Event::Superseded { .. } => &self.superseded,
            Event::Stale { .. } => &self.stale,
            Event::Accepted { .. } => &self.accepted,
            Event::Rejected { check, .. } => match check {
                AdmissionCheck::ProofOfWork => &self.rejected_pow,
                AdmissionCheck::Height => &self.rejected_height,
                AdmissionCheck::Linkage => &self.rejected_linkage,
            },
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minerace_core::error::AdmissionError;
    use minerace_core::{Checksum, ProducerId};

    fn rejected(check: AdmissionCheck, reason: AdmissionError) -> Event {
        Event::Rejected {
            producer: ProducerId(1),
            height: 1,
            checksum: Checksum(7),
            check,
            reason,
        }
    }

    #[test]
    fn new_stats_are_zero() {
        let stats = MiningStats::new();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
        assert!(stats.hashrate() >= 0.0);
    }

    #[test]
    fn counts_by_event_kind() {
        let stats = MiningStats::new();
        for count in [4_096, 6] {
            stats.record(&Event::Hashed {
                producer: ProducerId(2),
                height: 1,
                checksum: Checksum(3),
                count,
            });
        }
        stats.record(&Event::Mined {
            producer: ProducerId(2),
            height: 1,
            checksum: Checksum(0),
            nonce: 4_101,
            attempts: 4_102,
        });
        stats.record(&Event::Published {
            producer: ProducerId(2),
            height: 1,
            checksum: Checksum(0),
            byzantine: false,
        });
        stats.record(&rejected(
            AdmissionCheck::ProofOfWork,
            AdmissionError::DifficultyMismatch { got: 0, expected: 1 },
        ));
        stats.record(&rejected(
            AdmissionCheck::Height,
            AdmissionError::StaleHeight { got: 1, expected: 2 },
        ));
        stats.record(&rejected(
            AdmissionCheck::Linkage,
            AdmissionError::BrokenLinkage { got: Checksum(1), expected: Checksum(2) },
        ));

        let snap = stats.snapshot();
        assert_eq!(snap.hashes, 4_102);
        assert_eq!(snap.published, 1);
        assert_eq!(snap.rejected_pow, 1);
        assert_eq!(snap.rejected_height, 1);
        assert_eq!(snap.rejected_linkage, 1);
        assert_eq!(snap.rejected(), 3);
        assert_eq!(snap.accepted, 0);
    }
}
