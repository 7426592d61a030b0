//! Spawns the producers and the validator, and collects them on shutdown.
//!
//! Every worker is a named OS thread. Byzantine producers take the lowest
//! ids, starting at [`FIRST_PRODUCER_ID`], followed by the honest ones.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{info, warn};

use minerace_consensus::{
    EventSink, FanOut, MiningStats, Producer, SharedState, StatsSnapshot, TracingSink, Validator,
};
use minerace_core::constants::FIRST_PRODUCER_ID;
use minerace_core::{system_clock, ChainTip, Clock, ProducerId};

use crate::config::SimConfig;
use crate::error::SimError;

/// Final state of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimReport {
    /// Blocks accepted by the validator.
    pub accepted: u64,
    /// Head of the chain at shutdown.
    pub tip: ChainTip,
    /// Counters at shutdown.
    pub stats: StatsSnapshot,
}

/// A running simulation.
pub struct Simulation {
    shared: Arc<SharedState>,
    stats: Arc<MiningStats>,
    validator: JoinHandle<u64>,
    producers: Vec<(String, JoinHandle<()>)>,
}

impl Simulation {
    /// Start a run with the system clock and the default sinks.
    pub fn start(config: &SimConfig) -> Result<Self, SimError> {
        Self::start_with(config, system_clock(), None)
    }

    /// Start a run that also reports every event to `observer`.
    pub fn start_observed(
        config: &SimConfig,
        observer: Arc<dyn EventSink>,
    ) -> Result<Self, SimError> {
        Self::start_with(config, system_clock(), Some(observer))
    }

    /// Start a run with an explicit clock and optional extra sink.
    pub fn start_with(
        config: &SimConfig,
        clock: Clock,
        observer: Option<Arc<dyn EventSink>>,
    ) -> Result<Self, SimError> {
        let difficulty = config.validate()?;

        let stats = Arc::new(MiningStats::new());
        let mut sinks = FanOut::new()
            .with(Arc::new(TracingSink))
            .with(stats.clone());
        if let Some(observer) = observer {
            sinks = sinks.with(observer);
        }

        let shared = Arc::new(SharedState::new(
            difficulty,
            config.digest.provider(),
            clock,
            Arc::new(sinks),
        ));
        {
            let chain = shared.chain();
            let genesis = chain.head();
            info!(
                difficulty = difficulty.bits(),
                expected_attempts = difficulty.expected_attempts(),
                digest = %config.digest,
                checksum = %genesis.checksum,
                timestamp = genesis.header.timestamp,
                "genesis block created"
            );
        }

        let mut validator = Validator::new(shared.clone());
        if let Some(target) = config.target_blocks {
            validator = validator.with_stop_after(target);
        }
        let validator = match spawn("validator".to_string(), move || validator.run()) {
            Ok(handle) => handle,
            Err(e) => {
                shared.shutdown();
                return Err(e);
            }
        };

        let mut sim = Self {
            shared,
            stats,
            validator,
            producers: Vec::with_capacity(config.producers()),
        };

        let byzantine = (0..config.byzantine_miners).map(|_| true);
        let honest = (0..config.honest_miners).map(|_| false);
        for (id, is_byzantine) in (FIRST_PRODUCER_ID..).zip(byzantine.chain(honest)) {
            let id = ProducerId(id);
            let producer = if is_byzantine {
                Producer::byzantine(id, config.byzantine_interval, sim.shared.clone())
            } else {
                Producer::honest(id, sim.shared.clone())
            };
            let name = format!("miner-{id}");
            match spawn(name.clone(), move || producer.run()) {
                Ok(handle) => sim.producers.push((name, handle)),
                Err(e) => {
                    sim.shutdown();
                    // Spawn already failed; panics in the started workers are secondary.
                    sim.join().ok();
                    return Err(e);
                }
            }
        }

        info!(
            honest = config.honest_miners,
            byzantine = config.byzantine_miners,
            target_blocks = ?config.target_blocks,
            "simulation started"
        );

        if config.target_blocks == Some(0) {
            sim.shutdown();
        }
        Ok(sim)
    }

    pub fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }

    pub fn stats(&self) -> &Arc<MiningStats> {
        &self.stats
    }

    /// Ask every worker to stop. Returns immediately.
    pub fn shutdown(&self) {
        self.shared.shutdown();
    }

    /// Whether the run has been shut down, by request or by reaching its
    /// block target.
    pub fn is_finished(&self) -> bool {
        self.shared.is_shut_down()
    }

    /// Block until every worker has returned.
    ///
    /// Does not request shutdown itself. A panicking worker shuts the rest
    /// down and is reported after all workers are joined.
    pub fn join(self) -> Result<SimReport, SimError> {
        let mut panicked = None;

        let accepted = match self.validator.join() {
            Ok(accepted) => accepted,
            Err(_) => {
                warn!("validator panicked");
                self.shared.shutdown();
                panicked = Some("validator".to_string());
                0
            }
        };
        for (name, handle) in self.producers {
            if handle.join().is_err() {
                warn!(worker = %name, "producer panicked");
                self.shared.shutdown();
                panicked.get_or_insert(name);
            }
        }

        if let Some(worker) = panicked {
            return Err(SimError::WorkerPanicked(worker));
        }

        let report = SimReport {
            accepted,
            tip: self.shared.tip(),
            stats: self.stats.snapshot(),
        };
        info!(
            accepted = report.accepted,
            height = report.tip.height,
            head = %report.tip.checksum,
            "simulation finished"
        );
        Ok(report)
    }
}

fn spawn<T, F>(name: String, f: F) -> Result<JoinHandle<T>, SimError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    thread::Builder::new()
        .name(name.clone())
        .spawn(f)
        .map_err(|source| SimError::Spawn { worker: name, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use minerace_consensus::MemorySink;
    use minerace_core::digest::DigestKind;
    use std::time::Duration;

    fn quick(honest: usize, byzantine: usize, blocks: u64) -> SimConfig {
        SimConfig {
            difficulty: 0,
            honest_miners: honest,
            byzantine_miners: byzantine,
            byzantine_interval: Duration::from_millis(1),
            target_blocks: Some(blocks),
            digest: DigestKind::Crc32,
        }
    }

    #[test]
    fn runs_to_target() {
        let sim = Simulation::start(&quick(2, 0, 10)).unwrap();
        let shared = sim.shared().clone();
        let report = sim.join().unwrap();
        assert_eq!(report.accepted, 10);
        assert_eq!(report.tip.height, 10);
        assert_eq!(report.stats.accepted, 10);
        assert!(shared.chain().audit(shared.digest()).is_ok());
    }

    #[test]
    fn byzantine_ids_come_first() {
        let sink = Arc::new(MemorySink::new());
        let config = SimConfig {
            difficulty: 8,
            ..quick(1, 1, 3)
        };
        let sim = Simulation::start_observed(&config, sink.clone()).unwrap();
        sim.join().unwrap();
        let events = sink.events();
        assert!(events
            .iter()
            .filter(|e| e.kind() == "mined")
            .all(|e| e.producer() == ProducerId(2)));
        assert!(events
            .iter()
            .filter(|e| e.kind() == "published" && e.producer() == ProducerId(1))
            .count()
            > 0);
    }

    #[test]
    fn zero_target_stops_immediately() {
        let sim = Simulation::start(&quick(1, 0, 0)).unwrap();
        assert!(sim.is_finished());
        let report = sim.join().unwrap();
        assert_eq!(report.accepted, 0);
    }

    #[test]
    fn external_shutdown_ends_open_run() {
        let config = SimConfig {
            target_blocks: None,
            ..quick(2, 1, 0)
        };
        let sim = Simulation::start(&config).unwrap();
        std::thread::sleep(Duration::from_millis(20));
        sim.shutdown();
        let report = sim.join().unwrap();
        assert_eq!(report.tip.length, report.accepted + 1);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = SimConfig {
            difficulty: 99,
            ..SimConfig::default()
        };
        assert!(matches!(
            Simulation::start(&config),
            Err(SimError::Config(_))
        ));
    }
}
