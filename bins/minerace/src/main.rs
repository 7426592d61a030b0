//! minerace: proof-of-work mining race simulator.
//!
//! Starts one validator thread and a set of honest and byzantine miner
//! threads racing over a single mining slot, and logs every decision until
//! the block target is reached or Ctrl+C is pressed.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use minerace_consensus::{MiningStats, SharedState};
use minerace_core::constants::{
    DEFAULT_BYZANTINE_INTERVAL_MS, DEFAULT_BYZANTINE_MINERS, DEFAULT_HONEST_MINERS,
    MAX_DIFFICULTY,
};
use minerace_core::digest::DigestKind;
use minerace_sim::{SimConfig, Simulation};

/// Proof-of-work mining race between honest and byzantine miners.
#[derive(Parser, Debug)]
#[command(name = "minerace", version, about, long_about = None)]
struct Args {
    /// Required leading zero bits in every block checksum (0..=32)
    #[arg(value_parser = clap::value_parser!(u32).range(0..=MAX_DIFFICULTY as i64))]
    difficulty: u32,

    /// Number of honest miners
    #[arg(long, default_value_t = DEFAULT_HONEST_MINERS)]
    miners: usize,

    /// Number of byzantine miners
    #[arg(long, default_value_t = DEFAULT_BYZANTINE_MINERS)]
    byzantine: usize,

    /// Milliseconds between two byzantine submissions
    #[arg(long, default_value_t = DEFAULT_BYZANTINE_INTERVAL_MS)]
    byzantine_interval_ms: u64,

    /// Stop after this many accepted blocks (runs until Ctrl+C if omitted)
    #[arg(long)]
    blocks: Option<u64>,

    /// Checksum function ("crc32" or "sha256")
    #[arg(long, default_value_t = DigestKind::Crc32)]
    digest: DigestKind,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log output format ("text" or "json")
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Seconds between two statistics lines (0 disables them)
    #[arg(long, default_value_t = 30)]
    stats_interval_secs: u64,
}

/// Logging and reporting options that are not part of the simulation.
struct Reporting {
    log_level: String,
    log_format: String,
    stats_interval: Duration,
}

impl Args {
    /// Convert CLI args into a SimConfig.
    fn into_config(self) -> (SimConfig, Reporting) {
        let config = SimConfig {
            difficulty: self.difficulty,
            honest_miners: self.miners,
            byzantine_miners: self.byzantine,
            byzantine_interval: Duration::from_millis(self.byzantine_interval_ms),
            target_blocks: self.blocks,
            digest: self.digest,
        };
        let reporting = Reporting {
            log_level: self.log_level,
            log_format: self.log_format,
            stats_interval: Duration::from_secs(self.stats_interval_secs),
        };
        (config, reporting)
    }
}

/// Log mining statistics periodically until the run ends.
async fn stats_logger(stats: Arc<MiningStats>, shared: Arc<SharedState>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    // The first tick completes immediately.
    ticker.tick().await;
    while !shared.is_shut_down() {
        ticker.tick().await;
        let snap = stats.snapshot();
        info!(
            accepted = snap.accepted,
            rejected_pow = snap.rejected_pow,
            rejected_height = snap.rejected_height,
            rejected_linkage = snap.rejected_linkage,
            stale = snap.stale,
            superseded = snap.superseded,
            "hashrate: {:.2} H/s | height: {}",
            stats.hashrate(),
            shared.tip().height
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let (config, reporting) = args.into_config();

    init_logging(&reporting.log_level, &reporting.log_format);

    info!("minerace v{}", env!("CARGO_PKG_VERSION"));
    info!("difficulty: {}", config.difficulty);
    info!("digest: {}", config.digest);
    info!(
        "miners: {} honest, {} byzantine (every {:?})",
        config.honest_miners, config.byzantine_miners, config.byzantine_interval
    );

    let sim = Simulation::start(&config).context("failed to start simulation")?;

    // Set up signal handler for graceful shutdown.
    let shared = Arc::clone(sim.shared());
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("received Ctrl+C, shutting down...");
            shared.shutdown();
        }
    });

    if !reporting.stats_interval.is_zero() {
        tokio::spawn(stats_logger(
            Arc::clone(sim.stats()),
            Arc::clone(sim.shared()),
            reporting.stats_interval,
        ));
    }

    let report = tokio::task::spawn_blocking(move || sim.join())
        .await
        .context("simulation join task failed")?
        .context("simulation aborted")?;

    info!(
        "accepted: {} | rejected: {} (pow {}, height {}, linkage {}) | stale: {} | superseded: {}",
        report.accepted,
        report.stats.rejected(),
        report.stats.rejected_pow,
        report.stats.rejected_height,
        report.stats.rejected_linkage,
        report.stats.stale,
        report.stats.superseded
    );
    info!("final head: height={} checksum={}", report.tip.height, report.tip.checksum);
    Ok(())
}

/// Initialize tracing subscriber with the given log level and output format.
///
/// `RUST_LOG` overrides the level. Pass `format = "json"` for one JSON object
/// per event; any other value gives human-readable text.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_thread_names(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_thread_names(true).with_level(true))
            .init();
    }
}
