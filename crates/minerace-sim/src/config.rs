//! Simulation configuration.
//!
//! [`SimConfig`] carries the difficulty, the worker set and the stop
//! condition. It is built programmatically or from the CLI and checked once
//! with [`SimConfig::validate`] before any worker starts.

use std::time::Duration;

use minerace_core::constants::{
    DEFAULT_BYZANTINE_INTERVAL_MS, DEFAULT_BYZANTINE_MINERS, DEFAULT_HONEST_MINERS,
};
use minerace_core::digest::DigestKind;
use minerace_core::error::ConfigError;
use minerace_core::Difficulty;

/// Difficulty used when none is given.
pub const DEFAULT_DIFFICULTY: u32 = 16;

/// Configuration for one simulation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    /// Required leading zero bits on every non-genesis checksum.
    pub difficulty: u32,
    /// Miners that search and respect the slot.
    pub honest_miners: usize,
    /// Miners that submit unmined candidates over the slot.
    pub byzantine_miners: usize,
    /// Pause between two byzantine submissions.
    pub byzantine_interval: Duration,
    /// Stop once this many blocks have been accepted. `None` runs until
    /// shut down.
    pub target_blocks: Option<u64>,
    /// Checksum function for every block, genesis included.
    pub digest: DigestKind,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            honest_miners: DEFAULT_HONEST_MINERS,
            byzantine_miners: DEFAULT_BYZANTINE_MINERS,
            byzantine_interval: Duration::from_millis(DEFAULT_BYZANTINE_INTERVAL_MS),
            target_blocks: None,
            digest: DigestKind::default(),
        }
    }
}

impl SimConfig {
    /// Total number of producer threads.
    pub fn producers(&self) -> usize {
        self.honest_miners + self.byzantine_miners
    }

    /// Check the configuration and return the run difficulty.
    pub fn validate(&self) -> Result<Difficulty, ConfigError> {
        let difficulty = Difficulty::new(self.difficulty)?;
        if self.producers() == 0 {
            return Err(ConfigError::NoProducers);
        }
        if self.byzantine_miners > 0 && self.byzantine_interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(difficulty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minerace_core::constants::MAX_DIFFICULTY;

    #[test]
    fn default_worker_set() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.honest_miners, 4);
        assert_eq!(cfg.byzantine_miners, 1);
        assert_eq!(cfg.producers(), 5);
    }

    #[test]
    fn default_byzantine_interval_is_one_second() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.byzantine_interval, Duration::from_secs(1));
    }

    #[test]
    fn default_runs_forever_with_crc32() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.target_blocks, None);
        assert_eq!(cfg.digest, DigestKind::Crc32);
    }

    #[test]
    fn default_is_valid() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.validate().unwrap().bits(), DEFAULT_DIFFICULTY);
    }

    #[test]
    fn difficulty_bounds() {
        let cfg = SimConfig {
            difficulty: MAX_DIFFICULTY,
            ..SimConfig::default()
        };
        assert!(cfg.validate().is_ok());

        let cfg = SimConfig {
            difficulty: MAX_DIFFICULTY + 1,
            ..SimConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::DifficultyOutOfRange {
                got: MAX_DIFFICULTY + 1,
                max: MAX_DIFFICULTY
            })
        );
    }

    #[test]
    fn rejects_empty_worker_set() {
        let cfg = SimConfig {
            honest_miners: 0,
            byzantine_miners: 0,
            ..SimConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::NoProducers));
    }

    #[test]
    fn zero_interval_only_matters_with_byzantine_miners() {
        let cfg = SimConfig {
            byzantine_interval: Duration::ZERO,
            ..SimConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroInterval));

        let cfg = SimConfig {
            byzantine_miners: 0,
            byzantine_interval: Duration::ZERO,
            ..SimConfig::default()
        };
        assert!(cfg.validate().is_ok());
    }
}
