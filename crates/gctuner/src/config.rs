//! Tuner configuration

use anyhow::{bail, Result};
use std::time::Duration;

/// Configuration for the pacer tuner. Immutable once the tuner is built.
#[derive(Debug, Clone)]
pub struct TunerConfig {
    /// How often to collect a sample and evaluate a ratio change
    pub monitor_interval: Duration,
    /// Lower clamp bound for the pacer ratio
    pub min_ratio: i64,
    /// Upper clamp bound for the pacer ratio
    pub max_ratio: i64,
    /// Desired mean of recent GC pauses
    pub target_pause: Duration,
    /// Fraction of the container memory limit treated as the effective limit
    pub memory_limit_percent: f64,
    /// Gain applied to factor deltas (0.1 = conservative, 2.0 = aggressive)
    pub aggressiveness: f64,
    /// Maximum age of decisions considered by the oscillation guard
    pub stabilization_window: Duration,
    /// Cap on the ratio change applied in a single tick
    pub max_change_per_interval: i64,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            monitor_interval: Duration::from_secs(30),
            min_ratio: 50,
            max_ratio: 800,
            target_pause: Duration::from_millis(10),
            memory_limit_percent: 0.8,
            aggressiveness: 0.3,
            stabilization_window: Duration::from_secs(5 * 60),
            max_change_per_interval: 50,
        }
    }
}

impl TunerConfig {
    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<()> {
        if self.monitor_interval < Duration::from_secs(1) {
            bail!("monitor interval must be at least 1 second");
        }
        if self.min_ratio < 10 {
            bail!("minimum GC ratio must be at least 10");
        }
        if self.max_ratio < self.min_ratio || self.max_ratio > 2000 {
            bail!("maximum GC ratio must be between the minimum and 2000");
        }
        if self.target_pause.is_zero() {
            bail!("target pause must be positive");
        }
        if !(0.1..=1.0).contains(&self.memory_limit_percent) {
            bail!("memory limit percent must be between 0.1 and 1.0");
        }
        if !(0.1..=2.0).contains(&self.aggressiveness) {
            bail!("aggressiveness must be between 0.1 and 2.0");
        }
        if self.stabilization_window.is_zero() {
            bail!("stabilization window must be positive");
        }
        if self.max_change_per_interval <= 0 {
            bail!("max change per interval must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = TunerConfig::default();
        assert!(config.validate().is_ok());

        assert_eq!(config.monitor_interval, Duration::from_secs(30));
        assert_eq!(config.min_ratio, 50);
        assert_eq!(config.max_ratio, 800);
        assert_eq!(config.target_pause, Duration::from_millis(10));
        assert_eq!(config.memory_limit_percent, 0.8);
        assert_eq!(config.aggressiveness, 0.3);
        assert_eq!(config.stabilization_window, Duration::from_secs(300));
        assert_eq!(config.max_change_per_interval, 50);
    }

    #[test]
    fn test_rejects_short_monitor_interval() {
        let config = TunerConfig {
            monitor_interval: Duration::from_millis(500),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_ratio_bounds() {
        let config = TunerConfig {
            min_ratio: 900,
            max_ratio: 800,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_ratio_bounds_out_of_range() {
        let too_low = TunerConfig {
            min_ratio: 5,
            ..Default::default()
        };
        assert!(too_low.validate().is_err());

        let too_high = TunerConfig {
            max_ratio: 2500,
            ..Default::default()
        };
        assert!(too_high.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_target_pause() {
        let config = TunerConfig {
            target_pause: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_memory_limit_percent_out_of_range() {
        for percent in [0.05, 1.5] {
            let config = TunerConfig {
                memory_limit_percent: percent,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "accepted {percent}");
        }
    }

    #[test]
    fn test_rejects_aggressiveness_out_of_range() {
        for aggressiveness in [0.05, 3.0] {
            let config = TunerConfig {
                aggressiveness,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "accepted {aggressiveness}");
        }
    }

    #[test]
    fn test_rejects_zero_stabilization_window() {
        let config = TunerConfig {
            stabilization_window: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_nonpositive_max_change() {
        let config = TunerConfig {
            max_change_per_interval: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
