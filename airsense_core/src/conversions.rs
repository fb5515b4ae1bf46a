//! `From` implementations bridging `airsense_config` types to `airsense_core` types.

use std::time::Duration;

use crate::config::{CalibrationCfg, DisplayCfg, EngineCfg, RecorderCfg, StorageCfg};
use crate::scoring::ScoreWeights;

// ── CalibrationCfg ───────────────────────────────────────────────────────────

impl From<&airsense_config::CalibrationCfg> for CalibrationCfg {
    fn from(c: &airsense_config::CalibrationCfg) -> Self {
        Self {
            stabilization_window: Duration::from_secs(c.stabilization_secs),
            sample_interval: Duration::from_millis(c.sample_interval_ms),
            baseline_window: c.baseline_window,
        }
    }
}

// ── ScoreWeights ─────────────────────────────────────────────────────────────

impl From<&airsense_config::ScoringCfg> for ScoreWeights {
    fn from(c: &airsense_config::ScoringCfg) -> Self {
        Self {
            humidity_baseline: c.humidity_baseline,
            humidity_weight: c.humidity_weight,
        }
    }
}

// ── DisplayCfg ───────────────────────────────────────────────────────────────

impl From<&airsense_config::DisplayCfg> for DisplayCfg {
    fn from(c: &airsense_config::DisplayCfg) -> Self {
        Self {
            max_attempts: c.max_attempts,
            retry_delay: Duration::from_millis(c.retry_delay_ms),
        }
    }
}

// ── StorageCfg / RecorderCfg ─────────────────────────────────────────────────

impl From<&airsense_config::StorageCfg> for StorageCfg {
    fn from(c: &airsense_config::StorageCfg) -> Self {
        Self {
            retry_initial: Duration::from_millis(c.retry_initial_ms),
            retry_max: Duration::from_millis(c.retry_max_ms),
        }
    }
}

impl From<&airsense_config::StorageCfg> for RecorderCfg {
    fn from(c: &airsense_config::StorageCfg) -> Self {
        Self {
            interval: Duration::from_secs(c.interval_secs),
        }
    }
}

// ── EngineCfg ────────────────────────────────────────────────────────────────

impl From<&airsense_config::Config> for EngineCfg {
    fn from(c: &airsense_config::Config) -> Self {
        Self {
            calibration: (&c.calibration).into(),
            scoring: (&c.scoring).into(),
            display: (&c.display).into(),
            storage: (&c.storage).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_cfg_from_defaults_matches_runtime_defaults() {
        let cfg = airsense_config::Config::default();
        let e = EngineCfg::from(&cfg);
        let d = EngineCfg::default();
        assert_eq!(e.calibration.stabilization_window, d.calibration.stabilization_window);
        assert_eq!(e.calibration.sample_interval, d.calibration.sample_interval);
        assert_eq!(e.calibration.baseline_window, d.calibration.baseline_window);
        assert_eq!(e.scoring, d.scoring);
        assert_eq!(e.display.max_attempts, d.display.max_attempts);
        assert_eq!(e.display.retry_delay, d.display.retry_delay);
        assert_eq!(e.storage.retry_initial, d.storage.retry_initial);
        assert_eq!(e.storage.retry_max, d.storage.retry_max);
        assert_eq!(RecorderCfg::from(&cfg.storage).interval, RecorderCfg::default().interval);
    }
}
