//! Runtime configuration types for the sensor engine.
//!
//! These are separate from the TOML-deserialized config in `airsense_config`;
//! see `conversions` for the bridge.

use std::time::Duration;

use crate::scoring::ScoreWeights;

/// Burn-in parameters for computing the gas baseline.
#[derive(Debug, Clone)]
pub struct CalibrationCfg {
    /// How long calibration keeps polling before the baseline is computed.
    pub stabilization_window: Duration,
    /// Pause between calibration polls.
    pub sample_interval: Duration,
    /// Number of trailing accepted samples averaged into the baseline.
    pub baseline_window: usize,
}

impl Default for CalibrationCfg {
    fn default() -> Self {
        Self {
            stabilization_window: Duration::from_secs(300),
            sample_interval: Duration::from_secs(2),
            baseline_window: 50,
        }
    }
}

/// Retry policy for the human-facing read.
#[derive(Debug, Clone)]
pub struct DisplayCfg {
    /// Scoring attempts before giving up (>= 1).
    pub max_attempts: u32,
    /// Pause between attempts. Not applied after the last one.
    pub retry_delay: Duration,
}

impl Default for DisplayCfg {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Backoff bounds for the persistence read, which never gives up.
#[derive(Debug, Clone)]
pub struct StorageCfg {
    pub retry_initial: Duration,
    pub retry_max: Duration,
}

impl Default for StorageCfg {
    fn default() -> Self {
        Self {
            retry_initial: Duration::from_millis(50),
            retry_max: Duration::from_secs(2),
        }
    }
}

/// Cadence of the background persistence loop.
#[derive(Debug, Clone)]
pub struct RecorderCfg {
    pub interval: Duration,
}

impl Default for RecorderCfg {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(600),
        }
    }
}

/// Everything the engine needs besides a sensor and a clock.
#[derive(Debug, Clone, Default)]
pub struct EngineCfg {
    pub calibration: CalibrationCfg,
    pub scoring: ScoreWeights,
    pub display: DisplayCfg,
    pub storage: StorageCfg,
}
