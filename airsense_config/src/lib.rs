#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the air-quality gateway.
//!
//! - `Config` and its sections are deserialized from TOML; every section has
//!   defaults so an empty file is a valid config.
//! - `Config::validate` rejects values the BME680 cannot be programmed with
//!   and timing knobs that would stall the engine.
use serde::Deserialize;
use std::path::Path;

const OVERSAMPLING_FACTORS: [u8; 6] = [0, 1, 2, 4, 8, 16];
const FILTER_SIZES: [u8; 8] = [0, 1, 3, 7, 15, 31, 63, 127];

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SensorCfg {
    /// Linux I2C bus number (`/dev/i2c-N`).
    pub i2c_bus: u8,
    /// Fixed address; when absent 0x76 then 0x77 are probed.
    pub address: Option<u8>,
    /// Upper bound for one forced-mode conversion.
    pub measure_timeout_ms: u64,
}

impl Default for SensorCfg {
    fn default() -> Self {
        Self {
            i2c_bus: 1,
            address: None,
            measure_timeout_ms: 500,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HeaterCfg {
    pub temperature_c: u16,
    pub duration_ms: u16,
    pub profile: u8,
}

impl Default for HeaterCfg {
    fn default() -> Self {
        Self {
            temperature_c: 320,
            duration_ms: 150,
            profile: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OversamplingCfg {
    pub humidity: u8,
    pub pressure: u8,
    pub temperature: u8,
    /// IIR filter coefficient.
    pub filter_size: u8,
}

impl Default for OversamplingCfg {
    fn default() -> Self {
        Self {
            humidity: 2,
            pressure: 4,
            temperature: 8,
            filter_size: 3,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CalibrationCfg {
    /// How long the burn-in runs before a baseline is computed.
    pub stabilization_secs: u64,
    /// Pause between burn-in polls.
    pub sample_interval_ms: u64,
    /// Number of trailing accepted samples averaged into the baseline.
    pub baseline_window: usize,
}

impl Default for CalibrationCfg {
    fn default() -> Self {
        Self {
            stabilization_secs: 300,
            sample_interval_ms: 2000,
            baseline_window: 50,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScoringCfg {
    /// Optimal indoor humidity, %RH.
    pub humidity_baseline: f64,
    /// Share of the score driven by humidity (0.25 = 25:75 humidity:gas).
    pub humidity_weight: f64,
}

impl Default for ScoringCfg {
    fn default() -> Self {
        Self {
            humidity_baseline: 50.0,
            humidity_weight: 0.25,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DisplayCfg {
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for DisplayCfg {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageCfg {
    /// Seconds between persisted samples.
    pub interval_secs: u64,
    /// File the recorder writes to.
    pub path: String,
    /// "sqlite" (table `sensor_data`) or "csv".
    pub format: String,
    pub retry_initial_ms: u64,
    pub retry_max_ms: u64,
}

impl Default for StorageCfg {
    fn default() -> Self {
        Self {
            interval_secs: 600,
            path: "sensor_data.db".to_string(),
            format: "sqlite".to_string(),
            retry_initial_ms: 50,
            retry_max_ms: 2000,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub sensor: SensorCfg,
    pub heater: HeaterCfg,
    pub oversampling: OversamplingCfg,
    pub calibration: CalibrationCfg,
    pub scoring: ScoringCfg,
    pub display: DisplayCfg,
    pub storage: StorageCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))?;
    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Sensor
        if self.sensor.measure_timeout_ms == 0 {
            eyre::bail!("sensor.measure_timeout_ms must be >= 1");
        }
        if let Some(addr) = self.sensor.address
            && addr != 0x76
            && addr != 0x77
        {
            eyre::bail!("sensor.address must be 0x76 or 0x77");
        }

        // Heater
        if !(200..=400).contains(&self.heater.temperature_c) {
            eyre::bail!("heater.temperature_c must be in [200, 400]");
        }
        if self.heater.duration_ms == 0 || self.heater.duration_ms > 4032 {
            eyre::bail!("heater.duration_ms must be in [1, 4032]");
        }
        if self.heater.profile > 9 {
            eyre::bail!("heater.profile must be in [0, 9]");
        }

        // Oversampling
        for (name, v) in [
            ("humidity", self.oversampling.humidity),
            ("pressure", self.oversampling.pressure),
            ("temperature", self.oversampling.temperature),
        ] {
            if !OVERSAMPLING_FACTORS.contains(&v) {
                eyre::bail!("oversampling.{name} must be one of 0, 1, 2, 4, 8, 16");
            }
        }
        if !FILTER_SIZES.contains(&self.oversampling.filter_size) {
            eyre::bail!("oversampling.filter_size must be one of 0, 1, 3, 7, 15, 31, 63, 127");
        }

        // Calibration
        if self.calibration.stabilization_secs == 0 {
            eyre::bail!("calibration.stabilization_secs must be >= 1");
        }
        if self.calibration.sample_interval_ms == 0 {
            eyre::bail!("calibration.sample_interval_ms must be >= 1");
        }
        if self.calibration.baseline_window == 0 {
            eyre::bail!("calibration.baseline_window must be >= 1");
        }

        // Scoring
        let hb = self.scoring.humidity_baseline;
        if !(hb > 0.0 && hb < 100.0) {
            eyre::bail!("scoring.humidity_baseline must be in (0.0, 100.0)");
        }
        let hw = self.scoring.humidity_weight;
        if !(0.0..=1.0).contains(&hw) {
            eyre::bail!("scoring.humidity_weight must be in [0.0, 1.0]");
        }

        // Display
        if self.display.max_attempts == 0 {
            eyre::bail!("display.max_attempts must be >= 1");
        }

        // Storage
        if self.storage.interval_secs == 0 {
            eyre::bail!("storage.interval_secs must be >= 1");
        }
        if self.storage.path.trim().is_empty() {
            eyre::bail!("storage.path must not be empty");
        }
        if !matches!(self.storage.format.as_str(), "sqlite" | "csv") {
            eyre::bail!("storage.format must be one of sqlite, csv");
        }
        if self.storage.retry_initial_ms == 0 {
            eyre::bail!("storage.retry_initial_ms must be >= 1");
        }
        if self.storage.retry_max_ms < self.storage.retry_initial_ms {
            eyre::bail!("storage.retry_max_ms must be >= storage.retry_initial_ms");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never, daily, hourly");
        }

        Ok(())
    }
}
