//! Builder for `SensorEngine`.
//!
//! The sensor is the only required piece; every config section falls back to
//! its default. `build()` validates timing and scoring knobs and reports
//! problems as a typed `BuildError` wrapped in `eyre::Report`.

use airsense_traits::GasSensor;
use airsense_traits::clock::{Clock, MonotonicClock};

use crate::config::{CalibrationCfg, DisplayCfg, EngineCfg, StorageCfg};
use crate::engine::SensorEngine;
use crate::error::{BuildError, Result};
use crate::scoring::ScoreWeights;

pub struct EngineBuilder<S, C = MonotonicClock> {
    sensor: Option<S>,
    clock: C,
    calibration: Option<CalibrationCfg>,
    scoring: Option<ScoreWeights>,
    display: Option<DisplayCfg>,
    storage: Option<StorageCfg>,
}

impl<S> Default for EngineBuilder<S, MonotonicClock> {
    fn default() -> Self {
        Self {
            sensor: None,
            clock: MonotonicClock::new(),
            calibration: None,
            scoring: None,
            display: None,
            storage: None,
        }
    }
}

impl<S, C> EngineBuilder<S, C> {
    pub fn with_sensor(mut self, sensor: S) -> Self {
        self.sensor = Some(sensor);
        self
    }

    /// Swap the time source (tests use `ManualClock`).
    pub fn with_clock<C2: Clock>(self, clock: C2) -> EngineBuilder<S, C2> {
        EngineBuilder {
            sensor: self.sensor,
            clock,
            calibration: self.calibration,
            scoring: self.scoring,
            display: self.display,
            storage: self.storage,
        }
    }

    /// Set every section at once; later `with_*` calls override.
    pub fn with_config(mut self, cfg: EngineCfg) -> Self {
        self.calibration = Some(cfg.calibration);
        self.scoring = Some(cfg.scoring);
        self.display = Some(cfg.display);
        self.storage = Some(cfg.storage);
        self
    }

    pub fn with_calibration(mut self, c: CalibrationCfg) -> Self {
        self.calibration = Some(c);
        self
    }

    pub fn with_scoring(mut self, w: ScoreWeights) -> Self {
        self.scoring = Some(w);
        self
    }

    pub fn with_display(mut self, d: DisplayCfg) -> Self {
        self.display = Some(d);
        self
    }

    pub fn with_storage(mut self, s: StorageCfg) -> Self {
        self.storage = Some(s);
        self
    }
}

impl<S: GasSensor, C: Clock> EngineBuilder<S, C> {
    pub fn build(self) -> Result<SensorEngine<S, C>> {
        let sensor = self
            .sensor
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSensor))?;
        let cfg = EngineCfg {
            calibration: self.calibration.unwrap_or_default(),
            scoring: self.scoring.unwrap_or_default(),
            display: self.display.unwrap_or_default(),
            storage: self.storage.unwrap_or_default(),
        };
        validate(&cfg)?;
        tracing::debug!(?cfg, "sensor engine built");
        Ok(SensorEngine::new(sensor, self.clock, cfg))
    }
}

fn invalid(msg: &'static str) -> eyre::Report {
    eyre::Report::new(BuildError::InvalidConfig(msg))
}

fn validate(cfg: &EngineCfg) -> Result<()> {
    let c = &cfg.calibration;
    if c.stabilization_window.is_zero() {
        return Err(invalid("stabilization_window must be > 0"));
    }
    if c.sample_interval.is_zero() {
        return Err(invalid("sample_interval must be > 0"));
    }
    if c.baseline_window == 0 {
        return Err(invalid("baseline_window must be >= 1"));
    }

    let w = &cfg.scoring;
    if !(w.humidity_baseline > 0.0 && w.humidity_baseline < 100.0) {
        return Err(invalid("humidity_baseline must be in (0, 100)"));
    }
    if !(0.0..=1.0).contains(&w.humidity_weight) {
        return Err(invalid("humidity_weight must be in [0, 1]"));
    }

    if cfg.display.max_attempts == 0 {
        return Err(invalid("max_attempts must be >= 1"));
    }

    let s = &cfg.storage;
    if s.retry_initial.is_zero() {
        return Err(invalid("retry_initial must be > 0"));
    }
    if s.retry_max < s.retry_initial {
        return Err(invalid("retry_max must be >= retry_initial"));
    }
    Ok(())
}
