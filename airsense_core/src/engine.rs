//! The sensor engine: calibration, display read and storage read over one
//! shared device.
//!
//! Locking rules:
//! - the device sits behind a `Mutex`; one logical poll per acquisition, never
//!   held across a sleep
//! - calibration state sits behind an `RwLock` and is replaced by a single
//!   assignment of a fully built value
//! - at most one calibration run is in flight (`AtomicBool`)
//! - poisoned locks are recovered with a warning

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread;
use std::time::Duration;

use airsense_traits::clock::{Clock, MonotonicClock};
use airsense_traits::{GasSensor, RawSample};

use crate::builder::EngineBuilder;
use crate::calibration::{BaselineWindow, CalibrationOutcome, CalibrationPhase, CalibrationState};
use crate::config::EngineCfg;
use crate::error::EngineError;
use crate::hw_error::map_hw_error;
use crate::reading::{AirQuality, DisplayReading, StorageReading};
use crate::scoring::{AirQualityInput, air_quality_score, round2};
use crate::util::Backoff;

pub struct SensorEngine<S, C = MonotonicClock> {
    sensor: Mutex<S>,
    clock: C,
    cfg: EngineCfg,
    state: RwLock<CalibrationState>,
    calibrating: AtomicBool,
}

impl<S, C> core::fmt::Debug for SensorEngine<S, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SensorEngine")
            .field("cfg", &self.cfg)
            .field("calibrating", &self.calibrating.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl<S: GasSensor> SensorEngine<S, MonotonicClock> {
    /// Start building an engine on the real-time clock.
    pub fn builder() -> EngineBuilder<S> {
        EngineBuilder::default()
    }
}

/// Clears the in-flight flag when a calibration run ends, even by panic.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S: GasSensor, C: Clock> SensorEngine<S, C> {
    pub fn new(sensor: S, clock: C, cfg: EngineCfg) -> Self {
        let state = CalibrationState::uncalibrated(
            cfg.calibration.stabilization_window,
            cfg.calibration.sample_interval,
        );
        Self {
            sensor: Mutex::new(sensor),
            clock,
            cfg,
            state: RwLock::new(state),
            calibrating: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &EngineCfg {
        &self.cfg
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Copy of the current calibration state.
    pub fn calibration_state(&self) -> CalibrationState {
        self.read_state().clone()
    }

    pub fn is_calibrating(&self) -> bool {
        self.calibrating.load(Ordering::Acquire)
    }

    /// Run calibration with the configured window and interval, blocking.
    pub fn calibrate_default(&self) -> Result<CalibrationOutcome, EngineError> {
        let c = &self.cfg.calibration;
        self.calibrate(c.stabilization_window, c.sample_interval)
    }

    /// Poll for `stabilization_window`, every `sample_interval`, and publish
    /// the mean gas resistance of the last accepted samples as the baseline.
    ///
    /// Blocks the calling thread for the whole window. Fails only when another
    /// run is in flight or the interval is zero; a run that collects nothing
    /// usable is reported through the outcome, not as an error.
    pub fn calibrate(
        &self,
        stabilization_window: Duration,
        sample_interval: Duration,
    ) -> Result<CalibrationOutcome, EngineError> {
        if sample_interval.is_zero() {
            return Err(EngineError::Config("sample_interval must be > 0".into()));
        }
        if self
            .calibrating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(EngineError::CalibrationInProgress);
        }
        let _guard = InFlight(&self.calibrating);
        Ok(self.run_calibration(stabilization_window, sample_interval))
    }

    fn run_calibration(&self, window: Duration, interval: Duration) -> CalibrationOutcome {
        self.write_state().phase = CalibrationPhase::Calibrating;
        tracing::info!(
            window_s = window.as_secs_f64(),
            interval_s = interval.as_secs_f64(),
            "sensor stabilization started"
        );

        let mut baseline = BaselineWindow::new(self.cfg.calibration.baseline_window);
        let mut accepted = 0usize;
        let mut polled = 0usize;
        let epoch = self.clock.now();
        while self.clock.elapsed_since(epoch) < window {
            polled += 1;
            match self.poll_device() {
                Ok(s) if s.heat_stable => {
                    baseline.push(s.gas_resistance);
                    accepted += 1;
                    tracing::trace!(gas_ohm = s.gas_resistance, accepted, "burn-in sample");
                }
                Ok(_) => tracing::debug!(polled, "heater not stable; sample discarded"),
                Err(e) => tracing::debug!(polled, error = %e, "burn-in poll failed"),
            }
            self.clock.sleep(interval);
        }

        let outcome = match baseline.mean() {
            Some(b) => CalibrationOutcome::Stabilized {
                baseline_gas: b,
                accepted,
                polled,
            },
            None if accepted == 0 => CalibrationOutcome::NoSamples { polled },
            None => CalibrationOutcome::NonFinite { accepted },
        };

        let mut st = self.write_state();
        let next = match &outcome {
            CalibrationOutcome::Stabilized { baseline_gas, .. } => {
                tracing::info!(
                    baseline_ohm = *baseline_gas,
                    accepted,
                    used = baseline.len(),
                    "sensor stabilization finished"
                );
                CalibrationState {
                    baseline_gas: Some(*baseline_gas),
                    is_stabilized: true,
                    phase: CalibrationPhase::Stabilized,
                    stabilization_window: window,
                    sample_interval: interval,
                }
            }
            failed => {
                tracing::error!(?failed, polled, "sensor stabilization produced no usable baseline");
                if st.is_stabilized {
                    // Previous baseline stays in effect.
                    CalibrationState {
                        phase: CalibrationPhase::Stabilized,
                        ..st.clone()
                    }
                } else {
                    CalibrationState {
                        baseline_gas: None,
                        is_stabilized: false,
                        phase: CalibrationPhase::Failed,
                        stabilization_window: window,
                        sample_interval: interval,
                    }
                }
            }
        };
        *st = next;
        outcome
    }

    /// Human-readable reading; see [`DisplayReading`] for the format.
    pub fn read_display(&self) -> String {
        self.display_reading().to_string()
    }

    /// One display read. Never fails: problems degrade the reading instead.
    pub fn display_reading(&self) -> DisplayReading {
        let sample = match self.poll_device() {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "display read: sensor poll failed");
                return DisplayReading::NoData;
            }
        };

        let reading = |air_quality| DisplayReading::Reading {
            temperature: sample.temperature,
            pressure: sample.pressure,
            humidity: sample.humidity,
            air_quality,
        };

        // Baseline and flag come from one snapshot.
        let Some(baseline) = self.read_state().baseline() else {
            tracing::warn!("gas sensor not stabilized; skipping air quality");
            return reading(AirQuality::NotStabilized);
        };

        match self.score_with_retries(sample, baseline) {
            Some(score) => reading(AirQuality::Score(round2(score))),
            None => reading(AirQuality::Unavailable),
        }
    }

    /// Score `first`, re-polling on failure up to `max_attempts` in total.
    fn score_with_retries(&self, first: RawSample, baseline: f64) -> Option<f64> {
        let max_attempts = self.cfg.display.max_attempts.max(1);
        let mut current = Ok(first);
        for attempt in 1..=max_attempts {
            if attempt > 1 {
                self.clock.sleep(self.cfg.display.retry_delay);
                current = self.poll_device();
            }
            match current.and_then(|s| self.score_sample(&s, baseline)) {
                Ok(score) => {
                    tracing::debug!(attempt, score, "air quality scored");
                    return Some(score);
                }
                Err(e) => {
                    tracing::warn!(attempt, max_attempts, error = %e, "air quality attempt failed");
                    current = Err(e);
                }
            }
        }
        tracing::error!(
            attempts = max_attempts,
            "failed to retrieve air quality data after retries"
        );
        None
    }

    fn score_sample(&self, s: &RawSample, baseline: f64) -> Result<f64, EngineError> {
        if !s.heat_stable {
            return Err(EngineError::HeaterUnstable);
        }
        let score = air_quality_score(
            AirQualityInput {
                humidity: s.humidity,
                gas_resistance: s.gas_resistance,
                gas_baseline: baseline,
            },
            self.cfg.scoring,
        );
        if score.is_finite() {
            Ok(score)
        } else {
            Err(EngineError::NonFiniteScore)
        }
    }

    /// Temperature and humidity for persistence. Retries until the device
    /// answers; never reports an error.
    pub fn read_for_storage(&self) -> StorageReading {
        let never = AtomicBool::new(false);
        loop {
            if let Some(r) = self.read_for_storage_until(&never) {
                return r;
            }
        }
    }

    /// Like [`read_for_storage`](Self::read_for_storage) but gives up with
    /// `None` once `stop` is set.
    pub fn read_for_storage_until(&self, stop: &AtomicBool) -> Option<StorageReading> {
        let s = &self.cfg.storage;
        let mut backoff = Backoff::new(s.retry_initial, s.retry_max);
        let mut failures = 0u64;
        loop {
            if stop.load(Ordering::Relaxed) {
                return None;
            }
            match self.poll_device() {
                Ok(sample) => {
                    if failures > 0 {
                        tracing::info!(failures, "storage read recovered");
                    }
                    return Some(StorageReading {
                        temperature: sample.temperature,
                        humidity: sample.humidity,
                    });
                }
                Err(e) => {
                    failures += 1;
                    let delay = backoff.next_delay();
                    tracing::warn!(
                        failures,
                        retry_in_s = delay.as_secs_f64(),
                        error = %e,
                        "storage read failed; retrying"
                    );
                    self.clock.sleep(delay);
                }
            }
        }
    }

    fn poll_device(&self) -> Result<RawSample, EngineError> {
        let mut sensor = self.lock_sensor();
        sensor.poll().map_err(|e| map_hw_error(e.as_ref()))
    }

    fn lock_sensor(&self) -> MutexGuard<'_, S> {
        self.sensor.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("sensor lock poisoned; recovering");
            poisoned.into_inner()
        })
    }

    fn read_state(&self) -> RwLockReadGuard<'_, CalibrationState> {
        self.state.read().unwrap_or_else(|poisoned| {
            tracing::warn!("calibration state lock poisoned; recovering");
            poisoned.into_inner()
        })
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CalibrationState> {
        self.state.write().unwrap_or_else(|poisoned| {
            tracing::warn!("calibration state lock poisoned; recovering");
            poisoned.into_inner()
        })
    }
}

/// Handle to a background calibration run.
///
/// Dropping it detaches the run; completion is then observed through
/// [`SensorEngine::calibration_state`].
#[derive(Debug)]
pub struct CalibrationHandle {
    join: thread::JoinHandle<CalibrationOutcome>,
}

impl CalibrationHandle {
    /// Block until the run finishes.
    pub fn wait(self) -> Result<CalibrationOutcome, EngineError> {
        self.join
            .join()
            .map_err(|_| EngineError::WorkerPanicked("calibration"))
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

impl<S, C> SensorEngine<S, C>
where
    S: GasSensor + Send + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Launch calibration with the configured window on its own thread and
    /// return immediately.
    pub fn start_calibration(self: &Arc<Self>) -> Result<CalibrationHandle, EngineError> {
        let c = &self.cfg.calibration;
        self.start_calibration_with(c.stabilization_window, c.sample_interval)
    }

    pub fn start_calibration_with(
        self: &Arc<Self>,
        stabilization_window: Duration,
        sample_interval: Duration,
    ) -> Result<CalibrationHandle, EngineError> {
        if sample_interval.is_zero() {
            return Err(EngineError::Config("sample_interval must be > 0".into()));
        }
        if self
            .calibrating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(EngineError::CalibrationInProgress);
        }
        // Phase flips before returning so callers never observe a stale one.
        self.write_state().phase = CalibrationPhase::Calibrating;

        let engine = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name("airsense-calibration".into())
            .spawn(move || {
                let _guard = InFlight(&engine.calibrating);
                engine.run_calibration(stabilization_window, sample_interval)
            });
        match spawned {
            Ok(join) => Ok(CalibrationHandle { join }),
            Err(e) => {
                self.calibrating.store(false, Ordering::Release);
                let mut st = self.write_state();
                st.phase = if st.is_stabilized {
                    CalibrationPhase::Stabilized
                } else {
                    CalibrationPhase::Uncalibrated
                };
                Err(EngineError::Spawn(e.to_string()))
            }
        }
    }
}
