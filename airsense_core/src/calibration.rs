//! Gas baseline state and the rolling window it is computed from.

use std::collections::VecDeque;
use std::time::Duration;

/// Ordered window of the most recent accepted gas readings.
///
/// Pushing beyond capacity evicts the oldest value, so after N pushes the
/// window holds the last `min(N, capacity)` readings.
#[derive(Debug, Clone)]
pub struct BaselineWindow {
    buf: VecDeque<f64>,
    cap: usize,
}

impl BaselineWindow {
    pub fn new(capacity: usize) -> Self {
        let cap = capacity.max(1);
        Self {
            buf: VecDeque::with_capacity(cap),
            cap,
        }
    }

    pub fn push(&mut self, gas_ohm: f64) {
        if self.buf.len() == self.cap {
            self.buf.pop_front();
        }
        self.buf.push_back(gas_ohm);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Arithmetic mean of the retained values; `None` when empty or non-finite.
    pub fn mean(&self) -> Option<f64> {
        if self.buf.is_empty() {
            return None;
        }
        let sum: f64 = self.buf.iter().sum();
        let n = u32::try_from(self.buf.len()).map_or(f64::from(u32::MAX), f64::from);
        let mean = sum / n;
        mean.is_finite().then_some(mean)
    }
}

/// Where the engine is in its calibration lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationPhase {
    Uncalibrated,
    Calibrating,
    Stabilized,
    Failed,
}

/// Snapshot of the engine's calibration.
///
/// `baseline_gas` is only meaningful when `is_stabilized` is true; use
/// [`CalibrationState::baseline`] to read both together.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationState {
    pub baseline_gas: Option<f64>,
    pub is_stabilized: bool,
    pub phase: CalibrationPhase,
    pub stabilization_window: Duration,
    pub sample_interval: Duration,
}

impl CalibrationState {
    pub fn uncalibrated(stabilization_window: Duration, sample_interval: Duration) -> Self {
        Self {
            baseline_gas: None,
            is_stabilized: false,
            phase: CalibrationPhase::Uncalibrated,
            stabilization_window,
            sample_interval,
        }
    }

    /// Baseline usable for scoring.
    pub fn baseline(&self) -> Option<f64> {
        if self.is_stabilized {
            self.baseline_gas
        } else {
            None
        }
    }
}

/// Result of one calibration run.
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationOutcome {
    /// A finite baseline was computed and published.
    Stabilized {
        baseline_gas: f64,
        /// Heat-stable samples collected over the whole window.
        accepted: usize,
        /// Poll attempts, including failed and unstable ones.
        polled: usize,
    },
    /// No heat-stable sample arrived before the window closed.
    NoSamples { polled: usize },
    /// Samples arrived but their mean was not a finite number.
    NonFinite { accepted: usize },
}

impl CalibrationOutcome {
    pub fn is_stabilized(&self) -> bool {
        matches!(self, CalibrationOutcome::Stabilized { .. })
    }
}
