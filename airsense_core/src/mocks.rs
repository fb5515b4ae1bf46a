//! Test and helper mocks for airsense_core

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use airsense_traits::{GasSensor, RawSample, ReadingSink, StorageRecord};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Heat-stable sample at 25 °C / 1000 hPa / 50 %RH with the given gas reading.
pub fn sample(gas_resistance: f64) -> RawSample {
    RawSample {
        temperature: 25.0,
        pressure: 1000.0,
        humidity: 50.0,
        gas_resistance,
        heat_stable: true,
    }
}

/// Sensor that plays back a fixed script of results.
///
/// Once the script runs out, `fallback` is returned forever (or an error when
/// no fallback is set). `calls()` counts every poll, shared across clones of
/// the counter handle.
pub struct ScriptedSensor {
    script: VecDeque<Result<RawSample, String>>,
    fallback: Option<RawSample>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedSensor {
    pub fn new<I>(script: I) -> Self
    where
        I: IntoIterator<Item = Result<RawSample, String>>,
    {
        Self {
            script: script.into_iter().collect(),
            fallback: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always returns `s`.
    pub fn repeating(s: RawSample) -> Self {
        Self::new([]).then_repeat(s)
    }

    pub fn then_repeat(mut self, s: RawSample) -> Self {
        self.fallback = Some(s);
        self
    }

    /// Handle to the poll counter; stays valid after the sensor moves into an engine.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl GasSensor for ScriptedSensor {
    fn poll(&mut self) -> Result<RawSample, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.pop_front() {
            Some(Ok(s)) => Ok(s),
            Some(Err(msg)) => Err(msg.into()),
            None => self
                .fallback
                .ok_or_else(|| BoxError::from("script exhausted")),
        }
    }
}

/// A sensor that always errors on poll.
pub struct NoopSensor;

impl GasSensor for NoopSensor {
    fn poll(&mut self) -> Result<RawSample, BoxError> {
        Err(Box::new(std::io::Error::other("noop sensor")))
    }
}

/// Sink that keeps records in memory; clones share storage.
#[derive(Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<StorageRecord>>>,
    fail: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink whose every `store` fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn records(&self) -> Vec<StorageRecord> {
        match self.records.lock() {
            Ok(g) => g.clone(),
            Err(p) => p.into_inner().clone(),
        }
    }
}

impl ReadingSink for MemorySink {
    fn store(&mut self, record: &StorageRecord) -> Result<(), BoxError> {
        if self.fail {
            return Err("sink unavailable".into());
        }
        let mut g = self
            .records
            .lock()
            .map_err(|_| BoxError::from("sink lock poisoned"))?;
        g.push(*record);
        Ok(())
    }
}
