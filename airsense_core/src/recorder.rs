//! Background persistence loop.
//!
//! A `Recorder` owns one thread that takes a storage read from the shared
//! engine once per interval, stamps it, and hands it to a `ReadingSink`.
//! The first record is taken immediately. Sink errors are logged and the
//! loop carries on.
//!
//! Each `Recorder` spawns exactly one thread, shut down and joined when the
//! `Recorder` is dropped.
use crossbeam_channel as xch;
use airsense_traits::clock::Clock;
use airsense_traits::{GasSensor, ReadingSink, StorageRecord};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use crate::engine::SensorEngine;
use crate::error::EngineError;

pub struct Recorder {
    stored: Arc<AtomicU64>,
    /// Lets a blocked storage read give up during shutdown.
    shutdown: Arc<AtomicBool>,
    /// Dropping the sender wakes the interval wait.
    stop_tx: Option<xch::Sender<()>>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl Recorder {
    pub fn spawn<S, C, K>(
        engine: Arc<SensorEngine<S, C>>,
        mut sink: K,
        interval: Duration,
    ) -> Result<Self, EngineError>
    where
        S: GasSensor + Send + 'static,
        C: Clock + Send + Sync + 'static,
        K: ReadingSink + Send + 'static,
    {
        if interval.is_zero() {
            return Err(EngineError::Config("recorder interval must be > 0".into()));
        }
        let (stop_tx, stop_rx) = xch::bounded::<()>(0);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let stored = Arc::new(AtomicU64::new(0));
        let stored_clone = stored.clone();

        let join_handle = std::thread::Builder::new()
            .name("airsense-recorder".into())
            .spawn(move || {
                loop {
                    let Some(reading) = engine.read_for_storage_until(&shutdown_clone) else {
                        break;
                    };
                    let record = StorageRecord {
                        timestamp: chrono::Utc::now(),
                        temperature: reading.temperature,
                        humidity: reading.humidity,
                    };
                    match sink.store(&record) {
                        Ok(()) => {
                            let n = stored_clone.fetch_add(1, Ordering::Relaxed) + 1;
                            tracing::debug!(
                                stored = n,
                                temperature = record.temperature,
                                humidity = record.humidity,
                                "reading stored"
                            );
                        }
                        Err(e) => tracing::warn!(error = %e, "failed to store reading"),
                    }

                    match stop_rx.recv_timeout(interval) {
                        Err(xch::RecvTimeoutError::Timeout) => {}
                        // Explicit stop or sender dropped.
                        _ => break,
                    }
                }
                tracing::trace!("recorder thread exiting cleanly");
            })
            .map_err(|e| EngineError::Spawn(e.to_string()))?;

        tracing::info!(interval_s = interval.as_secs_f64(), "recorder started");
        Ok(Self {
            stored,
            shutdown,
            stop_tx: Some(stop_tx),
            join_handle: Some(join_handle),
        })
    }

    /// Records successfully handed to the sink so far.
    pub fn stored(&self) -> u64 {
        self.stored.load(Ordering::Relaxed)
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.stop_tx.take();

        // A poll already in progress finishes first (bounded by the driver timeout).
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("recorder thread joined successfully"),
                Err(e) => tracing::warn!(?e, "recorder thread panicked during shutdown"),
            }
        }
    }
}
