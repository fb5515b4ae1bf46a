pub mod bme680;
pub mod error;
pub mod util;

use airsense_traits::{GasSensor, RawSample};

pub use bme680::{Bme680, DeviceSettings, FilterSize, Oversampling, RegisterBus};
pub use error::HwError;

/// Simulated BME680 for host builds and demos.
///
/// Readings drift slowly and deterministically. The gas heater reports
/// unstable for the first `warmup_polls` polls, and every `fail_every`-th
/// poll can be made to fail like a noisy bus.
pub struct SimulatedSensor {
    polls: u64,
    warmup_polls: u64,
    fail_every: Option<u64>,
    base_gas_ohm: f64,
}

impl Default for SimulatedSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedSensor {
    pub fn new() -> Self {
        SimulatedSensor {
            polls: 0,
            warmup_polls: 5,
            fail_every: None,
            base_gas_ohm: 120_000.0,
        }
    }

    pub fn with_warmup(mut self, polls: u64) -> Self {
        self.warmup_polls = polls;
        self
    }

    /// Fail every `n`-th poll (n >= 2); `None` or values below 2 disable failures.
    pub fn with_failure_every(mut self, n: Option<u64>) -> Self {
        self.fail_every = n.filter(|n| *n >= 2);
        self
    }

    pub fn polls(&self) -> u64 {
        self.polls
    }
}

impl GasSensor for SimulatedSensor {
    fn poll(&mut self) -> Result<RawSample, Box<dyn std::error::Error + Send + Sync>> {
        self.polls += 1;
        let n = self.polls;
        if let Some(every) = self.fail_every
            && n % every == 0
        {
            tracing::debug!(poll = n, "simulated bus error");
            return Err(Box::new(HwError::I2c("simulated nack".into())));
        }
        let sample = RawSample {
            temperature: 21.5 + (n % 20) as f64 * 0.05,
            pressure: 1013.25 - (n % 7) as f64 * 0.1,
            humidity: 45.0 + (n % 10) as f64 * 0.2,
            gas_resistance: self.base_gas_ohm + (n % 50) as f64 * 100.0,
            heat_stable: n > self.warmup_polls,
        };
        tracing::trace!(
            poll = n,
            temperature = sample.temperature,
            gas_ohm = sample.gas_resistance,
            "simulated sample"
        );
        Ok(sample)
    }
}
