//! Plain data carried across the driver and persistence boundaries.

use chrono::{DateTime, Utc};

/// One compensated measurement as reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Hectopascal.
    pub pressure: f64,
    /// Relative humidity, percent.
    pub humidity: f64,
    /// Ohms.
    pub gas_resistance: f64,
    /// Gas heater reached its target temperature for this measurement.
    pub heat_stable: bool,
}

/// A timestamped row handed to a `ReadingSink`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StorageRecord {
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
}
