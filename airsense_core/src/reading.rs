//! Results of the display and storage read paths.

use core::fmt;

/// Air-quality part of a display reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AirQuality {
    /// Score rounded to two decimals.
    Score(f64),
    /// Calibration has not produced a baseline yet.
    NotStabilized,
    /// Every scoring attempt failed.
    Unavailable,
}

/// Human-facing reading. Renders to the text shown to users via `Display`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayReading {
    NoData,
    Reading {
        temperature: f64,
        pressure: f64,
        humidity: f64,
        air_quality: AirQuality,
    },
}

impl DisplayReading {
    pub fn air_quality(&self) -> Option<AirQuality> {
        match self {
            DisplayReading::NoData => None,
            DisplayReading::Reading { air_quality, .. } => Some(*air_quality),
        }
    }
}

impl fmt::Display for DisplayReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayReading::NoData => f.write_str("No sensor data available."),
            DisplayReading::Reading {
                temperature,
                pressure,
                humidity,
                air_quality,
            } => {
                write!(
                    f,
                    "Temperature: {temperature:.2} C\nPressure: {pressure:.2} hPa\nHumidity: {humidity:.2} %RH"
                )?;
                match air_quality {
                    AirQuality::Score(s) => write!(f, "\nAir Quality score: {s:.2}"),
                    AirQuality::NotStabilized => {
                        f.write_str("\nGas sensor not stabilized, no air quality data.")
                    }
                    AirQuality::Unavailable => f.write_str(", Air Quality data unavailable"),
                }
            }
        }
    }
}

/// Minimal reading persisted by the storage loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StorageReading {
    pub temperature: f64,
    pub humidity: f64,
}
