#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Sensor acquisition and calibration engine (hardware-agnostic).
//!
//! All device access goes through `airsense_traits::GasSensor`; persistence
//! goes through `airsense_traits::ReadingSink`.
//!
//! ## Architecture
//!
//! - **Engine**: `SensorEngine` shares one device between calibration, the
//!   display read and the storage read (`engine` module)
//! - **Calibration**: baseline window and state machine (`calibration` module)
//! - **Scoring**: pure air-quality formula (`scoring` module)
//! - **Recorder**: background persistence loop (`recorder` module)
//! - **Configuration**: runtime config structs and `From` bridges from
//!   `airsense_config` (`config`, `conversions` modules)

pub mod builder;
pub mod calibration;
pub mod config;
pub mod conversions;
pub mod engine;
pub mod error;
pub mod hw_error;
pub mod mocks;
pub mod reading;
pub mod recorder;
pub mod scoring;
pub mod util;

pub use builder::EngineBuilder;
pub use calibration::{BaselineWindow, CalibrationOutcome, CalibrationPhase, CalibrationState};
pub use config::{CalibrationCfg, DisplayCfg, EngineCfg, RecorderCfg, StorageCfg};
pub use engine::{CalibrationHandle, SensorEngine};
pub use error::{BuildError, EngineError, Result};
pub use reading::{AirQuality, DisplayReading, StorageReading};
pub use recorder::Recorder;
pub use scoring::{AirQualityInput, ScoreWeights, air_quality_score};
