use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("driver error: {0}")]
    Driver(String),
    #[error("timeout waiting for sensor")]
    Timeout,
    #[error("gas heater not stable")]
    HeaterUnstable,
    #[error("air quality score is not finite")]
    NonFiniteScore,
    #[error("calibration already in progress")]
    CalibrationInProgress,
    #[error("failed to spawn worker thread: {0}")]
    Spawn(String),
    #[error("{0} thread panicked")]
    WorkerPanicked(&'static str),
    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("missing sensor")]
    MissingSensor,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
