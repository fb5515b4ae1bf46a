//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "airsense", version, about = "BME680 air quality monitor")]
pub struct Cli {
    /// Path to config TOML; built-in defaults when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log and report as JSON lines instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print one display reading
    Status {
        /// Run the full stabilization window first (blocks)
        #[arg(long, action = ArgAction::SetTrue)]
        calibrate: bool,
    },
    /// Calibrate in the background, persist readings, and print a reading periodically
    Run {
        /// Seconds between printed readings
        #[arg(long, value_name = "SECS", default_value_t = 60)]
        report_secs: u64,
        /// Stop after this many printed readings (default: run until Ctrl-C)
        #[arg(long, value_name = "N")]
        max_reports: Option<u64>,
    },
    /// Open the sensor and poll it once
    SelfCheck,
}
