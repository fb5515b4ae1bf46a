//! Human-readable error descriptions, exit codes and structured JSON error formatting.

use airsense_core::error::{BuildError, EngineError};
use airsense_hardware::HwError;

/// Context attached to every config load/validation failure.
pub const CONFIG_CONTEXT: &str = "invalid configuration";

/// Exit code for a missing sensor.
pub const EXIT_SENSOR_NOT_FOUND: i32 = 2;
/// Exit code for config errors.
pub const EXIT_CONFIG: i32 = 3;

fn is_config_error(err: &eyre::Report) -> bool {
    if matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidConfig(_))
    ) {
        return true;
    }
    err.chain()
        .any(|e| e.to_string().to_ascii_lowercase().contains(CONFIG_CONTEXT))
}

fn hw_error(err: &eyre::Report) -> Option<&HwError> {
    err.chain().find_map(|e| e.downcast_ref::<HwError>())
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingSensor => {
                "What happened: No sensor was provided to the engine.\nLikely causes: The sensor failed to initialize or was not wired into the builder.\nHow to fix: Ensure the BME680 is opened successfully and passed via with_sensor(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range timing or scoring values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(hw) = hw_error(err) {
        return match hw {
            HwError::NotFound => "What happened: No BME680 answered on I2C address 0x76 or 0x77.\nLikely causes: Sensor not wired, SDO strapped to an unexpected level, wrong bus number, or I2C disabled.\nHow to fix: Check SDA/SCL/3V3/GND, run `i2cdetect -y <bus>`, and set sensor.i2c_bus / sensor.address in the config.".to_string(),
            HwError::InvalidChipId { address, id } => format!(
                "What happened: Device at 0x{address:02x} reported chip id 0x{id:02x}, not a BME680.\nLikely causes: A different sensor (e.g. BME280) shares the address.\nHow to fix: Point sensor.address at the BME680 or remove the conflicting device."
            ),
            HwError::Timeout => "What happened: The BME680 did not finish a measurement in time.\nLikely causes: Long heater duration, high oversampling, or a flaky bus.\nHow to fix: Raise sensor.measure_timeout_ms or lower heater.duration_ms.".to_string(),
            HwError::InvalidSettings(msg) => format!(
                "What happened: The driver rejected the device settings ({msg}).\nLikely causes: Out-of-range heater or oversampling values.\nHow to fix: Edit the [heater] and [oversampling] sections."
            ),
            HwError::I2c(_) | HwError::Io(_) => format!(
                "What happened: I2C communication failed ({hw}).\nLikely causes: Loose wiring, missing pull-ups, or insufficient permissions on /dev/i2c-*.\nHow to fix: Check wiring and add the user to the i2c group."
            ),
        };
    }

    if let Some(ee) = err.downcast_ref::<EngineError>() {
        return format!(
            "What happened: {ee}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
        );
    }

    if is_config_error(err) {
        let detail = err.root_cause().to_string();
        return format!(
            "What happened: Configuration is invalid ({detail}).\nLikely causes: A typo, a wrong value type, or an out-of-range value in the TOML.\nHow to fix: Edit the config file and try again."
        );
    }

    // Generic fallback
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 2 sensor not found, 3 config, 1 anything else.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if matches!(hw_error(err), Some(HwError::NotFound)) {
        return EXIT_SENSOR_NOT_FOUND;
    }
    if is_config_error(err) {
        return EXIT_CONFIG;
    }
    1
}

fn reason_name(err: &eyre::Report) -> &'static str {
    match exit_code_for_error(err) {
        EXIT_SENSOR_NOT_FOUND => "SensorNotFound",
        EXIT_CONFIG => "Config",
        _ => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
