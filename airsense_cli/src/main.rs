use clap::Parser;
use eyre::WrapErr;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use airsense_core::{
    AirQuality, DisplayReading, EngineCfg, Recorder, RecorderCfg, SensorEngine,
};
use airsense_traits::GasSensor;

mod cli;
mod error_fmt;
mod logging;
mod sensor;
mod store;

use cli::{Cli, Commands, JSON_MODE};
use sensor::BoxedSensor;

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = run(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", error_fmt::format_error_json(&e));
        } else {
            eprintln!("{}", error_fmt::humanize(&e));
        }
        std::process::exit(error_fmt::exit_code_for_error(&e));
    }
}

fn run(cli: Cli) -> eyre::Result<()> {
    color_eyre::install()?;

    let cfg = load_config(cli.config.as_deref())?;
    logging::init(&cli.log_level, cli.json, &cfg.logging)?;
    tracing::debug!(config = ?cli.config, "configuration loaded");

    let sensor = sensor::open_sensor(&cfg)?;
    match cli.cmd {
        Commands::Status { calibrate } => cmd_status(sensor, &cfg, calibrate, cli.json),
        Commands::Run {
            report_secs,
            max_reports,
        } => cmd_run(sensor, &cfg, report_secs, max_reports, cli.json),
        Commands::SelfCheck => cmd_self_check(sensor, cli.json),
    }
}

fn load_config(path: Option<&Path>) -> eyre::Result<airsense_config::Config> {
    match path {
        Some(p) => airsense_config::load_file(p).wrap_err(error_fmt::CONFIG_CONTEXT),
        None => Ok(airsense_config::Config::default()),
    }
}

fn build_engine(
    sensor: BoxedSensor,
    cfg: &airsense_config::Config,
) -> eyre::Result<SensorEngine<BoxedSensor>> {
    SensorEngine::builder()
        .with_sensor(sensor)
        .with_config(EngineCfg::from(cfg))
        .build()
}

fn reading_json(r: &DisplayReading) -> serde_json::Value {
    use serde_json::json;
    match r {
        DisplayReading::NoData => json!({ "status": "no_data", "text": r.to_string() }),
        DisplayReading::Reading {
            temperature,
            pressure,
            humidity,
            air_quality,
        } => {
            let (status, score) = match air_quality {
                AirQuality::Score(s) => ("ok", Some(*s)),
                AirQuality::NotStabilized => ("not_stabilized", None),
                AirQuality::Unavailable => ("unavailable", None),
            };
            json!({
                "status": status,
                "temperature": temperature,
                "pressure": pressure,
                "humidity": humidity,
                "air_quality": score,
                "text": r.to_string(),
            })
        }
    }
}

fn print_reading(r: &DisplayReading, json: bool) {
    if json {
        println!("{}", reading_json(r));
    } else {
        println!("{r}");
    }
}

fn cmd_status(
    sensor: BoxedSensor,
    cfg: &airsense_config::Config,
    calibrate: bool,
    json: bool,
) -> eyre::Result<()> {
    let engine = build_engine(sensor, cfg)?;
    if calibrate {
        tracing::info!(
            window_s = cfg.calibration.stabilization_secs,
            "calibrating before reading"
        );
        let outcome = engine.calibrate_default()?;
        tracing::info!(?outcome, "calibration finished");
    }
    print_reading(&engine.display_reading(), json);
    Ok(())
}

fn cmd_run(
    sensor: BoxedSensor,
    cfg: &airsense_config::Config,
    report_secs: u64,
    max_reports: Option<u64>,
    json: bool,
) -> eyre::Result<()> {
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::Relaxed);
        })
        .wrap_err("install Ctrl-C handler")?;
    }

    let engine = Arc::new(build_engine(sensor, cfg)?);
    // Detached; completion shows up in the readings.
    drop(engine.start_calibration()?);

    let sink = store::open_sink(&cfg.storage)?;
    tracing::info!(
        path = %cfg.storage.path,
        format = %cfg.storage.format,
        "persisting readings"
    );
    let recorder = Recorder::spawn(
        Arc::clone(&engine),
        sink,
        RecorderCfg::from(&cfg.storage).interval,
    )?;

    let period = Duration::from_secs(report_secs);
    let mut reports = 0u64;
    while !shutdown.load(Ordering::Relaxed) {
        print_reading(&engine.display_reading(), json);
        reports += 1;
        if max_reports.is_some_and(|m| reports >= m) {
            break;
        }
        let next = Instant::now() + period;
        while Instant::now() < next && !shutdown.load(Ordering::Relaxed) {
            std::thread::sleep(Duration::from_millis(50));
        }
    }

    tracing::info!(reports, stored = recorder.stored(), "shutting down");
    drop(recorder);
    Ok(())
}

fn cmd_self_check(mut sensor: BoxedSensor, json: bool) -> eyre::Result<()> {
    let sample = sensor
        .poll()
        .map_err(|e| airsense_core::hw_error::map_hw_error(e.as_ref()))
        .wrap_err("poll sensor")?;
    if json {
        println!(
            "{}",
            serde_json::json!({
                "status": "ok",
                "temperature": sample.temperature,
                "pressure": sample.pressure,
                "humidity": sample.humidity,
                "gas_resistance": sample.gas_resistance,
                "heat_stable": sample.heat_stable,
            })
        );
    } else {
        println!(
            "OK: {:.2} C, {:.2} hPa, {:.2} %RH, gas {:.0} Ohm (heat stable: {})",
            sample.temperature,
            sample.pressure,
            sample.humidity,
            sample.gas_resistance,
            sample.heat_stable
        );
    }
    Ok(())
}
