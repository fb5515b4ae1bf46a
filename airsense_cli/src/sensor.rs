//! Sensor assembly: BME680 over I2C with the `hardware` feature, simulation otherwise.

use airsense_hardware::{DeviceSettings, FilterSize, Oversampling};
use airsense_traits::GasSensor;
use std::time::Duration;

pub type BoxedSensor = Box<dyn GasSensor + Send>;

/// Map the validated config onto driver settings.
pub fn device_settings(cfg: &airsense_config::Config) -> eyre::Result<DeviceSettings> {
    let os = |name: &str, v: u8| {
        Oversampling::from_factor(v)
            .ok_or_else(|| eyre::eyre!("invalid configuration: oversampling.{name} = {v}"))
    };
    let o = &cfg.oversampling;
    Ok(DeviceSettings {
        humidity_os: os("humidity", o.humidity)?,
        pressure_os: os("pressure", o.pressure)?,
        temperature_os: os("temperature", o.temperature)?,
        filter: FilterSize::from_coefficient(o.filter_size).ok_or_else(|| {
            eyre::eyre!(
                "invalid configuration: oversampling.filter_size = {}",
                o.filter_size
            )
        })?,
        heater_temp_c: cfg.heater.temperature_c,
        heater_duration_ms: cfg.heater.duration_ms,
        heater_profile: cfg.heater.profile,
        measure_timeout: Duration::from_millis(cfg.sensor.measure_timeout_ms),
    })
}

#[cfg(feature = "hardware")]
pub fn open_sensor(cfg: &airsense_config::Config) -> eyre::Result<BoxedSensor> {
    use airsense_hardware::Bme680;
    use airsense_hardware::bme680::i2c::RppalBus;

    let settings = device_settings(cfg)?;
    let bus = cfg.sensor.i2c_bus;
    let dev = match cfg.sensor.address {
        Some(address) => RppalBus::open(bus, address)
            .and_then(|b| Bme680::with_bus(b, address, settings)),
        None => Bme680::open(|address| RppalBus::open(bus, address), settings),
    }
    .map_err(|e| eyre::Report::new(e).wrap_err(format!("open BME680 on /dev/i2c-{bus}")))?;
    tracing::info!(bus, address = dev.address(), "BME680 initialized");
    Ok(Box::new(dev))
}

/// Simulation backend. Test knobs via env:
/// - `AIRSENSE_SIM_MISSING=1` behaves like an absent device
/// - `AIRSENSE_SIM_WARMUP=<polls>` heater warm-up length
/// - `AIRSENSE_SIM_FAIL_EVERY=<n>` fail every n-th poll
#[cfg(not(feature = "hardware"))]
pub fn open_sensor(cfg: &airsense_config::Config) -> eyre::Result<BoxedSensor> {
    use airsense_hardware::{HwError, SimulatedSensor};

    // Same settings validation as the hardware path.
    let _settings = device_settings(cfg)?;
    if std::env::var("AIRSENSE_SIM_MISSING").is_ok_and(|v| v == "1") {
        return Err(eyre::Report::new(HwError::NotFound).wrap_err("open simulated BME680"));
    }
    let env_u64 = |key: &str| std::env::var(key).ok().and_then(|v| v.parse::<u64>().ok());

    let mut sim = SimulatedSensor::new();
    if let Some(n) = env_u64("AIRSENSE_SIM_WARMUP") {
        sim = sim.with_warmup(n);
    }
    sim = sim.with_failure_every(env_u64("AIRSENSE_SIM_FAIL_EVERY"));
    tracing::info!("using simulated BME680");
    Ok(Box::new(sim))
}
