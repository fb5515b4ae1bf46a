//! Register-level BME680 driver.
//!
//! The driver is generic over a [`RegisterBus`] so the full init/measure path
//! (chip probing, factory coefficient decoding, forced-mode measurement and
//! compensation) runs against an in-memory register map on the host. The
//! `rppal` I2C implementation lives behind the `hardware` feature.
//!
//! Compensation uses the floating-point formulas from the Bosch reference
//! driver; results are reported in °C, hPa, %RH and Ω.

use std::time::Duration;

use airsense_traits::{GasSensor, RawSample};
use tracing::{debug, trace};

use crate::error::{HwError, Result};
use crate::util::wait_until_with_timeout;

pub const ADDR_PRIMARY: u8 = 0x76;
pub const ADDR_SECONDARY: u8 = 0x77;
pub const CHIP_ID: u8 = 0x61;

mod reg {
    pub const RES_HEAT_VAL: u8 = 0x00;
    pub const RES_HEAT_RANGE: u8 = 0x02;
    pub const RANGE_SW_ERR: u8 = 0x04;
    pub const FIELD0: u8 = 0x1D;
    pub const RES_HEAT0: u8 = 0x5A;
    pub const GAS_WAIT0: u8 = 0x64;
    pub const CTRL_GAS0: u8 = 0x70;
    pub const CTRL_GAS1: u8 = 0x71;
    pub const CTRL_HUM: u8 = 0x72;
    pub const CTRL_MEAS: u8 = 0x74;
    pub const CONFIG: u8 = 0x75;
    pub const COEFF1: u8 = 0x89;
    pub const CHIP_ID: u8 = 0xD0;
    pub const SOFT_RESET: u8 = 0xE0;
    pub const COEFF2: u8 = 0xE1;
}

const SOFT_RESET_CMD: u8 = 0xB6;
const COEFF1_LEN: usize = 25;
const COEFF2_LEN: usize = 16;
const FIELD_LEN: usize = 15;
const NEW_DATA: u8 = 0x80;
const GAS_VALID: u8 = 0x20;
const HEAT_STAB: u8 = 0x10;
const RUN_GAS: u8 = 0x10;
const MODE_FORCED: u8 = 0x01;
const MAX_HEATER_PROFILE: u8 = 9;
const AMBIENT_DEFAULT_C: f64 = 25.0;

const GAS_K1_RANGE: [f64; 16] = [
    0.0, 0.0, 0.0, 0.0, 0.0, -1.0, 0.0, -0.8, 0.0, 0.0, -0.2, -0.5, 0.0, -1.0, 0.0, 0.0,
];
const GAS_K2_RANGE: [f64; 16] = [
    0.0, 0.0, 0.0, 0.0, 0.1, 0.7, 0.0, -0.8, -0.1, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
];

/// Byte-addressed register access to one device.
pub trait RegisterBus {
    fn read_regs(&mut self, reg: u8, buf: &mut [u8]) -> Result<()>;
    fn write_reg(&mut self, reg: u8, value: u8) -> Result<()>;
}

impl<B: RegisterBus + ?Sized> RegisterBus for Box<B> {
    fn read_regs(&mut self, reg: u8, buf: &mut [u8]) -> Result<()> {
        (**self).read_regs(reg, buf)
    }
    fn write_reg(&mut self, reg: u8, value: u8) -> Result<()> {
        (**self).write_reg(reg, value)
    }
}

/// Oversampling rate for one measurement channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Oversampling {
    Skip,
    X1,
    X2,
    X4,
    X8,
    X16,
}

impl Oversampling {
    /// Map a plain factor (0 = skip, 1, 2, 4, 8, 16).
    pub fn from_factor(factor: u8) -> Option<Self> {
        match factor {
            0 => Some(Self::Skip),
            1 => Some(Self::X1),
            2 => Some(Self::X2),
            4 => Some(Self::X4),
            8 => Some(Self::X8),
            16 => Some(Self::X16),
            _ => None,
        }
    }

    fn bits(self) -> u8 {
        match self {
            Self::Skip => 0,
            Self::X1 => 1,
            Self::X2 => 2,
            Self::X4 => 3,
            Self::X8 => 4,
            Self::X16 => 5,
        }
    }
}

/// IIR filter coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterSize {
    Size0,
    Size1,
    Size3,
    Size7,
    Size15,
    Size31,
    Size63,
    Size127,
}

impl FilterSize {
    pub fn from_coefficient(size: u8) -> Option<Self> {
        match size {
            0 => Some(Self::Size0),
            1 => Some(Self::Size1),
            3 => Some(Self::Size3),
            7 => Some(Self::Size7),
            15 => Some(Self::Size15),
            31 => Some(Self::Size31),
            63 => Some(Self::Size63),
            127 => Some(Self::Size127),
            _ => None,
        }
    }

    fn bits(self) -> u8 {
        match self {
            Self::Size0 => 0,
            Self::Size1 => 1,
            Self::Size3 => 2,
            Self::Size7 => 3,
            Self::Size15 => 4,
            Self::Size31 => 5,
            Self::Size63 => 6,
            Self::Size127 => 7,
        }
    }
}

/// Oversampling, filter and gas heater setup applied at construction.
#[derive(Debug, Clone)]
pub struct DeviceSettings {
    pub humidity_os: Oversampling,
    pub pressure_os: Oversampling,
    pub temperature_os: Oversampling,
    pub filter: FilterSize,
    /// Heater target in °C (capped at 400).
    pub heater_temp_c: u16,
    pub heater_duration_ms: u16,
    /// Heater set-point slot, 0..=9.
    pub heater_profile: u8,
    /// Upper bound on one forced-mode conversion.
    pub measure_timeout: Duration,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            humidity_os: Oversampling::X2,
            pressure_os: Oversampling::X4,
            temperature_os: Oversampling::X8,
            filter: FilterSize::Size3,
            heater_temp_c: 320,
            heater_duration_ms: 150,
            heater_profile: 0,
            measure_timeout: Duration::from_millis(500),
        }
    }
}

/// Factory trimming parameters decoded from NVM.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct CalibCoeffs {
    t1: u16,
    t2: i16,
    t3: i8,
    p1: u16,
    p2: i16,
    p3: i8,
    p4: i16,
    p5: i16,
    p6: i8,
    p7: i8,
    p8: i16,
    p9: i16,
    p10: u8,
    h1: u16,
    h2: u16,
    h3: i8,
    h4: i8,
    h5: i8,
    h6: u8,
    h7: i8,
    gh1: i8,
    gh2: i16,
    gh3: i8,
    res_heat_range: u8,
    res_heat_val: i8,
    range_sw_err: i8,
}

impl CalibCoeffs {
    /// Decode the concatenation of the 0x89 and 0xE1 coefficient blocks.
    fn decode(c: &[u8; COEFF1_LEN + COEFF2_LEN], heat_range: u8, heat_val: u8, sw_err: u8) -> Self {
        let u16le = |i: usize| u16::from_le_bytes([c[i], c[i + 1]]);
        let i16le = |i: usize| i16::from_le_bytes([c[i], c[i + 1]]);
        Self {
            t1: u16le(33),
            t2: i16le(1),
            t3: c[3] as i8,
            p1: u16le(5),
            p2: i16le(7),
            p3: c[9] as i8,
            p4: i16le(11),
            p5: i16le(13),
            p6: c[16] as i8,
            p7: c[15] as i8,
            p8: i16le(19),
            p9: i16le(21),
            p10: c[23],
            h1: (u16::from(c[27]) << 4) | u16::from(c[26] & 0x0F),
            h2: (u16::from(c[25]) << 4) | u16::from(c[26] >> 4),
            h3: c[28] as i8,
            h4: c[29] as i8,
            h5: c[30] as i8,
            h6: c[31],
            h7: c[32] as i8,
            gh1: c[37] as i8,
            gh2: i16le(35),
            gh3: c[38] as i8,
            res_heat_range: (heat_range & 0x30) >> 4,
            res_heat_val: heat_val as i8,
            range_sw_err: ((sw_err as i8) & (0xF0u8 as i8)) / 16,
        }
    }
}

/// Unpacked field-0 data block.
#[derive(Debug, Clone, Copy)]
struct FieldData {
    temp_adc: u32,
    pres_adc: u32,
    hum_adc: u16,
    gas_adc: u16,
    gas_range: u8,
    gas_valid: bool,
    heat_stable: bool,
}

impl FieldData {
    fn parse(b: &[u8; FIELD_LEN]) -> Self {
        let adc20 = |i: usize| {
            (u32::from(b[i]) << 12) | (u32::from(b[i + 1]) << 4) | (u32::from(b[i + 2]) >> 4)
        };
        Self {
            pres_adc: adc20(2),
            temp_adc: adc20(5),
            hum_adc: (u16::from(b[8]) << 8) | u16::from(b[9]),
            gas_adc: (u16::from(b[13]) << 2) | (u16::from(b[14]) >> 6),
            gas_range: b[14] & 0x0F,
            gas_valid: b[14] & GAS_VALID != 0,
            heat_stable: b[14] & HEAT_STAB != 0,
        }
    }
}

pub struct Bme680<B> {
    bus: B,
    address: u8,
    coeffs: CalibCoeffs,
    settings: DeviceSettings,
}

impl<B: RegisterBus> Bme680<B> {
    /// Probe the primary then the secondary address and initialise the first
    /// device that answers with the BME680 chip id.
    ///
    /// `connect` opens a bus handle bound to one address. `HwError::NotFound`
    /// is returned when no address yields a device.
    pub fn open<F>(mut connect: F, settings: DeviceSettings) -> Result<Self>
    where
        F: FnMut(u8) -> Result<B>,
    {
        for address in [ADDR_PRIMARY, ADDR_SECONDARY] {
            let bus = match connect(address) {
                Ok(bus) => bus,
                Err(e) => {
                    debug!(address, error = %e, "bme680 bus open failed");
                    continue;
                }
            };
            match Self::with_bus(bus, address, settings.clone()) {
                Ok(dev) => return Ok(dev),
                Err(e) => debug!(address, error = %e, "bme680 probe failed"),
            }
        }
        Err(HwError::NotFound)
    }

    /// Initialise a device on an already-addressed bus.
    pub fn with_bus(mut bus: B, address: u8, settings: DeviceSettings) -> Result<Self> {
        if settings.heater_profile > MAX_HEATER_PROFILE {
            return Err(HwError::InvalidSettings("heater profile must be 0..=9"));
        }
        let id = read_u8(&mut bus, reg::CHIP_ID)?;
        if id != CHIP_ID {
            return Err(HwError::InvalidChipId { address, id });
        }
        bus.write_reg(reg::SOFT_RESET, SOFT_RESET_CMD)?;
        std::thread::sleep(Duration::from_millis(10));

        let mut raw = [0u8; COEFF1_LEN + COEFF2_LEN];
        bus.read_regs(reg::COEFF1, &mut raw[..COEFF1_LEN])?;
        bus.read_regs(reg::COEFF2, &mut raw[COEFF1_LEN..])?;
        let heat_range = read_u8(&mut bus, reg::RES_HEAT_RANGE)?;
        let heat_val = read_u8(&mut bus, reg::RES_HEAT_VAL)?;
        let sw_err = read_u8(&mut bus, reg::RANGE_SW_ERR)?;
        let coeffs = CalibCoeffs::decode(&raw, heat_range, heat_val, sw_err);

        let mut dev = Self {
            bus,
            address,
            coeffs,
            settings,
        };
        dev.configure()?;
        debug!(address, "bme680 initialised");
        Ok(dev)
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn settings(&self) -> &DeviceSettings {
        &self.settings
    }

    /// Give the bus handle back.
    pub fn release(self) -> B {
        self.bus
    }

    fn configure(&mut self) -> Result<()> {
        let s = &self.settings;
        let profile = s.heater_profile;
        let ctrl_meas = (s.temperature_os.bits() << 5) | (s.pressure_os.bits() << 2);
        let res_heat = heater_resistance(&self.coeffs, s.heater_temp_c, AMBIENT_DEFAULT_C);
        let gas_wait = heater_duration(s.heater_duration_ms);
        let filter = s.filter.bits() << 2;
        let hum = s.humidity_os.bits();

        // ctrl_hum only latches on the following ctrl_meas write
        self.bus.write_reg(reg::CTRL_HUM, hum)?;
        self.bus.write_reg(reg::CTRL_MEAS, ctrl_meas)?;
        self.bus.write_reg(reg::CONFIG, filter)?;
        self.bus.write_reg(reg::RES_HEAT0 + profile, res_heat)?;
        self.bus.write_reg(reg::GAS_WAIT0 + profile, gas_wait)?;
        self.bus.write_reg(reg::CTRL_GAS0, 0x00)?;
        self.bus.write_reg(reg::CTRL_GAS1, RUN_GAS | profile)?;
        Ok(())
    }

    /// Run one forced-mode conversion and return the compensated sample.
    pub fn measure(&mut self) -> Result<RawSample> {
        let s = &self.settings;
        let ctrl_meas = (s.temperature_os.bits() << 5) | (s.pressure_os.bits() << 2) | MODE_FORCED;
        let timeout = s.measure_timeout;
        self.bus.write_reg(reg::CTRL_MEAS, ctrl_meas)?;

        let bus = &mut self.bus;
        wait_until_with_timeout(
            || Ok(read_u8(bus, reg::FIELD0)? & NEW_DATA != 0),
            timeout,
            Duration::from_millis(10),
        )?;

        let mut block = [0u8; FIELD_LEN];
        self.bus.read_regs(reg::FIELD0, &mut block)?;
        let field = FieldData::parse(&block);
        trace!(
            temp_adc = field.temp_adc,
            pres_adc = field.pres_adc,
            hum_adc = field.hum_adc,
            gas_adc = field.gas_adc,
            gas_range = field.gas_range,
            "bme680 raw field"
        );

        let c = &self.coeffs;
        let (t_fine, temperature) = compensate_temperature(c, field.temp_adc);
        let pressure = compensate_pressure(c, field.pres_adc, t_fine) / 100.0;
        let humidity = compensate_humidity(c, field.hum_adc, t_fine);
        let gas_resistance = compensate_gas(c, field.gas_adc, field.gas_range);

        Ok(RawSample {
            temperature,
            pressure,
            humidity,
            gas_resistance,
            heat_stable: field.gas_valid && field.heat_stable,
        })
    }
}

impl<B: RegisterBus> GasSensor for Bme680<B> {
    fn poll(&mut self) -> std::result::Result<RawSample, Box<dyn std::error::Error + Send + Sync>> {
        self.measure().map_err(Into::into)
    }
}

fn read_u8<B: RegisterBus + ?Sized>(bus: &mut B, reg: u8) -> Result<u8> {
    let mut b = [0u8; 1];
    bus.read_regs(reg, &mut b)?;
    Ok(b[0])
}

/// Returns `(t_fine, °C)`.
fn compensate_temperature(c: &CalibCoeffs, temp_adc: u32) -> (f64, f64) {
    let adc = f64::from(temp_adc);
    let t1 = f64::from(c.t1);
    let var1 = ((adc / 16384.0) - (t1 / 1024.0)) * f64::from(c.t2);
    let d = (adc / 131072.0) - (t1 / 8192.0);
    let var2 = (d * d) * (f64::from(c.t3) * 16.0);
    let t_fine = var1 + var2;
    (t_fine, t_fine / 5120.0)
}

/// Pascal.
fn compensate_pressure(c: &CalibCoeffs, pres_adc: u32, t_fine: f64) -> f64 {
    let mut var1 = (t_fine / 2.0) - 64000.0;
    let mut var2 = var1 * var1 * (f64::from(c.p6) / 131072.0);
    var2 += var1 * f64::from(c.p5) * 2.0;
    var2 = (var2 / 4.0) + (f64::from(c.p4) * 65536.0);
    var1 = (((f64::from(c.p3) * var1 * var1) / 16384.0) + (f64::from(c.p2) * var1)) / 524288.0;
    var1 = (1.0 + (var1 / 32768.0)) * f64::from(c.p1);
    if var1 == 0.0 {
        return 0.0;
    }
    let mut p = 1048576.0 - f64::from(pres_adc);
    p = ((p - (var2 / 4096.0)) * 6250.0) / var1;
    let var1 = (f64::from(c.p9) * p * p) / 2147483648.0;
    let var2 = p * (f64::from(c.p8) / 32768.0);
    let p256 = p / 256.0;
    let var3 = p256 * p256 * p256 * (f64::from(c.p10) / 131072.0);
    p + (var1 + var2 + var3 + (f64::from(c.p7) * 128.0)) / 16.0
}

/// Percent relative humidity, clamped to 0..=100.
fn compensate_humidity(c: &CalibCoeffs, hum_adc: u16, t_fine: f64) -> f64 {
    let temp = t_fine / 5120.0;
    let var1 = f64::from(hum_adc) - ((f64::from(c.h1) * 16.0) + ((f64::from(c.h3) / 2.0) * temp));
    let var2 = var1
        * ((f64::from(c.h2) / 262144.0)
            * (1.0
                + ((f64::from(c.h4) / 16384.0) * temp)
                + ((f64::from(c.h5) / 1048576.0) * temp * temp)));
    let var3 = f64::from(c.h6) / 16384.0;
    let var4 = f64::from(c.h7) / 2097152.0;
    let hum = var2 + ((var3 + (var4 * temp)) * var2 * var2);
    hum.clamp(0.0, 100.0)
}

/// Ohms.
fn compensate_gas(c: &CalibCoeffs, gas_adc: u16, gas_range: u8) -> f64 {
    let range = usize::from(gas_range & 0x0F);
    let var1 = 1340.0 + (5.0 * f64::from(c.range_sw_err));
    let var2 = var1 * (1.0 + GAS_K1_RANGE[range] / 100.0);
    let var3 = 1.0 + (GAS_K2_RANGE[range] / 100.0);
    1.0 / (var3 * 0.000000125 * f64::from(1u32 << range) * (((f64::from(gas_adc) - 512.0) / var2) + 1.0))
}

/// Heater set-point register value for a target temperature.
pub(crate) fn heater_resistance(c: &CalibCoeffs, target_c: u16, ambient_c: f64) -> u8 {
    let target = f64::from(target_c.min(400));
    let var1 = (f64::from(c.gh1) / 16.0) + 49.0;
    let var2 = ((f64::from(c.gh2) / 32768.0) * 0.0005) + 0.00235;
    let var3 = f64::from(c.gh3) / 1024.0;
    let var4 = var1 * (1.0 + (var2 * target));
    let var5 = var4 + (var3 * ambient_c);
    let range = f64::from(c.res_heat_range);
    let res = 3.4
        * ((var5 * (4.0 / (4.0 + range)) * (1.0 / (1.0 + (f64::from(c.res_heat_val) * 0.002))))
            - 25.0);
    res.clamp(0.0, 255.0) as u8
}

/// Encode a heater duration as the 6-bit mantissa / 2-bit multiplier form.
pub(crate) fn heater_duration(ms: u16) -> u8 {
    if ms >= 0x0FC0 {
        return 0xFF;
    }
    let mut dur = ms;
    let mut factor: u8 = 0;
    while dur > 0x3F {
        dur /= 4;
        factor += 1;
    }
    (dur as u8) + factor * 64
}

#[cfg(feature = "hardware")]
pub mod i2c {
    //! `rppal` I2C transport for Raspberry Pi class hosts.

    use super::RegisterBus;
    use crate::error::{HwError, Result};
    use rppal::i2c::I2c;

    pub struct RppalBus {
        i2c: I2c,
    }

    impl RppalBus {
        /// Open `/dev/i2c-<bus>` and address `address`.
        pub fn open(bus: u8, address: u8) -> Result<Self> {
            let mut i2c = I2c::with_bus(bus).map_err(|e| HwError::I2c(e.to_string()))?;
            i2c.set_slave_address(u16::from(address))
                .map_err(|e| HwError::I2c(e.to_string()))?;
            Ok(Self { i2c })
        }
    }

    impl RegisterBus for RppalBus {
        fn read_regs(&mut self, reg: u8, buf: &mut [u8]) -> Result<()> {
            self.i2c
                .write_read(&[reg], buf)
                .map_err(|e| HwError::I2c(e.to_string()))
        }

        fn write_reg(&mut self, reg: u8, value: u8) -> Result<()> {
            self.i2c
                .write(&[reg, value])
                .map(|_| ())
                .map_err(|e| HwError::I2c(e.to_string()))
        }
    }
}
