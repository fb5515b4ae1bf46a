//! BME680 init and forced-mode measurement against an in-memory register map.
//!
//! Coefficients and ADC words below are taken from a bench device dump; the
//! expected compensated values come from the Bosch floating-point reference.

use std::sync::{Arc, Mutex};

use airsense_hardware::bme680::{ADDR_PRIMARY, ADDR_SECONDARY};
use airsense_hardware::{Bme680, DeviceSettings, HwError, RegisterBus};
use airsense_traits::GasSensor;
use rstest::rstest;

const COEFF1: [u8; 25] = [
    0x00, 0xfc, 0x66, 0x03, 0x00, 0xa6, 0x8d, 0x75, 0xd7, 0x58, 0x00, 0x38, 0x1a, 0xad, 0xff,
    0x2d, 0x1e, 0x00, 0x00, 0x5e, 0xf5, 0xd6, 0xf2, 0x1e, 0x00,
];
const COEFF2: [u8; 16] = [
    0x3f, 0x86, 0x30, 0x00, 0x2d, 0x14, 0x78, 0x9c, 0x23, 0x66, 0x59, 0xcf, 0xdf, 0x12, 0x00,
    0x00,
];

#[derive(Clone)]
struct FakeBus {
    regs: Arc<Mutex<[u8; 256]>>,
    writes: Arc<Mutex<Vec<(u8, u8)>>>,
}

impl FakeBus {
    fn bench_device() -> Self {
        let mut regs = [0u8; 256];
        regs[0xD0] = 0x61;
        regs[0x89..0x89 + 25].copy_from_slice(&COEFF1);
        regs[0xE1..0xE1 + 16].copy_from_slice(&COEFF2);
        regs[0x02] = 0x10; // res_heat_range = 1
        regs[0x00] = 44; // res_heat_val
        regs[0x04] = 0x00;
        // pressure 300000, temperature 500000, humidity 22000
        regs[0x1F..=0x21].copy_from_slice(&[0x49, 0x3e, 0x00]);
        regs[0x22..=0x24].copy_from_slice(&[0x7a, 0x12, 0x00]);
        regs[0x25..=0x26].copy_from_slice(&[0x55, 0xf0]);
        // gas adc 300, range 5, gas valid + heat stable
        regs[0x2A] = 0x4b;
        regs[0x2B] = 0x35;
        Self {
            regs: Arc::new(Mutex::new(regs)),
            writes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn set(&self, reg: u8, value: u8) {
        self.regs.lock().unwrap()[reg as usize] = value;
    }

    fn last_write(&self, reg: u8) -> Option<u8> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(r, _)| *r == reg)
            .map(|(_, v)| *v)
    }
}

impl RegisterBus for FakeBus {
    fn read_regs(&mut self, reg: u8, buf: &mut [u8]) -> airsense_hardware::error::Result<()> {
        let regs = self.regs.lock().unwrap();
        let start = reg as usize;
        buf.copy_from_slice(&regs[start..start + buf.len()]);
        Ok(())
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> airsense_hardware::error::Result<()> {
        self.writes.lock().unwrap().push((reg, value));
        if reg == 0xE0 {
            return Ok(());
        }
        let mut regs = self.regs.lock().unwrap();
        regs[reg as usize] = value;
        // A forced-mode trigger completes a conversion immediately.
        if reg == 0x74 && value & 0x03 == 0x01 {
            regs[0x1D] |= 0x80;
        }
        Ok(())
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * b.abs().max(1.0)
}

#[test]
fn init_applies_default_device_settings() {
    let bus = FakeBus::bench_device();
    let probe = bus.clone();
    let dev = Bme680::with_bus(bus, ADDR_PRIMARY, DeviceSettings::default()).expect("init");
    assert_eq!(dev.address(), ADDR_PRIMARY);

    assert_eq!(probe.last_write(0xE0), Some(0xB6), "soft reset");
    assert_eq!(probe.last_write(0x72), Some(0x02), "humidity 2x");
    assert_eq!(probe.last_write(0x74), Some(0x8C), "temp 8x, pressure 4x, sleep");
    assert_eq!(probe.last_write(0x75), Some(0x08), "filter size 3");
    assert_eq!(probe.last_write(0x5A), Some(114), "heater 320C");
    assert_eq!(probe.last_write(0x64), Some(101), "heater 150ms");
    assert_eq!(probe.last_write(0x71), Some(0x10), "run gas, profile 0");
}

#[test]
fn measure_compensates_bench_values() {
    let bus = FakeBus::bench_device();
    let mut dev = Bme680::with_bus(bus, ADDR_PRIMARY, DeviceSettings::default()).expect("init");
    let s = dev.poll().expect("sample");

    assert!(close(s.temperature, 25.664_246_504_148_47), "{}", s.temperature);
    assert!(close(s.pressure, 1_103.686_120_024_949_3), "{}", s.pressure);
    assert!(close(s.humidity, 50.303_629_414_555_544), "{}", s.humidity);
    assert!(close(s.gas_resistance, 295_482.314_628_392_6), "{}", s.gas_resistance);
    assert!(s.heat_stable);
}

#[rstest]
#[case(0x25, false)] // gas valid, heater not stable
#[case(0x15, false)] // heater stable, gas not valid
#[case(0x35, true)]
fn heat_stable_follows_status_bits(#[case] gas_lsb: u8, #[case] expected: bool) {
    let bus = FakeBus::bench_device();
    bus.set(0x2B, gas_lsb);
    let mut dev = Bme680::with_bus(bus, ADDR_PRIMARY, DeviceSettings::default()).expect("init");
    assert_eq!(dev.measure().expect("sample").heat_stable, expected);
}

#[test]
fn open_falls_back_to_secondary_address() {
    let dev = Bme680::open(
        |address| {
            let bus = FakeBus::bench_device();
            if address == ADDR_PRIMARY {
                // some other chip answers on the primary address
                bus.set(0xD0, 0x58);
            }
            Ok(bus)
        },
        DeviceSettings::default(),
    )
    .expect("secondary address");
    assert_eq!(dev.address(), ADDR_SECONDARY);
}

#[test]
fn open_reports_not_found_when_no_address_answers() {
    let err = Bme680::<FakeBus>::open(
        |_| Err(HwError::I2c("no ack".into())),
        DeviceSettings::default(),
    )
    .err()
    .expect("no device");
    assert!(matches!(err, HwError::NotFound), "{err:?}");
}

#[test]
fn invalid_chip_id_is_rejected() {
    let bus = FakeBus::bench_device();
    bus.set(0xD0, 0x00);
    let err = Bme680::with_bus(bus, ADDR_PRIMARY, DeviceSettings::default())
        .err()
        .expect("bad id");
    assert!(matches!(err, HwError::InvalidChipId { id: 0x00, .. }), "{err:?}");
}

#[test]
fn heater_profile_out_of_range_is_rejected() {
    let settings = DeviceSettings {
        heater_profile: 10,
        ..DeviceSettings::default()
    };
    let err = Bme680::with_bus(FakeBus::bench_device(), ADDR_PRIMARY, settings)
        .err()
        .expect("bad profile");
    assert!(matches!(err, HwError::InvalidSettings(_)));
}

#[test]
fn measurement_times_out_without_new_data() {
    struct StuckBus(FakeBus);
    impl RegisterBus for StuckBus {
        fn read_regs(&mut self, reg: u8, buf: &mut [u8]) -> airsense_hardware::error::Result<()> {
            self.0.read_regs(reg, buf)
        }
        fn write_reg(&mut self, reg: u8, value: u8) -> airsense_hardware::error::Result<()> {
            // swallow the forced-mode trigger so no data ever arrives
            if reg == 0x74 {
                return Ok(());
            }
            self.0.write_reg(reg, value)
        }
    }

    let settings = DeviceSettings {
        measure_timeout: std::time::Duration::from_millis(30),
        ..DeviceSettings::default()
    };
    let mut dev =
        Bme680::with_bus(StuckBus(FakeBus::bench_device()), ADDR_PRIMARY, settings).expect("init");
    let err = dev.measure().expect_err("timeout");
    assert!(matches!(err, HwError::Timeout));
}
