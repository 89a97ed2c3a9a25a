//! Default configuration, reset polling and cached-configuration restore

use mpu6050::registers::{
    BIT_PWR_ACCEL_STBY, BIT_PWR_GYRO_STBY, INIT_FIFO_RATE, MPU_DLPF_42HZ,
};
use mpu6050::{
    AccelFullScale, ChipSelector, ConfigField, DeviceState, Engine, Error, GyroFullScale,
};

use crate::common::{create_configured_driver, create_mock_driver, MockDelay};

const SAMPLE_RATE_DIV: u8 = 0x19;
const LPF: u8 = 0x1A;
const GYRO_CONFIG: u8 = 0x1B;
const ACCEL_CONFIG: u8 = 0x1C;
const PWR_MGMT_2: u8 = 0x6C;

#[test]
fn init_defaults_programs_the_baseline() {
    let mut fixture = create_mock_driver();
    let mut delay = MockDelay;
    fixture.driver.power_on(&mut delay).expect("power on");
    fixture.driver.identify(ChipSelector::Auto).expect("identify");

    fixture
        .driver
        .init_defaults(&mut delay)
        .expect("default configuration should succeed");

    assert_eq!(fixture.interface.register(GYRO_CONFIG), 3 << 3, "gyro FSR 2000 dps");
    assert_eq!(fixture.interface.register(LPF), MPU_DLPF_42HZ);
    assert_eq!(fixture.interface.register(SAMPLE_RATE_DIV), 19, "50 Hz from the 1 kHz filtered rate");
    assert_eq!(fixture.interface.register(ACCEL_CONFIG), 2 << 3, "accel FS 8g");
    assert_eq!(fixture.driver.state(), DeviceState::Configured);

    let cfg = fixture.driver.config();
    assert_eq!(cfg.fsr, GyroFullScale::Dps2000);
    assert_eq!(cfg.lpf, MPU_DLPF_42HZ);
    assert_eq!(cfg.fifo_rate, INIT_FIFO_RATE);
    assert_eq!(cfg.accel_fs, AccelFullScale::G8);
    assert!(!cfg.accel_enable && !cfg.gyro_enable, "engines start off");
    assert!(!cfg.enable);
    assert!(!cfg.is_asleep);
}

#[test]
fn init_defaults_parks_both_engines_before_the_reset() {
    let mut fixture = create_mock_driver();
    let mut delay = MockDelay;
    fixture.driver.power_on(&mut delay).expect("power on");
    fixture.driver.identify(ChipSelector::Auto).expect("identify");
    fixture.interface.clear_operations();

    fixture.driver.init_defaults(&mut delay).expect("init defaults");

    let standby_writes = fixture.interface.writes_to(PWR_MGMT_2);
    assert_eq!(
        standby_writes.first(),
        Some(&BIT_PWR_GYRO_STBY),
        "gyro goes to standby first"
    );
    assert_eq!(
        standby_writes.get(1),
        Some(&(BIT_PWR_GYRO_STBY | BIT_PWR_ACCEL_STBY)),
        "then the accelerometer joins it"
    );
}

#[test]
fn init_defaults_requires_identification() {
    let mut fixture = create_mock_driver();
    let mut delay = MockDelay;
    fixture.driver.power_on(&mut delay).expect("power on");

    let result = fixture.driver.init_defaults(&mut delay);
    assert!(matches!(result, Err(Error::NotConfigured)));
}

#[test]
fn reset_poll_tolerates_a_slow_chip() {
    let mut fixture = create_mock_driver();
    let mut delay = MockDelay;
    fixture.driver.power_on(&mut delay).expect("power on");
    fixture.driver.identify(ChipSelector::Auto).expect("identify");

    // Reset bit stays visible for three polls, well inside the budget.
    fixture.interface.hold_reset(3);
    fixture
        .driver
        .init_defaults(&mut delay)
        .expect("a chip that clears the bit within budget must pass");
    assert_eq!(fixture.driver.state(), DeviceState::Configured);
}

#[test]
fn reset_poll_gives_up_after_the_retry_budget() {
    let mut fixture = create_mock_driver();
    let mut delay = MockDelay;
    fixture.driver.power_on(&mut delay).expect("power on");
    fixture.driver.identify(ChipSelector::Auto).expect("identify");

    fixture.interface.hold_reset(100);
    let result = fixture.driver.init_defaults(&mut delay);
    assert!(
        matches!(result, Err(Error::ResetTimeout)),
        "a stuck reset bit must surface as a timeout, got {result:?}"
    );
    assert_eq!(
        fixture.driver.state(),
        DeviceState::Identified,
        "a failed configuration leaves the lifecycle where it was"
    );
}

#[test]
fn restore_reapplies_the_cached_configuration() {
    let mut fixture = create_configured_driver();
    let mut delay = MockDelay;

    // Kill power so the next engine enable has to restore everything.
    fixture.driver.power_off(&mut delay).expect("power off");
    fixture.interface.set_register(GYRO_CONFIG, 0);
    fixture.interface.set_register(LPF, 0);
    fixture.interface.set_register(ACCEL_CONFIG, 0);
    fixture.interface.set_register(SAMPLE_RATE_DIV, 0);

    fixture
        .driver
        .set_engine(Engine::Accel, true, &mut delay)
        .expect("engine enable restores configuration");

    assert_eq!(fixture.interface.register(GYRO_CONFIG), 3 << 3);
    assert_eq!(fixture.interface.register(LPF), MPU_DLPF_42HZ);
    assert_eq!(fixture.interface.register(ACCEL_CONFIG), 2 << 3);
    assert_eq!(fixture.interface.register(SAMPLE_RATE_DIV), 19);
}

#[test]
fn restore_failure_names_the_field() {
    let mut fixture = create_configured_driver();
    let mut delay = MockDelay;
    fixture.driver.power_off(&mut delay).expect("power off");

    fixture.interface.fail_write_to(LPF);
    let result = fixture.driver.set_engine(Engine::Accel, true, &mut delay);
    assert!(
        matches!(
            result,
            Err(Error::ConfigWrite {
                field: ConfigField::Lpf,
                ..
            })
        ),
        "the failing restore write must name its field, got {result:?}"
    );
    assert!(
        !fixture.driver.config().accel_enable,
        "a failed restore must not mark the engine enabled"
    );
}

#[test]
fn lpa_freq_write_is_skipped_on_the_mpu6500() {
    let mut fixture = create_mock_driver();
    fixture.interface.set_who_am_i(0x70);
    let mut delay = MockDelay;
    fixture.driver.power_on(&mut delay).expect("power on");
    fixture.driver.identify(ChipSelector::Auto).expect("identify");
    fixture.interface.clear_operations();

    fixture.driver.init_defaults(&mut delay).expect("init defaults");

    let lpa_writes: Vec<u8> = fixture
        .interface
        .writes_to(PWR_MGMT_2)
        .into_iter()
        .filter(|value| value & 0xC0 != 0)
        .collect();
    assert!(
        lpa_writes.is_empty(),
        "only the MPU-6050 carries the wake-frequency field"
    );
}
