//! Bus failure propagation and recovery

use mpu6050::{ChipSelector, Engine, Error};

use crate::common::{create_configured_driver, create_mock_driver, MockDelay, MockError};

#[test]
fn read_failure_propagates_from_a_poll_tick() {
    let mut fixture = create_configured_driver();
    let mut delay = MockDelay;
    fixture
        .driver
        .set_engine(Engine::Accel, true, &mut delay)
        .expect("accel enable");

    fixture.interface.fail_next_read();
    let result = fixture.driver.poll_accel_once();
    assert!(
        matches!(result, Err(Error::Bus(MockError::Communication))),
        "a tick surfaces the raw bus error, got {result:?}"
    );
    assert!(
        fixture.sink.accel_samples().is_empty(),
        "a failed tick must not publish anything"
    );
}

#[test]
fn failure_injection_is_one_shot() {
    let mut fixture = create_configured_driver();
    let mut delay = MockDelay;
    fixture
        .driver
        .set_engine(Engine::Accel, true, &mut delay)
        .expect("accel enable");
    fixture.interface.set_accel_data([4, 8, 12]);

    fixture.interface.fail_next_read();
    assert!(fixture.driver.poll_accel_once().is_err());
    fixture
        .driver
        .poll_accel_once()
        .expect("the tick after an injected failure recovers");
    assert_eq!(fixture.sink.accel_samples(), vec![[1, 2, 3]]);
}

#[test]
fn identify_surfaces_a_bus_failure() {
    let mut fixture = create_mock_driver();
    let mut delay = MockDelay;
    fixture.driver.power_on(&mut delay).expect("power on");

    fixture.interface.fail_next_write();
    let result = fixture.driver.identify(ChipSelector::Auto);
    assert!(matches!(result, Err(Error::Bus(MockError::Communication))));
    assert_eq!(fixture.driver.variant(), None);
}

#[test]
fn failed_interval_write_keeps_the_old_interval() {
    let mut fixture = create_configured_driver();

    fixture.interface.fail_next_write();
    let result = fixture.driver.set_poll_interval(Engine::Accel, 100);
    assert!(matches!(result, Err(Error::Bus(MockError::Communication))));
    assert_eq!(
        fixture.driver.poll_interval(Engine::Accel),
        200,
        "the cached interval only moves once the divider write sticks"
    );

    fixture
        .driver
        .set_poll_interval(Engine::Accel, 100)
        .expect("retry after the one-shot failure");
    assert_eq!(fixture.driver.poll_interval(Engine::Accel), 100);
}

#[test]
fn gyro_tick_failure_leaves_stored_state_alone() {
    use core::sync::atomic::Ordering;

    let mut fixture = create_configured_driver();
    let mut delay = MockDelay;
    fixture
        .driver
        .set_engine(Engine::Gyro, true, &mut delay)
        .expect("gyro enable");
    fixture.interface.set_gyro_data([100, 0, 0]);
    fixture.driver.poll_gyro_once().expect("good tick");
    let before = fixture.driver.axis().rx.load(Ordering::Relaxed);

    fixture.interface.fail_next_read();
    assert!(fixture.driver.poll_gyro_once().is_err());

    assert_eq!(
        fixture.driver.axis().rx.load(Ordering::Relaxed),
        before,
        "a failed read must not clobber the last good sample"
    );
}
