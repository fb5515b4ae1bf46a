use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use airsense_hardware::error::HwError;
use airsense_hardware::util::wait_until_with_timeout;

#[test]
fn wait_until_ready_success_path() {
    let ready = Arc::new(AtomicBool::new(false));
    let ready_bg = ready.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(3));
        ready_bg.store(true, Ordering::Relaxed);
    });

    let res = wait_until_with_timeout(
        || Ok(ready.load(Ordering::Relaxed)),
        Duration::from_millis(200),
        Duration::from_micros(200),
    );
    assert!(res.is_ok(), "expected success, got {res:?}");
}

#[test]
fn wait_until_ready_timeout_path() {
    let err = wait_until_with_timeout(
        || Ok(false),
        Duration::from_millis(5),
        Duration::from_micros(200),
    )
    .expect_err("expected timeout error");

    match err {
        HwError::Timeout => {}
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn predicate_error_aborts_wait() {
    let err = wait_until_with_timeout(
        || Err(HwError::I2c("nack".into())),
        Duration::from_secs(5),
        Duration::from_millis(1),
    )
    .expect_err("bus error");
    assert!(matches!(err, HwError::I2c(_)));
}
