//! Recorder thread lifecycle: immediate first record, cadence, clean shutdown.

use std::sync::Arc;
use std::time::{Duration, Instant};

use airsense_core::mocks::{MemorySink, NoopSensor, ScriptedSensor, sample};
use airsense_core::{EngineError, Recorder, SensorEngine, StorageCfg};

fn wait_for(mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn first_record_is_taken_immediately() {
    let engine = Arc::new(
        SensorEngine::builder()
            .with_sensor(ScriptedSensor::repeating(sample(1000.0)))
            .build()
            .expect("engine"),
    );
    let sink = MemorySink::new();
    let recorder =
        Recorder::spawn(engine, sink.clone(), Duration::from_secs(600)).expect("spawn");

    wait_for(|| recorder.stored() >= 1);
    assert_eq!(recorder.stored(), 1);

    // Drop interrupts the ten-minute wait.
    let t0 = Instant::now();
    drop(recorder);
    assert!(t0.elapsed() < Duration::from_secs(2));

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].temperature, 25.0);
    assert_eq!(records[0].humidity, 50.0);
}

#[test]
fn records_at_the_configured_cadence() {
    let engine = Arc::new(
        SensorEngine::builder()
            .with_sensor(ScriptedSensor::repeating(sample(1000.0)))
            .build()
            .expect("engine"),
    );
    let sink = MemorySink::new();
    let recorder = Recorder::spawn(engine, sink.clone(), Duration::from_millis(20)).expect("spawn");
    wait_for(|| recorder.stored() >= 3);
    drop(recorder);

    let records = sink.records();
    assert!(records.len() >= 3);
    assert!(records.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[test]
fn sink_errors_do_not_stop_the_loop() {
    let sensor = ScriptedSensor::repeating(sample(1000.0));
    let calls = sensor.calls();
    let engine = Arc::new(
        SensorEngine::builder()
            .with_sensor(sensor)
            .build()
            .expect("engine"),
    );
    let recorder =
        Recorder::spawn(engine, MemorySink::failing(), Duration::from_millis(10)).expect("spawn");
    wait_for(|| calls.load(std::sync::atomic::Ordering::SeqCst) >= 3);
    assert_eq!(recorder.stored(), 0);
    assert!(calls.load(std::sync::atomic::Ordering::SeqCst) >= 3);
}

#[test]
fn drop_stops_a_recorder_stuck_retrying() {
    let engine = Arc::new(
        SensorEngine::builder()
            .with_sensor(NoopSensor)
            .with_storage(StorageCfg {
                retry_initial: Duration::from_millis(5),
                retry_max: Duration::from_millis(20),
            })
            .build()
            .expect("engine"),
    );
    let sink = MemorySink::new();
    let recorder = Recorder::spawn(engine, sink.clone(), Duration::from_millis(10)).expect("spawn");
    std::thread::sleep(Duration::from_millis(50));

    let t0 = Instant::now();
    drop(recorder);
    assert!(t0.elapsed() < Duration::from_secs(1));
    assert!(sink.records().is_empty());
}

#[test]
fn multiple_recorders_dont_leak_threads() {
    for _ in 0..10 {
        let engine = Arc::new(
            SensorEngine::builder()
                .with_sensor(ScriptedSensor::repeating(sample(1.0)))
                .build()
                .expect("engine"),
        );
        let recorder =
            Recorder::spawn(engine, MemorySink::new(), Duration::from_millis(5)).expect("spawn");
        std::thread::sleep(Duration::from_millis(2));
        drop(recorder);
    }
}

#[test]
fn zero_interval_is_rejected_before_spawning() {
    let sensor = ScriptedSensor::repeating(sample(1000.0));
    let calls = sensor.calls();
    let engine = Arc::new(
        SensorEngine::builder()
            .with_sensor(sensor)
            .build()
            .expect("engine"),
    );
    let sink = MemorySink::new();

    let err = Recorder::spawn(engine, sink.clone(), Duration::ZERO).err();
    assert!(matches!(err, Some(EngineError::Config(ref m)) if m.contains("interval")));
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert!(sink.records().is_empty());
}
