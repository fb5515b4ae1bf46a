#![no_main]
use airsense_core::{AirQualityInput, BaselineWindow, ScoreWeights, air_quality_score};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, libfuzzer_sys::arbitrary::Arbitrary)]
struct Input {
    window: u8,
    gas: Vec<f64>,
    humidity: f64,
    current: f64,
}

fuzz_target!(|input: Input| {
    let mut w = BaselineWindow::new(usize::from(input.window));
    for g in &input.gas {
        w.push(*g);
    }
    assert!(w.len() <= w.capacity());
    let Some(baseline) = w.mean() else {
        return;
    };
    assert!(baseline.is_finite());

    let s = air_quality_score(
        AirQualityInput {
            humidity: input.humidity,
            gas_resistance: input.current,
            gas_baseline: baseline,
        },
        ScoreWeights::default(),
    );
    // In the nominal domain the score stays within 0..=100.
    if (0.0..=100.0).contains(&input.humidity)
        && baseline > 0.0
        && (0.0..=1e9).contains(&input.current)
    {
        assert!((-1e-6..=100.0 + 1e-6).contains(&s), "score {s}");
    }
});
