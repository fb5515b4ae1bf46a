use airsense_core::scoring::round2;
use airsense_core::{AirQualityInput, ScoreWeights, air_quality_score};
use proptest::prelude::*;
use rstest::rstest;

fn score(humidity: f64, gas_resistance: f64, gas_baseline: f64) -> f64 {
    air_quality_score(
        AirQualityInput {
            humidity,
            gas_resistance,
            gas_baseline,
        },
        ScoreWeights::default(),
    )
}

#[test]
fn optimal_humidity_at_baseline_scores_100() {
    assert_eq!(score(50.0, 250_000.0, 250_000.0), 100.0);
}

#[rstest]
#[case(250_000.0)]
#[case(250_001.0)]
#[case(9_000_000.0)]
fn gas_term_is_constant_at_or_above_baseline(#[case] gas: f64) {
    // Humidity at the optimum contributes the full 25 points.
    assert_eq!(score(50.0, gas, 250_000.0) - 25.0, 75.0);
}

#[rstest]
#[case(100.0, 125_000.0, 250_000.0, 37.5)]
#[case(40.0, 250_000.0, 250_000.0, 95.0)]
#[case(60.0, 250_000.0, 250_000.0, 95.0)]
#[case(50.0, 0.0, 250_000.0, 25.0)]
fn documented_values(
    #[case] humidity: f64,
    #[case] gas: f64,
    #[case] baseline: f64,
    #[case] expected: f64,
) {
    assert!((score(humidity, gas, baseline) - expected).abs() < 1e-9);
}

#[rstest]
#[case(0.0, 75.0)]
#[case(-20.0, 65.0)]
#[case(150.0, 50.0)]
#[case(200.0, 25.0)]
fn out_of_range_humidity_is_not_clamped(#[case] humidity: f64, #[case] expected: f64) {
    assert!((score(humidity, 300_000.0, 250_000.0) - expected).abs() < 1e-9);
}

#[test]
fn negative_scores_are_reported_as_is() {
    // 200 %RH costs 50 points on the humidity side and zero gas adds nothing.
    let s = score(200.0, 0.0, 250_000.0);
    assert!((s - (-50.0)).abs() < 1e-9);
}

#[test]
fn display_rounding_is_two_decimals() {
    let s = score(47.3, 212_345.0, 250_000.0);
    assert_eq!(round2(s), (s * 100.0).round() / 100.0);
    assert_eq!(format!("{:.2}", round2(87.414_9)), "87.41");
}

proptest! {
    #[test]
    fn nominal_inputs_score_within_0_100(
        humidity in 0.0f64..=100.0,
        gas in 0.0f64..2_000_000.0,
        baseline in 1.0f64..2_000_000.0,
    ) {
        let s = score(humidity, gas, baseline);
        prop_assert!((-1e-9..=100.0 + 1e-9).contains(&s), "score {s}");
    }

    #[test]
    fn gas_at_or_above_baseline_ignores_resistance(
        humidity in 0.0f64..=100.0,
        baseline in 1.0f64..1_000_000.0,
        extra_a in 0.0f64..1_000_000.0,
        extra_b in 0.0f64..1_000_000.0,
    ) {
        let a = score(humidity, baseline + extra_a, baseline);
        let b = score(humidity, baseline + extra_b, baseline);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn score_grows_with_gas_below_baseline(
        humidity in 0.0f64..=100.0,
        baseline in 1000.0f64..1_000_000.0,
        lo in 0.0f64..0.5,
        hi in 0.5f64..1.0,
    ) {
        let low = score(humidity, baseline * lo, baseline);
        let high = score(humidity, baseline * hi, baseline);
        prop_assert!(high >= low);
    }
}
