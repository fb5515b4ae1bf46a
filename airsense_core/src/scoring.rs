//! Composite air-quality score from humidity and gas resistance.
//!
//! The score is a weighted sum of a humidity term (distance from an optimal
//! humidity) and a gas term (resistance relative to the clean-air baseline).
//! With the default 25:75 weighting, a reading at 50 %RH with gas resistance
//! at or above the baseline scores exactly 100. The result is not clamped:
//! humidity outside 0..=100 %RH yields scores outside the nominal range.

/// Inputs for one score computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AirQualityInput {
    /// Relative humidity, percent.
    pub humidity: f64,
    /// Current gas resistance, ohms.
    pub gas_resistance: f64,
    /// Clean-air baseline from calibration, ohms.
    pub gas_baseline: f64,
}

/// Scoring constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    /// Optimal indoor humidity, %RH.
    pub humidity_baseline: f64,
    /// Share of the score driven by humidity, 0.0..=1.0.
    pub humidity_weight: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            humidity_baseline: 50.0,
            humidity_weight: 0.25,
        }
    }
}

/// Compute the air-quality score. Pure; never fails.
pub fn air_quality_score(input: AirQualityInput, weights: ScoreWeights) -> f64 {
    let hum_base = weights.humidity_baseline;
    let hum_points = weights.humidity_weight * 100.0;
    let gas_points = 100.0 - hum_points;

    let hum_offset = input.humidity - hum_base;
    let hum_score = if hum_offset > 0.0 {
        (100.0 - hum_base - hum_offset) / (100.0 - hum_base) * hum_points
    } else {
        (hum_base + hum_offset) / hum_base * hum_points
    };

    let gas_offset = input.gas_baseline - input.gas_resistance;
    let gas_score = if gas_offset > 0.0 {
        (input.gas_resistance / input.gas_baseline) * gas_points
    } else {
        gas_points
    };

    hum_score + gas_score
}

/// Round to two decimals for display.
#[inline]
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
