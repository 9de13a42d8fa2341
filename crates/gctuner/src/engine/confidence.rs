//! Evidence scoring for proposed ratio changes
//!
//! Confidence starts at 1.0 and is multiplied down for every sign that
//! the evidence is weak: short history, unstable pauses, a ratio pinned
//! near its bounds, or extreme memory pressure.

use crate::config::TunerConfig;
use crate::history::TunerHistory;
use crate::models::Sample;

/// Changes scoring below this are not applied
pub const MIN_CONFIDENCE: f64 = 0.6;

/// Samples needed before history is considered meaningful
const SHORT_HISTORY: usize = 5;

/// Pause coefficient-of-variation above which metrics count as unstable
const UNSTABLE_PAUSE_COV: f64 = 0.3;

/// Distance from a ratio bound inside which decisions are discounted
const BOUND_MARGIN: i64 = 20;

/// Score the evidence behind acting on `sample`.
pub fn estimate(sample: &Sample, history: &TunerHistory, config: &TunerConfig) -> f64 {
    let mut confidence = 1.0;

    if history.samples().len() < SHORT_HISTORY {
        confidence *= 0.7;
    }

    if history.samples().len() >= 3 {
        let pauses: Vec<f64> = history
            .samples()
            .tail(3)
            .map(|s| s.gc_pause.as_secs_f64())
            .collect();
        if coefficient_of_variation(&pauses) > UNSTABLE_PAUSE_COV {
            confidence *= 0.8;
        }
    }

    if sample.gc_ratio <= config.min_ratio + BOUND_MARGIN
        || sample.gc_ratio >= config.max_ratio - BOUND_MARGIN
    {
        confidence *= 0.9;
    }

    if sample.memory_pressure > 0.95 || sample.memory_pressure < 0.05 {
        confidence *= 0.8;
    }

    confidence
}

/// Population coefficient of variation (sigma over mu). Zero for fewer
/// than two values or a zero mean.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let mean = values.iter().sum::<f64>() / values.len() as f64;
    if mean.abs() < f64::EPSILON {
        return 0.0;
    }

    let variance = values
        .iter()
        .map(|v| (v - mean).powi(2))
        .sum::<f64>()
        / values.len() as f64;

    variance.sqrt() / mean
}
