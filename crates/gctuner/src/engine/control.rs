//! Multi-signal control law for the target pacer ratio
//!
//! Three dimensionless factors centered on 1.0 are computed from the
//! current sample (pause latency, memory pressure, collection frequency),
//! averaged, then exponentially smoothed toward the neutral point before
//! scaling the current ratio.

use crate::config::TunerConfig;
use crate::models::Sample;

/// Weight of the combined factor versus the neutral point
const SMOOTHING_ALPHA: f64 = 0.3;

/// Pressure above which collections are forced more often
const HIGH_PRESSURE: f64 = 0.8;

/// Pressure below which the heap has room to grow
const LOW_PRESSURE: f64 = 0.4;

/// Collections per second considered too frequent
const HIGH_FREQUENCY: f64 = 2.0;

/// Collections per second considered rare
const LOW_FREQUENCY: f64 = 0.1;

/// Compute the ratio the control law would like to move to.
///
/// The result is unclamped and not rate-limited; the caller applies the
/// gates.
pub fn target_ratio(sample: &Sample, config: &TunerConfig) -> i64 {
    let aggressiveness = config.aggressiveness;
    let pause = sample.gc_pause.as_secs_f64();
    let target = config.target_pause.as_secs_f64();

    // Pause over target pushes the ratio up so collections run less often;
    // headroom pulls it gently down at half the gain. No pauses observed
    // yet means no latency signal at all.
    let latency_factor = if pause > target {
        1.0 + (pause / target - 1.0) * aggressiveness
    } else if pause > 0.0 {
        1.0 - (target / pause - 1.0) * aggressiveness * 0.5
    } else {
        1.0
    };

    let pressure = sample.memory_pressure;
    let memory_factor = if pressure > HIGH_PRESSURE {
        1.0 - (pressure - HIGH_PRESSURE) * 2.0 * aggressiveness
    } else if pressure < LOW_PRESSURE {
        1.0 + (LOW_PRESSURE - pressure) * 1.5 * aggressiveness
    } else {
        1.0
    };

    let frequency = sample.gc_frequency;
    let frequency_factor = if frequency > HIGH_FREQUENCY {
        1.0 + (frequency - HIGH_FREQUENCY) * 0.1 * aggressiveness
    } else if frequency < LOW_FREQUENCY {
        1.0 - (LOW_FREQUENCY - frequency) * 0.5 * aggressiveness
    } else {
        1.0
    };

    let combined = (latency_factor + memory_factor + frequency_factor) / 3.0;
    let smoothed = SMOOTHING_ALPHA * combined + (1.0 - SMOOTHING_ALPHA);

    (sample.gc_ratio as f64 * smoothed).floor() as i64
}
