//! Direction-reversal detection over recent decisions
//!
//! If the last few decisions moved the ratio in both directions inside
//! the stabilization window, the controller is chasing its own tail and
//! the current tick must not act.

use crate::history::TunerHistory;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Number of recent decisions inspected for an alternating pattern
const SPAN: usize = 4;

/// Report whether the last four decisions show a direction reversal
/// within the stabilization window.
pub fn is_oscillating(history: &TunerHistory, window: Duration, now: DateTime<Utc>) -> bool {
    let decisions = history.decisions();
    if decisions.len() < SPAN {
        return false;
    }

    let recent: Vec<_> = decisions.tail(SPAN).collect();
    let raises = recent.iter().filter(|d| d.new_ratio > d.old_ratio).count();
    let lowers = recent.len() - raises;
    if raises == 0 || lowers == 0 {
        return false;
    }

    // Both directions present; suppress only while the pattern is recent.
    let oldest = recent[0].timestamp;
    match (now - oldest).to_std() {
        Ok(age) => age < window,
        // A decision stamped in the future counts as inside the window.
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Decision, Sample};
    use chrono::TimeDelta;

    fn sample() -> Sample {
        Sample {
            timestamp: Utc::now(),
            gc_pause: Duration::from_millis(10),
            gc_count: 0,
            gc_frequency: 1.0,
            heap_sys_bytes: 0,
            heap_alloc_bytes: 0,
            heap_inuse_bytes: 0,
            next_gc_bytes: 0,
            gc_ratio: 100,
            container_memory_limit: 0,
            container_cpu_limit: 0.0,
            memory_pressure: 0.5,
        }
    }

    fn decision(old_ratio: i64, new_ratio: i64, age_ms: i64, now: DateTime<Utc>) -> Decision {
        Decision {
            old_ratio,
            new_ratio,
            reason: String::new(),
            confidence: 1.0,
            timestamp: now - TimeDelta::milliseconds(age_ms),
            sample: sample(),
        }
    }

    fn window() -> Duration {
        Duration::from_secs(1)
    }

    #[test]
    fn test_alternating_inside_window_oscillates() {
        let now = Utc::now();
        let mut history = TunerHistory::new();
        history.push_decision(decision(100, 150, 800, now));
        history.push_decision(decision(150, 100, 600, now));
        history.push_decision(decision(100, 150, 400, now));
        history.push_decision(decision(150, 100, 200, now));

        assert!(is_oscillating(&history, window(), now));
    }

    #[test]
    fn test_alternating_outside_window_is_fine() {
        let now = Utc::now();
        let mut history = TunerHistory::new();
        history.push_decision(decision(100, 150, 5_000, now));
        history.push_decision(decision(150, 100, 4_000, now));
        history.push_decision(decision(100, 150, 3_000, now));
        history.push_decision(decision(150, 100, 2_000, now));

        assert!(!is_oscillating(&history, window(), now));
    }

    #[test]
    fn test_consistent_direction_is_fine() {
        let now = Utc::now();
        let mut history = TunerHistory::new();
        history.push_decision(decision(100, 150, 800, now));
        history.push_decision(decision(150, 200, 600, now));
        history.push_decision(decision(200, 250, 400, now));
        history.push_decision(decision(250, 300, 200, now));

        assert!(!is_oscillating(&history, window(), now));
    }

    #[test]
    fn test_too_few_decisions_never_oscillates() {
        let now = Utc::now();
        let mut history = TunerHistory::new();
        history.push_decision(decision(100, 150, 300, now));
        history.push_decision(decision(150, 100, 200, now));
        history.push_decision(decision(100, 150, 100, now));

        assert!(!is_oscillating(&history, window(), now));
    }

    #[test]
    fn test_only_last_four_are_inspected() {
        let now = Utc::now();
        let mut history = TunerHistory::new();
        // An old reversal followed by four recent raises.
        history.push_decision(decision(150, 100, 900, now));
        history.push_decision(decision(100, 150, 800, now));
        history.push_decision(decision(150, 200, 600, now));
        history.push_decision(decision(200, 250, 400, now));
        history.push_decision(decision(250, 300, 200, now));

        assert!(!is_oscillating(&history, window(), now));
    }
}
