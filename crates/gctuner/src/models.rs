//! Core data models for the pacer tuner

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One runtime telemetry sample, produced on every monitor tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    /// Mean of the most recent GC pauses (up to ten)
    pub gc_pause: Duration,
    /// Completed collections since process start
    pub gc_count: u64,
    /// Collections per second relative to the previous sample; zero on the
    /// first sample
    pub gc_frequency: f64,
    pub heap_sys_bytes: u64,
    pub heap_alloc_bytes: u64,
    pub heap_inuse_bytes: u64,
    /// Heap size at which the runtime will trigger the next collection
    pub next_gc_bytes: u64,
    /// Pacer ratio in effect when the sample was taken
    pub gc_ratio: i64,
    pub container_memory_limit: u64,
    pub container_cpu_limit: f64,
    /// Heap in use over the effective memory limit; zero when no limit is
    /// known
    pub memory_pressure: f64,
}

/// An applied change to the pacer ratio
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    /// Ratio the setter actually replaced
    pub old_ratio: i64,
    pub new_ratio: i64,
    /// Human-readable description of the triggers that fired
    pub reason: String,
    /// Evidence score in [0, 1]; changes below 0.6 are never applied
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
    /// The sample that caused this decision
    pub sample: Sample,
}

/// Container resource limits discovered at tuner construction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerResources {
    /// Whether any containerization signal fired
    pub containerized: bool,
    /// Memory limit in bytes; zero means no known limit
    pub memory_limit_bytes: u64,
    /// CPU limit in cores; zero means no known limit
    pub cpu_limit_cores: f64,
}

/// Current cgroup resource usage readings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerUsage {
    /// Current memory usage in bytes; zero when unreadable
    pub memory_usage_bytes: u64,
    /// Cumulative CPU time in seconds; zero when unreadable
    pub cpu_usage_secs: f64,
}

/// Aggregate tuner counters and state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TunerStats {
    pub total_decisions: u64,
    /// Reserved for a future revert-on-regression policy; stays zero
    pub reverted_tunes: u64,
    /// Consecutive ticks whose computed change was too small to act on
    pub stability_count: u64,
    pub current_ratio: i64,
    pub samples_recorded: usize,
    pub decisions_recorded: usize,
    pub running: bool,
}
