//! Per-tick sample synthesis
//!
//! Combines a runtime snapshot with the container limits cached at
//! construction into a `Sample`, deriving pause mean, collection
//! frequency and memory pressure.

use crate::models::{ContainerResources, Sample};
use crate::runtime::GcRuntime;
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

/// How many of the most recent pauses contribute to the pause mean
const PAUSE_WINDOW: usize = 10;

/// Builds samples from the runtime probe and cached container limits
pub struct SampleCollector {
    runtime: Arc<dyn GcRuntime>,
    resources: ContainerResources,
    memory_limit_percent: f64,
}

impl SampleCollector {
    pub fn new(
        runtime: Arc<dyn GcRuntime>,
        resources: ContainerResources,
        memory_limit_percent: f64,
    ) -> Self {
        Self {
            runtime,
            resources,
            memory_limit_percent,
        }
    }

    /// Produce a fresh sample. `prev` is the most recent recorded sample,
    /// used only to derive the collection frequency.
    pub fn collect(&self, prev: Option<&Sample>) -> Result<Sample> {
        let snapshot = self.runtime.snapshot()?;
        let timestamp = Utc::now();

        let recent = &snapshot.recent_pauses[..snapshot.recent_pauses.len().min(PAUSE_WINDOW)];
        let gc_pause = if recent.is_empty() {
            Duration::ZERO
        } else {
            recent.iter().sum::<Duration>() / recent.len() as u32
        };

        let gc_frequency = prev.map_or(0.0, |prev| {
            let elapsed = (timestamp - prev.timestamp).num_milliseconds() as f64 / 1000.0;
            if elapsed <= 0.0 {
                0.0
            } else {
                snapshot.gc_count.saturating_sub(prev.gc_count) as f64 / elapsed
            }
        });

        let memory_pressure = if self.resources.memory_limit_bytes > 0 {
            let effective =
                self.resources.memory_limit_bytes as f64 * self.memory_limit_percent;
            snapshot.heap_inuse_bytes as f64 / effective
        } else {
            0.0
        };

        Ok(Sample {
            timestamp,
            gc_pause,
            gc_count: snapshot.gc_count,
            gc_frequency,
            heap_sys_bytes: snapshot.heap_sys_bytes,
            heap_alloc_bytes: snapshot.heap_alloc_bytes,
            heap_inuse_bytes: snapshot.heap_inuse_bytes,
            next_gc_bytes: snapshot.next_gc_bytes,
            gc_ratio: snapshot.gc_ratio,
            container_memory_limit: self.resources.memory_limit_bytes,
            container_cpu_limit: self.resources.cpu_limit_cores,
            memory_pressure,
        })
    }
}
