//! The seam between the tuner and the managed runtime's GC
//!
//! The tuner never talks to allocator internals directly; it reads a
//! snapshot of GC state and writes exactly one knob, the pacer ratio.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Point-in-time view of the runtime's GC state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeSnapshot {
    /// Bytes of heap reserved from the OS
    pub heap_sys_bytes: u64,
    /// Bytes currently allocated to live objects
    pub heap_alloc_bytes: u64,
    /// Bytes in in-use heap spans
    pub heap_inuse_bytes: u64,
    /// Heap size at which the next collection triggers
    pub next_gc_bytes: u64,
    /// Completed collections since process start
    pub gc_count: u64,
    /// Recent stop-the-world pauses, most recent first. The runtime may
    /// report fewer than ten.
    pub recent_pauses: Vec<Duration>,
    /// Pacer ratio currently in effect
    pub gc_ratio: i64,
}

/// Access to the host runtime's GC pacer.
///
/// Implementations are expected to be cheap and non-blocking; the tuner
/// calls `snapshot` on every tick and from concurrent metric readers.
pub trait GcRuntime: Send + Sync {
    /// Read the current GC state. Must not change the pacer ratio.
    fn snapshot(&self) -> Result<RuntimeSnapshot>;

    /// Set the pacer ratio, returning the value it replaced.
    fn set_gc_ratio(&self, ratio: i64) -> i64;
}
