//! cgroup v2 (unified hierarchy) readers
//!
//! Limits live directly under the cgroup root:
//! - memory.max for the memory limit ("max" means unlimited)
//! - cpu.max for the CPU quota and period
//! - memory.current and cpu.stat for current usage

use std::path::Path;
use tokio::fs;

pub(super) async fn memory_limit(cgroup_root: &Path) -> Option<u64> {
    let content = fs::read_to_string(cgroup_root.join("memory.max"))
        .await
        .ok()?;
    parse_memory_max(&content)
}

pub(super) fn parse_memory_max(content: &str) -> Option<u64> {
    let value = content.trim();
    if value == "max" {
        return None;
    }
    super::plausible_limit(value.parse().ok()?)
}

pub(super) async fn cpu_limit(cgroup_root: &Path) -> Option<f64> {
    let content = fs::read_to_string(cgroup_root.join("cpu.max")).await.ok()?;
    parse_cpu_max(&content)
}

/// cpu.max holds `"<quota> <period>"` in microseconds, or the literal
/// `max` when unconstrained.
pub(super) fn parse_cpu_max(content: &str) -> Option<f64> {
    let value = content.trim();
    if value == "max" {
        return None;
    }

    let mut fields = value.split_whitespace();
    let quota: f64 = fields.next()?.parse().ok()?;
    let period: f64 = fields.next()?.parse().ok()?;
    if period <= 0.0 {
        return None;
    }

    let cores = quota / period;
    cores.is_finite().then_some(cores)
}

pub(super) async fn memory_usage(cgroup_root: &Path) -> Option<u64> {
    let content = fs::read_to_string(cgroup_root.join("memory.current"))
        .await
        .ok()?;
    content.trim().parse().ok()
}

pub(super) async fn cpu_usage_secs(cgroup_root: &Path) -> Option<f64> {
    let content = fs::read_to_string(cgroup_root.join("cpu.stat")).await.ok()?;
    parse_cpu_stat_usage(&content).map(|usec| usec as f64 / 1_000_000.0)
}

pub(super) fn parse_cpu_stat_usage(content: &str) -> Option<u64> {
    for line in content.lines() {
        let mut parts = line.split_whitespace();
        if parts.next() == Some("usage_usec") {
            return parts.next()?.parse().ok();
        }
    }
    None
}
