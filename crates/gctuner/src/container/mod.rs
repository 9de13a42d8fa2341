//! Container resource discovery
//!
//! One-shot probing of the memory and CPU limits imposed on the process
//! by its control group. Each filesystem source is one strategy; the
//! chains try cgroup v2 (unified hierarchy) first, then cgroup v1
//! (legacy hierarchy), then for memory `/proc/meminfo`. Every read or
//! parse failure is soft: the strategy reports nothing and the next one
//! is tried. Callers must treat zero as "unknown".

mod cgroup_v1;
mod cgroup_v2;


use crate::models::{ContainerResources, ContainerUsage};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Kernel sentinel for "no limit" in cgroup byte counters
const NO_LIMIT_SENTINEL: u64 = 1 << 63;

/// Substrings of `/proc/1/cgroup` that identify a container runtime
const RUNTIME_MARKERS: [&str; 3] = ["docker", "kubepods", "containerd"];

/// Probes the control-group filesystem for resource limits
pub struct ResourceProber {
    cgroup_root: PathBuf,
    proc_root: PathBuf,
    dockerenv_path: PathBuf,
}

impl Default for ResourceProber {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceProber {
    /// Prober over the standard filesystem locations.
    pub fn new() -> Self {
        Self {
            cgroup_root: PathBuf::from("/sys/fs/cgroup"),
            proc_root: PathBuf::from("/proc"),
            dockerenv_path: PathBuf::from("/.dockerenv"),
        }
    }

    /// Prober with custom roots (for testing, or unusual mounts).
    pub fn with_roots(
        cgroup_root: impl Into<PathBuf>,
        proc_root: impl Into<PathBuf>,
        dockerenv_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            cgroup_root: cgroup_root.into(),
            proc_root: proc_root.into(),
            dockerenv_path: dockerenv_path.into(),
        }
    }

    /// Discover container resource limits. Never fails; unresolvable
    /// fields stay zero.
    pub async fn probe(&self) -> ContainerResources {
        if !self.is_containerized().await {
            debug!("no containerization signals detected");
            return ContainerResources::default();
        }

        let memory_limit_bytes = match self.memory_limit().await {
            Some(limit) => limit,
            None => {
                warn!("containerized but no memory limit could be resolved");
                0
            }
        };
        let cpu_limit_cores = match self.cpu_limit().await {
            Some(limit) => limit,
            None => {
                warn!("containerized but no CPU limit could be resolved");
                0.0
            }
        };

        ContainerResources {
            containerized: true,
            memory_limit_bytes,
            cpu_limit_cores,
        }
    }

    /// Whether any containerization signal fires.
    pub async fn is_containerized(&self) -> bool {
        if fs::metadata(&self.dockerenv_path).await.is_ok() {
            return true;
        }

        if let Ok(content) = fs::read_to_string(self.proc_root.join("1/cgroup")).await {
            if RUNTIME_MARKERS.iter().any(|m| content.contains(m)) {
                return true;
            }
        }

        if std::process::id() == 1 {
            return true;
        }

        std::env::var("KUBERNETES_SERVICE_HOST").is_ok_and(|v| !v.is_empty())
    }

    /// Memory-limit strategy chain: cgroup v2, cgroup v1, `/proc/meminfo`.
    pub async fn memory_limit(&self) -> Option<u64> {
        if let Some(limit) = cgroup_v2::memory_limit(&self.cgroup_root).await {
            return Some(limit);
        }
        if let Some(limit) = cgroup_v1::memory_limit(&self.proc_root).await {
            return Some(limit);
        }
        mem_total_bytes(&self.proc_root).await
    }

    /// CPU-limit strategy chain: cgroup v2, then cgroup v1.
    pub async fn cpu_limit(&self) -> Option<f64> {
        if let Some(limit) = cgroup_v2::cpu_limit(&self.cgroup_root).await {
            return Some(limit);
        }
        cgroup_v1::cpu_limit(&self.proc_root).await
    }

    /// Current cgroup resource usage. Unreadable fields stay zero.
    pub async fn usage(&self) -> ContainerUsage {
        let memory_usage_bytes = match cgroup_v2::memory_usage(&self.cgroup_root).await {
            Some(usage) => Some(usage),
            None => cgroup_v1::memory_usage(&self.proc_root).await,
        }
        .unwrap_or(0);

        let cpu_usage_secs = match cgroup_v2::cpu_usage_secs(&self.cgroup_root).await {
            Some(usage) => Some(usage),
            None => cgroup_v1::cpu_usage_secs(&self.proc_root).await,
        }
        .unwrap_or(0.0);

        ContainerUsage {
            memory_usage_bytes,
            cpu_usage_secs,
        }
    }
}

/// `MemTotal` from `/proc/meminfo`, converted from kilobytes to bytes.
async fn mem_total_bytes(proc_root: &Path) -> Option<u64> {
    let content = fs::read_to_string(proc_root.join("meminfo")).await.ok()?;
    parse_meminfo_total(&content)
}

fn parse_meminfo_total(content: &str) -> Option<u64> {
    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("MemTotal:") {
            let kb: u64 = rest.split_whitespace().next()?.parse().ok()?;
            return Some(kb * 1024);
        }
    }
    None
}

/// Reject the zero and kernel no-limit sentinels.
fn plausible_limit(limit: u64) -> Option<u64> {
    if limit == 0 || limit >= NO_LIMIT_SENTINEL {
        None
    } else {
        Some(limit)
    }
}
