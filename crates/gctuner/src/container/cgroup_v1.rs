//! cgroup v1 (legacy hierarchy) readers
//!
//! Each controller is a separate mount. The mount point comes from
//! `/proc/mounts` and the process's path inside the hierarchy from
//! `/proc/self/cgroup`; the two joined give the directory holding
//! the controller's limit files.

use std::path::{Path, PathBuf};
use tokio::fs;

pub(super) async fn memory_limit(proc_root: &Path) -> Option<u64> {
    let path = subsystem_path(proc_root, "memory").await?;
    let limit = read_u64(&path.join("memory.limit_in_bytes")).await?;
    super::plausible_limit(limit)
}

pub(super) async fn cpu_limit(proc_root: &Path) -> Option<f64> {
    let path = subsystem_path(proc_root, "cpu").await?;
    let quota = read_f64(&path.join("cpu.cfs_quota_us")).await?;
    let period = read_f64(&path.join("cpu.cfs_period_us")).await?;
    // A non-positive quota means the cfs bandwidth limit is off.
    if quota <= 0.0 || period <= 0.0 {
        return None;
    }
    Some(quota / period)
}

pub(super) async fn memory_usage(proc_root: &Path) -> Option<u64> {
    let path = subsystem_path(proc_root, "memory").await?;
    read_u64(&path.join("memory.usage_in_bytes")).await
}

pub(super) async fn cpu_usage_secs(proc_root: &Path) -> Option<f64> {
    let path = subsystem_path(proc_root, "cpuacct").await?;
    let nanos = read_u64(&path.join("cpuacct.usage")).await?;
    Some(nanos as f64 / 1_000_000_000.0)
}

/// Resolve the directory for a v1 subsystem: its mount point joined with
/// the calling process's cgroup path within that hierarchy.
pub(super) async fn subsystem_path(proc_root: &Path, subsystem: &str) -> Option<PathBuf> {
    let mounts = fs::read_to_string(proc_root.join("mounts")).await.ok()?;
    let mount_point = find_subsystem_mount(&mounts, subsystem)?;

    let cgroups = fs::read_to_string(proc_root.join("self/cgroup"))
        .await
        .ok()?;
    let relative = find_subsystem_cgroup(&cgroups, subsystem)?;

    Some(mount_point.join(relative.trim_start_matches('/')))
}

/// Scan `/proc/mounts` for a cgroup-fstype mount whose options name the
/// subsystem. Mount lines are "device mountpoint fstype options ...".
pub(super) fn find_subsystem_mount(mounts: &str, subsystem: &str) -> Option<PathBuf> {
    for line in mounts.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 || fields[2] != "cgroup" {
            continue;
        }
        if fields[3].split(',').any(|opt| opt == subsystem) {
            return Some(PathBuf::from(fields[1]));
        }
    }
    None
}

/// Scan `/proc/self/cgroup` for the hierarchy carrying the subsystem.
/// v1 lines are "hierarchy-id:controller-list:path", the controller list
/// comma-separated (e.g. "cpu,cpuacct").
pub(super) fn find_subsystem_cgroup(content: &str, subsystem: &str) -> Option<String> {
    for line in content.lines() {
        let fields: Vec<&str> = line.splitn(3, ':').collect();
        if fields.len() != 3 {
            continue;
        }
        if fields[1].split(',').any(|c| c == subsystem) {
            return Some(fields[2].to_string());
        }
    }
    None
}

async fn read_u64(path: &Path) -> Option<u64> {
    fs::read_to_string(path).await.ok()?.trim().parse().ok()
}

async fn read_f64(path: &Path) -> Option<f64> {
    fs::read_to_string(path).await.ok()?.trim().parse().ok()
}
