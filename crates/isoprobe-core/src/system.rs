//! Host facts: hostname, platform, CPUs, memory, and load.

use std::path::Path;

use isoprobe_common::constants::PROC_CPUINFO;
use isoprobe_common::types::{bytes_to_mb, round2};
use serde::Serialize;

/// Physical memory of the host as seen from inside the container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HostMemory {
    /// Total RAM in bytes.
    pub total_bytes: u64,
    /// Unused RAM in bytes.
    pub free_bytes: u64,
}

impl HostMemory {
    /// Used fraction of total memory, in percent.
    #[allow(clippy::cast_precision_loss)]
    pub fn usage_percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        (1.0 - self.free_bytes as f64 / self.total_bytes as f64) * 100.0
    }
}

/// 1, 5, and 15 minute load averages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LoadAverage {
    /// One-minute average.
    pub one: f64,
    /// Five-minute average.
    pub five: f64,
    /// Fifteen-minute average.
    pub fifteen: f64,
}

/// Reads total and free memory.
#[cfg(target_os = "linux")]
pub fn host_memory() -> HostMemory {
    match nix::sys::sysinfo::sysinfo() {
        Ok(info) => HostMemory {
            total_bytes: info.ram_total(),
            free_bytes: info.ram_unused(),
        },
        Err(e) => {
            tracing::warn!(error = %e, "sysinfo failed");
            HostMemory::default()
        }
    }
}

/// Stub for non-Linux platforms.
#[cfg(not(target_os = "linux"))]
pub fn host_memory() -> HostMemory {
    HostMemory::default()
}

/// Reads the load averages.
#[cfg(target_os = "linux")]
pub fn load_average() -> LoadAverage {
    match nix::sys::sysinfo::sysinfo() {
        Ok(info) => {
            let (one, five, fifteen) = info.load_average();
            LoadAverage { one, five, fifteen }
        }
        Err(e) => {
            tracing::warn!(error = %e, "sysinfo failed");
            LoadAverage::default()
        }
    }
}

/// Stub for non-Linux platforms.
#[cfg(not(target_os = "linux"))]
pub fn load_average() -> LoadAverage {
    LoadAverage::default()
}

/// Returns the host name, or `"unknown"`.
pub fn hostname() -> String {
    nix::unistd::gethostname()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Number of CPUs available to this process.
pub fn cpu_count() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

/// Extracts the first `model name` from a `/proc/cpuinfo` dump.
pub fn parse_cpu_model(cpuinfo: &str) -> Option<String> {
    cpuinfo.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        (key.trim() == "model name").then(|| value.trim().to_string())
    })
}

/// Reads the CPU model name from a cpuinfo file.
pub fn cpu_model(cpuinfo: &Path) -> Option<String> {
    std::fs::read_to_string(cpuinfo)
        .ok()
        .and_then(|content| parse_cpu_model(&content))
}

/// CPU summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CpuSummary {
    /// Available CPUs.
    pub count: usize,
    /// Model name, `"Unknown"` when not exposed.
    pub model: String,
}

/// Memory summary in MiB.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemorySummary {
    /// Total RAM.
    pub total_mb: f64,
    /// Unused RAM.
    pub free_mb: f64,
    /// Used fraction in percent.
    pub usage_percent: f64,
}

/// Host description returned by the info endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostInfo {
    /// Host name (the UTS namespace view).
    pub hostname: String,
    /// Operating system.
    pub platform: &'static str,
    /// CPU architecture.
    pub architecture: &'static str,
    /// CPU summary.
    pub cpus: CpuSummary,
    /// Memory summary.
    pub memory: MemorySummary,
}

/// Collects the host description.
pub fn host_info() -> HostInfo {
    let memory = host_memory();
    HostInfo {
        hostname: hostname(),
        platform: std::env::consts::OS,
        architecture: std::env::consts::ARCH,
        cpus: CpuSummary {
            count: cpu_count(),
            model: cpu_model(Path::new(PROC_CPUINFO)).unwrap_or_else(|| "Unknown".to_string()),
        },
        memory: MemorySummary {
            total_mb: bytes_to_mb(memory.total_bytes),
            free_mb: bytes_to_mb(memory.free_bytes),
            usage_percent: round2(memory.usage_percent()),
        },
    }
}
