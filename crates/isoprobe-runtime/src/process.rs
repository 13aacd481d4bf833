//! Memory usage of the running process.
//!
//! Values come from `/proc/self/status`. On hosts without it every field
//! reads as zero.

use std::path::Path;

use isoprobe_common::constants::PROC_SELF_STATUS;
use isoprobe_common::types::bytes_to_mb;
use serde::Serialize;

/// Raw memory counters of the process, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessMemory {
    /// Resident set size (`VmRSS`).
    pub rss_bytes: u64,
    /// Peak resident set size (`VmHWM`).
    pub peak_rss_bytes: u64,
    /// Heap and anonymous data segment (`VmData`).
    pub data_bytes: u64,
    /// Total virtual memory (`VmSize`).
    pub virtual_bytes: u64,
}

impl ProcessMemory {
    /// Same counters in MiB, rounded for presentation.
    pub fn usage(&self) -> MemoryUsage {
        MemoryUsage {
            rss_mb: bytes_to_mb(self.rss_bytes),
            peak_rss_mb: bytes_to_mb(self.peak_rss_bytes),
            data_mb: bytes_to_mb(self.data_bytes),
            virtual_mb: bytes_to_mb(self.virtual_bytes),
        }
    }
}

/// Memory counters in MiB as reported by the workload endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MemoryUsage {
    /// Resident set size.
    pub rss_mb: f64,
    /// Peak resident set size.
    pub peak_rss_mb: f64,
    /// Heap and anonymous data.
    pub data_mb: f64,
    /// Virtual memory.
    pub virtual_mb: f64,
}

/// Parses the `Vm*` lines of a status file. Unknown lines are ignored.
pub fn parse_status(content: &str) -> ProcessMemory {
    let mut memory = ProcessMemory::default();
    for line in content.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let slot = match key {
            "VmRSS" => &mut memory.rss_bytes,
            "VmHWM" => &mut memory.peak_rss_bytes,
            "VmData" => &mut memory.data_bytes,
            "VmSize" => &mut memory.virtual_bytes,
            _ => continue,
        };
        // Values are "<n> kB".
        if let Some(kb) = value.split_whitespace().next().and_then(|n| n.parse::<u64>().ok()) {
            *slot = kb.saturating_mul(1024);
        }
    }
    memory
}

/// Reads the counters from `status_file`.
pub fn read_memory(status_file: &Path) -> ProcessMemory {
    match std::fs::read_to_string(status_file) {
        Ok(content) => parse_status(&content),
        Err(e) => {
            tracing::trace!(path = %status_file.display(), error = %e, "process status unreadable");
            ProcessMemory::default()
        }
    }
}

/// Samples the counters of the running process.
pub fn sample_memory() -> ProcessMemory {
    read_memory(Path::new(PROC_SELF_STATUS))
}
