//! Combined workload: memory allocation then the CPU loop in one timed window.

use std::time::Instant;

use isoprobe_common::error::ProbeError;
use isoprobe_common::types::WorkloadKind;
use serde::Serialize;

use super::memory::{allocate_and_touch, buffer_len};
use super::{FailureParams, Status, WorkloadFailure, cpu, elapsed_ms};
use crate::process::{self, MemoryUsage};

/// CPU half of the combined result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedCpu {
    /// Iterations performed.
    pub iterations: u64,
    /// Accumulated value.
    pub result: f64,
}

/// Memory half of the combined result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CombinedMemory {
    /// Size allocated in MiB.
    pub allocated_mb: u64,
}

/// Result of the combined workload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedReport {
    /// Always [`Status::Completed`].
    pub status: Status,
    /// Workload label.
    pub test: &'static str,
    /// CPU sub-result.
    pub cpu: CombinedCpu,
    /// Memory sub-result.
    pub memory: CombinedMemory,
    /// Duration of both steps together.
    pub duration_ms: u64,
    /// Process memory sampled while the buffer was still alive.
    pub memory_usage: MemoryUsage,
    /// Summary line.
    pub message: String,
}

/// Allocates `size_mb` MiB, runs `iterations` of the CPU loop while the
/// buffer is held, and reports both.
///
/// # Errors
///
/// Returns a [`WorkloadFailure`] if the buffer cannot be allocated.
pub fn run_combined(
    iterations: u64,
    size_mb: u64,
    max_allowed_mb: u64,
) -> Result<CombinedReport, WorkloadFailure> {
    tracing::info!(iterations, size_mb, "Combined stress test started");
    let start = Instant::now();

    let buffer = buffer_len(size_mb)
        .and_then(allocate_and_touch)
        .map_err(|e: ProbeError| {
            tracing::error!(iterations, size_mb, error = %e, "Combined stress test failed");
            WorkloadFailure::new(
                WorkloadKind::Combined,
                &e,
                FailureParams::Combined {
                    iterations,
                    requested_mb: size_mb,
                    max_allowed_mb,
                },
            )
        })?;
    let result = cpu::burn(iterations);

    let duration_ms = elapsed_ms(start);
    let memory_usage = process::sample_memory().usage();
    drop(buffer);
    tracing::info!(iterations, size_mb, duration_ms, "Combined stress test completed");

    Ok(CombinedReport {
        status: Status::Completed,
        test: WorkloadKind::Combined.test_label(),
        cpu: CombinedCpu { iterations, result },
        memory: CombinedMemory {
            allocated_mb: size_mb,
        },
        duration_ms,
        memory_usage,
        message: format!("Combined test completed in {duration_ms}ms"),
    })
}
