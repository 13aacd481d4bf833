//! Memory workload: allocate a buffer and commit its pages.

use std::time::Instant;

use isoprobe_common::constants::{BYTES_PER_MB, PAGE_STRIDE};
use isoprobe_common::error::{ProbeError, Result};
use isoprobe_common::types::WorkloadKind;
use serde::Serialize;

use super::{FailureParams, Status, WorkloadFailure, elapsed_ms};
use crate::process::{self, MemoryUsage};

/// Result of the memory workload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryReport {
    /// Always [`Status::Success`].
    pub status: Status,
    /// Workload label.
    pub test: &'static str,
    /// Size allocated, after clamping.
    pub allocated_mb: u64,
    /// Exact byte length of the buffer.
    pub allocated_bytes: u64,
    /// Wall-clock duration of allocation and page touching.
    pub duration_ms: u64,
    /// Process memory sampled while the buffer was still alive.
    pub memory_usage: MemoryUsage,
    /// Summary line.
    pub message: String,
}

/// Converts MiB to a byte length addressable on this platform.
///
/// # Errors
///
/// Returns [`ProbeError::Allocation`] if the size overflows `usize`.
pub fn buffer_len(size_mb: u64) -> Result<usize> {
    size_mb
        .checked_mul(BYTES_PER_MB)
        .and_then(|bytes| usize::try_from(bytes).ok())
        .ok_or_else(|| ProbeError::Allocation {
            bytes: size_mb.saturating_mul(BYTES_PER_MB),
            message: "size exceeds the address space".to_string(),
        })
}

/// Allocates `len` zeroed bytes and writes one byte every page.
///
/// The reservation is fallible, so an allocator refusal surfaces as an
/// error rather than aborting the process.
///
/// # Errors
///
/// Returns [`ProbeError::Allocation`] if the allocator refuses.
#[allow(clippy::cast_possible_truncation)]
pub fn allocate_and_touch(len: usize) -> Result<Vec<u8>> {
    let mut buffer: Vec<u8> = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|e| ProbeError::Allocation {
            bytes: len as u64,
            message: e.to_string(),
        })?;
    buffer.resize(len, 0);
    for (page, offset) in (0..len).step_by(PAGE_STRIDE).enumerate() {
        buffer[offset] = (page & 0xff) as u8;
    }
    Ok(std::hint::black_box(buffer))
}

/// Allocates `size_mb` MiB, reports timing and process memory, then frees it.
///
/// # Errors
///
/// Returns a [`WorkloadFailure`] with `requested_mb` and `max_allowed_mb`
/// if the buffer cannot be allocated.
pub fn run_memory(
    size_mb: u64,
    max_allowed_mb: u64,
) -> std::result::Result<MemoryReport, WorkloadFailure> {
    tracing::info!(size_mb, "Memory stress test started");
    let fail = |e: &ProbeError| {
        tracing::error!(size_mb, error = %e, "Memory stress test failed");
        WorkloadFailure::new(
            WorkloadKind::Memory,
            e,
            FailureParams::Memory {
                requested_mb: size_mb,
                max_allowed_mb,
            },
        )
    };

    let start = Instant::now();
    let buffer = buffer_len(size_mb)
        .and_then(allocate_and_touch)
        .map_err(|e| fail(&e))?;
    let duration_ms = elapsed_ms(start);
    let memory_usage = process::sample_memory().usage();
    let allocated_bytes = buffer.len() as u64;

    drop(buffer);
    tracing::info!(size_mb, duration_ms, "Memory stress test completed");

    Ok(MemoryReport {
        status: Status::Success,
        test: WorkloadKind::Memory.test_label(),
        allocated_mb: size_mb,
        allocated_bytes,
        duration_ms,
        memory_usage,
        message: format!("Successfully allocated {size_mb} MB in {duration_ms}ms"),
    })
}
