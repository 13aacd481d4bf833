//! Synthetic CPU, memory, and disk workloads.
//!
//! Every workload takes parameters that have already been clamped, runs
//! synchronously, and reports its wall-clock cost. Allocation and I/O
//! failures come back as a [`WorkloadFailure`] carrying the attempted
//! parameters; nothing here panics on resource exhaustion. A kernel OOM
//! kill is still outside the process's control.

pub mod combined;
pub mod cpu;
pub mod disk;
pub mod memory;

use std::time::Instant;

use isoprobe_common::error::ProbeError;
use isoprobe_common::types::WorkloadKind;
use serde::Serialize;

pub use combined::{CombinedReport, run_combined};
pub use cpu::{CpuReport, run_cpu};
pub use disk::{DiskReport, run_disk};
pub use memory::{MemoryReport, run_memory};

/// Status field of workload responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The workload ran to the end.
    Completed,
    /// The allocation succeeded.
    Success,
    /// The workload failed.
    Error,
}

/// Successful result of any workload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WorkloadReport {
    /// CPU loop result.
    Cpu(CpuReport),
    /// Memory allocation result.
    Memory(MemoryReport),
    /// Disk I/O result.
    Disk(DiskReport),
    /// Combined result.
    Combined(CombinedReport),
}

impl WorkloadReport {
    /// Kind of workload that produced this report.
    pub const fn kind(&self) -> WorkloadKind {
        match self {
            Self::Cpu(_) => WorkloadKind::Cpu,
            Self::Memory(_) => WorkloadKind::Memory,
            Self::Disk(_) => WorkloadKind::Disk,
            Self::Combined(_) => WorkloadKind::Combined,
        }
    }

    /// Wall-clock duration in milliseconds.
    pub const fn duration_ms(&self) -> u64 {
        match self {
            Self::Cpu(r) => r.duration_ms,
            Self::Memory(r) => r.duration_ms,
            Self::Disk(r) => r.duration_ms,
            Self::Combined(r) => r.duration_ms,
        }
    }
}

/// Parameters echoed back in a failure response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FailureParams {
    /// CPU workload parameters.
    Cpu {
        /// Requested iterations.
        iterations: u64,
    },
    /// Memory workload parameters.
    Memory {
        /// Requested size in MiB.
        requested_mb: u64,
        /// Configured upper bound in MiB.
        max_allowed_mb: u64,
    },
    /// Disk workload parameters and progress.
    Disk {
        /// Requested operations.
        operations: u64,
        /// Writes finished before the failure.
        write_operations: u64,
        /// Reads finished before the failure.
        read_operations: u64,
    },
    /// Combined workload parameters.
    Combined {
        /// Requested iterations.
        iterations: u64,
        /// Requested size in MiB.
        requested_mb: u64,
        /// Configured upper bound in MiB.
        max_allowed_mb: u64,
    },
}

/// What made a workload fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCause {
    /// Allocation or I/O refused by the host.
    Resource,
    /// The caller stopped waiting.
    Timeout,
    /// The workload thread died or could not be scheduled.
    Internal,
}

/// Structured failure of a workload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkloadFailure {
    /// Always [`Status::Error`].
    pub status: Status,
    /// Human-readable workload label.
    pub test: &'static str,
    /// Underlying failure description.
    pub error: String,
    /// Summary for operators.
    pub message: String,
    /// Attempted parameters.
    #[serde(flatten)]
    pub params: FailureParams,
    /// Failure class, used to pick the HTTP status.
    #[serde(skip)]
    pub cause: FailureCause,
}

impl WorkloadFailure {
    /// Builds a failure from an error.
    pub fn new(kind: WorkloadKind, error: &ProbeError, params: FailureParams) -> Self {
        let cause = match error {
            ProbeError::Timeout { .. } => FailureCause::Timeout,
            ProbeError::Workload { .. } => FailureCause::Internal,
            _ => FailureCause::Resource,
        };
        let message = match (kind, cause) {
            (_, FailureCause::Timeout) => "Stress test exceeded the request timeout".to_string(),
            (WorkloadKind::Memory, _) => "Memory allocation failed".to_string(),
            (WorkloadKind::Disk, _) => {
                "Disk I/O test failed (possibly read-only filesystem)".to_string()
            }
            (kind, _) => format!("{} stress test failed", kind.test_label()),
        };
        Self {
            status: Status::Error,
            test: kind.test_label(),
            error: error.to_string(),
            message,
            params,
            cause,
        }
    }
}

/// Milliseconds elapsed since `start`.
pub(crate) fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
