//! Floating point CPU workload.

use std::time::Instant;

use isoprobe_common::types::{WorkloadKind, round2};
use serde::Serialize;

use super::{Status, elapsed_ms};

/// Result of the CPU loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpuReport {
    /// Always [`Status::Completed`].
    pub status: Status,
    /// Workload label.
    pub test: &'static str,
    /// Iterations performed.
    pub iterations: u64,
    /// Wall-clock duration.
    pub duration_ms: u64,
    /// Accumulated value; proves the loop was not elided.
    pub result: f64,
    /// `duration_ms * 1e6 / iterations`, rounded to two decimals.
    pub avg_time_per_iteration_ns: f64,
    /// Summary line.
    pub message: String,
}

/// Accumulates `sqrt(i) * sin(i) * cos(i)` for `i` in `[0, iterations)`.
#[allow(clippy::cast_precision_loss)]
pub fn burn(iterations: u64) -> f64 {
    let mut acc = 0.0_f64;
    for i in 0..iterations {
        let x = std::hint::black_box(i as f64);
        acc += x.sqrt() * x.sin() * x.cos();
    }
    std::hint::black_box(acc)
}

/// Average cost of one iteration in nanoseconds.
#[allow(clippy::cast_precision_loss)]
pub fn avg_ns_per_iteration(duration_ms: u64, iterations: u64) -> f64 {
    if iterations == 0 {
        return 0.0;
    }
    round2(duration_ms as f64 * 1e6 / iterations as f64)
}

/// Runs the CPU loop and times it.
pub fn run_cpu(iterations: u64) -> CpuReport {
    tracing::info!(iterations, "CPU stress test started");
    let start = Instant::now();
    let result = burn(iterations);
    let duration_ms = elapsed_ms(start);
    tracing::info!(iterations, duration_ms, "CPU stress test completed");

    CpuReport {
        status: Status::Completed,
        test: WorkloadKind::Cpu.test_label(),
        iterations,
        duration_ms,
        result,
        avg_time_per_iteration_ns: avg_ns_per_iteration(duration_ms, iterations),
        message: format!("CPU stress test completed in {duration_ms}ms"),
    }
}
