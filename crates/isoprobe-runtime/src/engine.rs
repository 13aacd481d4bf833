//! Bounded execution of workloads.
//!
//! Coordinates input clamping, the concurrency limit, the request timeout,
//! and metrics bookkeeping around the synchronous workload functions.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use isoprobe_common::config::WorkloadLimits;
use isoprobe_common::error::ProbeError;
use isoprobe_common::types::WorkloadKind;
use tokio::sync::Semaphore;

use crate::metrics::{MetricType, MetricsAggregator};
use crate::workload::{self, FailureParams, WorkloadFailure, WorkloadReport};

/// Outcome of one workload request.
pub type WorkloadOutcome = Result<WorkloadReport, WorkloadFailure>;

/// Runs workloads on blocking threads, at most `max_concurrent` at a time.
///
/// Callers beyond the limit queue on the semaphore. A caller that gives up
/// after the timeout does not stop the computation; the permit is held by
/// the blocking task until it really ends.
#[derive(Debug, Clone)]
pub struct StressEngine {
    limits: WorkloadLimits,
    scratch_dir: PathBuf,
    permits: Arc<Semaphore>,
    metrics: Arc<MetricsAggregator>,
}

impl StressEngine {
    /// Creates an engine enforcing `limits`.
    pub fn new(
        limits: WorkloadLimits,
        scratch_dir: PathBuf,
        metrics: Arc<MetricsAggregator>,
    ) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(
                limits.max_concurrent.min(Semaphore::MAX_PERMITS),
            )),
            limits,
            scratch_dir,
            metrics,
        }
    }

    /// Workloads that could start right now without queueing.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Runs the CPU loop with a clamped `iterations` parameter.
    pub async fn cpu(&self, raw_iterations: Option<&str>) -> WorkloadOutcome {
        let iterations = self.limits.cpu_iterations().validate_count(raw_iterations);
        self.execute(WorkloadKind::Cpu, FailureParams::Cpu { iterations }, move || {
            Ok(WorkloadReport::Cpu(workload::run_cpu(iterations)))
        })
        .await
    }

    /// Runs the memory workload with a clamped `size` parameter in MiB.
    pub async fn memory(&self, raw_size: Option<&str>) -> WorkloadOutcome {
        let size_mb = self.limits.memory_mb().validate_count(raw_size);
        let max_allowed_mb = self.limits.max_memory_mb;
        let params = FailureParams::Memory {
            requested_mb: size_mb,
            max_allowed_mb,
        };
        self.execute(WorkloadKind::Memory, params, move || {
            workload::run_memory(size_mb, max_allowed_mb).map(WorkloadReport::Memory)
        })
        .await
    }

    /// Runs the disk workload with a clamped `operations` parameter.
    pub async fn disk(&self, raw_operations: Option<&str>) -> WorkloadOutcome {
        let operations = self.limits.disk_operations().validate_count(raw_operations);
        let dir = self.scratch_dir.clone();
        let params = FailureParams::Disk {
            operations,
            write_operations: 0,
            read_operations: 0,
        };
        self.execute(WorkloadKind::Disk, params, move || {
            workload::run_disk(&dir, operations).map(WorkloadReport::Disk)
        })
        .await
    }

    /// Runs memory allocation followed by the CPU loop.
    pub async fn combined(
        &self,
        raw_iterations: Option<&str>,
        raw_size: Option<&str>,
    ) -> WorkloadOutcome {
        let iterations = self.limits.cpu_iterations().validate_count(raw_iterations);
        let size_mb = self.limits.combined_memory_mb().validate_count(raw_size);
        let max_allowed_mb = self.limits.max_memory_mb;
        let params = FailureParams::Combined {
            iterations,
            requested_mb: size_mb,
            max_allowed_mb,
        };
        self.execute(WorkloadKind::Combined, params, move || {
            workload::run_combined(iterations, size_mb, max_allowed_mb)
                .map(WorkloadReport::Combined)
        })
        .await
    }

    async fn execute<F>(&self, kind: WorkloadKind, params: FailureParams, job: F) -> WorkloadOutcome
    where
        F: FnOnce() -> WorkloadOutcome + Send + 'static,
    {
        let timeout = Duration::from_millis(self.limits.request_timeout_ms);
        let outcome = match tokio::time::timeout(timeout, self.spawn(job)).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => Err(WorkloadFailure::new(kind, &e, params)),
            Err(_) => Err(WorkloadFailure::new(
                kind,
                &ProbeError::Timeout {
                    timeout_ms: self.limits.request_timeout_ms,
                },
                params,
            )),
        };
        self.record(kind, &outcome);
        outcome
    }

    async fn spawn<F>(&self, job: F) -> Result<WorkloadOutcome, ProbeError>
    where
        F: FnOnce() -> WorkloadOutcome + Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| ProbeError::Workload {
                message: e.to_string(),
            })?;
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "workload task failed");
            ProbeError::Workload {
                message: e.to_string(),
            }
        })
    }

    fn record(&self, kind: WorkloadKind, outcome: &WorkloadOutcome) {
        let runs = format!("stress_{kind}_runs_total");
        if let Err(e) = self.metrics.increment_custom_metric(&runs, 1.0) {
            tracing::warn!(error = %e, "failed to update workload metric");
        }
        match outcome {
            Ok(report) => {
                #[allow(clippy::cast_precision_loss)]
                let duration = report.duration_ms() as f64;
                let name = format!("stress_{kind}_last_duration_ms");
                if let Err(e) = self.metrics.set_custom_metric(
                    &name,
                    duration,
                    "Duration of the last completed workload in milliseconds",
                    MetricType::Gauge,
                ) {
                    tracing::warn!(error = %e, "failed to update workload metric");
                }
            }
            Err(failure) => {
                tracing::warn!(%kind, error = %failure.error, "workload failed");
                let failures = format!("stress_{kind}_failures_total");
                if let Err(e) = self.metrics.increment_custom_metric(&failures, 1.0) {
                    tracing::warn!(error = %e, "failed to update workload metric");
                }
            }
        }
    }
}
