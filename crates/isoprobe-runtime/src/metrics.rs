//! Request counters, custom metrics, and the text export.
//!
//! One [`MetricsAggregator`] lives for the whole process and is shared by
//! handle. Counters are atomics; the custom registry sits behind a mutex.
//! Reading a snapshot never mutates anything.

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use isoprobe_common::constants::METRIC_PREFIX;
use isoprobe_common::error::{ProbeError, Result};
use isoprobe_core::system;
use serde::Serialize;

use crate::process;

/// Kind of a metric in the text export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    /// Monotonically increasing value.
    Counter,
    /// Value that can go up and down.
    Gauge,
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Counter => f.write_str("counter"),
            Self::Gauge => f.write_str("gauge"),
        }
    }
}

/// A named application metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomMetric {
    /// Current value.
    pub value: f64,
    /// Help text; omitted from the export when empty.
    pub help: String,
    /// Export type.
    #[serde(rename = "type")]
    pub metric_type: MetricType,
}

/// Process-level figures at snapshot time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessMetrics {
    /// Seconds since the aggregator was created.
    pub uptime_seconds: f64,
    /// Resident set size.
    pub memory_rss_bytes: u64,
    /// Heap and anonymous data.
    pub memory_data_bytes: u64,
    /// Virtual memory.
    pub memory_virtual_bytes: u64,
    /// Available CPUs.
    pub cpu_count: usize,
    /// Process ID.
    pub pid: u32,
}

/// Host-level figures at snapshot time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemMetrics {
    /// Total RAM.
    pub total_memory_bytes: u64,
    /// Unused RAM.
    pub free_memory_bytes: u64,
    /// One-minute load average.
    pub load_average_1m: f64,
    /// Five-minute load average.
    pub load_average_5m: f64,
    /// Fifteen-minute load average.
    pub load_average_15m: f64,
}

/// Immutable view of every metric at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    /// Requests seen.
    pub requests_total: u64,
    /// Requests answered with an error status.
    pub errors_total: u64,
    /// Process figures.
    pub process: ProcessMetrics,
    /// Host figures.
    pub system: SystemMetrics,
    /// Custom metrics by name.
    pub custom: BTreeMap<String, CustomMetric>,
}

/// Owner of the application counters.
#[derive(Debug)]
pub struct MetricsAggregator {
    started: Instant,
    requests: AtomicU64,
    errors: AtomicU64,
    custom: Mutex<BTreeMap<String, CustomMetric>>,
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsAggregator {
    /// Creates an aggregator with zeroed counters; uptime starts now.
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            requests: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            custom: Mutex::new(BTreeMap::new()),
        }
    }

    /// Counts one inbound request.
    pub fn record_request(&self) {
        let _ = self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts one request that ended in an error response.
    pub fn record_error(&self) {
        let _ = self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Requests seen so far.
    pub fn requests_total(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Error responses so far.
    pub fn errors_total(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Seconds since the aggregator was created.
    pub fn uptime_seconds(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Inserts or replaces a custom metric.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Config`] if `name` is not a valid metric name.
    pub fn set_custom_metric(
        &self,
        name: &str,
        value: f64,
        help: &str,
        metric_type: MetricType,
    ) -> Result<()> {
        validate_name(name)?;
        let _ = self.registry().insert(
            name.to_string(),
            CustomMetric {
                value,
                help: help.to_string(),
                metric_type,
            },
        );
        Ok(())
    }

    /// Adds `amount` to a custom metric, creating it as a counter seeded
    /// with `amount` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Config`] if `name` is not a valid metric name.
    pub fn increment_custom_metric(&self, name: &str, amount: f64) -> Result<()> {
        validate_name(name)?;
        let mut registry = self.registry();
        if let Some(metric) = registry.get_mut(name) {
            metric.value += amount;
        } else {
            let _ = registry.insert(
                name.to_string(),
                CustomMetric {
                    value: amount,
                    help: String::new(),
                    metric_type: MetricType::Counter,
                },
            );
        }
        Ok(())
    }

    /// Captures every metric.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let memory = process::sample_memory();
        let host = system::host_memory();
        let load = system::load_average();
        MetricsSnapshot {
            requests_total: self.requests_total(),
            errors_total: self.errors_total(),
            process: ProcessMetrics {
                uptime_seconds: self.uptime_seconds(),
                memory_rss_bytes: memory.rss_bytes,
                memory_data_bytes: memory.data_bytes,
                memory_virtual_bytes: memory.virtual_bytes,
                cpu_count: system::cpu_count(),
                pid: std::process::id(),
            },
            system: SystemMetrics {
                total_memory_bytes: host.total_bytes,
                free_memory_bytes: host.free_bytes,
                load_average_1m: load.one,
                load_average_5m: load.five,
                load_average_15m: load.fifteen,
            },
            custom: self.registry().clone(),
        }
    }

    fn registry(&self) -> MutexGuard<'_, BTreeMap<String, CustomMetric>> {
        self.custom.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn validate_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_first = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == ':');
    if valid_first && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':') {
        Ok(())
    } else {
        Err(ProbeError::Config {
            message: format!("invalid metric name: {name:?}"),
        })
    }
}

impl MetricsSnapshot {
    /// Renders the snapshot in the line-oriented text exposition format.
    ///
    /// Every metric gets a `# HELP` and `# TYPE` line, a value line, and a
    /// trailing blank line. Custom metrics without help text skip `# HELP`.
    pub fn to_text(&self) -> String {
        use MetricType::{Counter, Gauge};

        let mut out = TextWriter::default();
        let p = &self.process;
        let s = &self.system;

        let uptime = format!("{:.2}", p.uptime_seconds);
        let fixed: [(&str, &str, MetricType, &dyn fmt::Display); 13] = [
            ("uptime_seconds", "Container uptime in seconds", Gauge, &uptime),
            ("memory_rss_bytes", "Memory RSS in bytes", Gauge, &p.memory_rss_bytes),
            (
                "memory_data_bytes",
                "Heap and anonymous memory in bytes",
                Gauge,
                &p.memory_data_bytes,
            ),
            ("memory_virtual_bytes", "Virtual memory in bytes", Gauge, &p.memory_virtual_bytes),
            ("cpu_count", "Number of CPUs", Gauge, &p.cpu_count),
            ("process_pid", "Process PID", Gauge, &p.pid),
            ("http_requests_total", "Total HTTP requests", Counter, &self.requests_total),
            ("http_errors_total", "Total HTTP errors", Counter, &self.errors_total),
            ("system_memory_total_bytes", "Total system memory", Gauge, &s.total_memory_bytes),
            ("system_memory_free_bytes", "Free system memory", Gauge, &s.free_memory_bytes),
            (
                "system_load_average_1m",
                "System load average over 1 minute",
                Gauge,
                &s.load_average_1m,
            ),
            (
                "system_load_average_5m",
                "System load average over 5 minutes",
                Gauge,
                &s.load_average_5m,
            ),
            (
                "system_load_average_15m",
                "System load average over 15 minutes",
                Gauge,
                &s.load_average_15m,
            ),
        ];
        for (name, help, metric_type, value) in fixed {
            out.metric(name, help, metric_type, value);
        }

        for (name, metric) in &self.custom {
            out.metric(name, &metric.help, metric.metric_type, &metric.value);
        }
        out.0
    }
}

#[derive(Default)]
struct TextWriter(String);

impl TextWriter {
    fn metric(
        &mut self,
        name: &str,
        help: &str,
        metric_type: MetricType,
        value: &dyn fmt::Display,
    ) {
        let full = if name.starts_with(METRIC_PREFIX) {
            name.to_string()
        } else {
            format!("{METRIC_PREFIX}{name}")
        };
        // Writing into a String cannot fail.
        if !help.is_empty() {
            let _ = writeln!(self.0, "# HELP {full} {help}");
        }
        let _ = writeln!(self.0, "# TYPE {full} {metric_type}");
        let _ = writeln!(self.0, "{full} {value}");
        self.0.push('\n');
    }
}
