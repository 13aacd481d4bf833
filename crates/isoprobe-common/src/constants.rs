//! System-wide constants, default limits, and well-known paths.

/// Root of the proc filesystem.
pub const PROC_ROOT: &str = "/proc";

/// Cgroup membership record of the calling process.
pub const PROC_SELF_CGROUP: &str = "/proc/self/cgroup";

/// Status record of the calling process (`VmRSS`, `VmSize`, ...).
pub const PROC_SELF_STATUS: &str = "/proc/self/status";

/// CPU description used for the model name.
pub const PROC_CPUINFO: &str = "/proc/cpuinfo";

/// Cgroups v2 unified hierarchy mount point.
pub const CGROUP_V2_PATH: &str = "/sys/fs/cgroup";

/// Namespace kinds inspected under `/proc/<pid>/ns`, in report order.
pub const NAMESPACE_KINDS: [&str; 7] = ["pid", "net", "mnt", "uts", "ipc", "user", "cgroup"];

/// Prefix shared by every exported metric name.
pub const METRIC_PREFIX: &str = "container_test_";

/// Content type of the text metrics export.
pub const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Default CPU iterations when the caller supplies none.
pub const DEFAULT_CPU_ITERATIONS: i64 = 1_000_000;

/// Default memory workload size in MiB.
pub const DEFAULT_MEMORY_MB: i64 = 100;

/// Default memory size for the combined workload in MiB.
pub const DEFAULT_COMBINED_MEMORY_MB: i64 = 50;

/// Default number of disk write/read operations.
pub const DEFAULT_DISK_OPERATIONS: i64 = 100;

/// Default upper bound on CPU iterations.
pub const DEFAULT_MAX_ITERATIONS: u64 = 100_000_000;

/// Default upper bound on the memory workload size in MiB.
pub const DEFAULT_MAX_MEMORY_MB: u64 = 512;

/// Default upper bound on disk operations.
pub const DEFAULT_MAX_DISK_OPERATIONS: u64 = 10_000;

/// Default time a handler waits for a workload, in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Default number of workloads allowed to run at once.
pub const DEFAULT_MAX_CONCURRENT_WORKLOADS: usize = 1;

/// Default HTTP listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default HTTP listen address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

/// Size of the buffer written by each disk operation.
pub const DISK_BLOCK_BYTES: usize = 1024;

/// Stride used to touch pages of the memory workload buffer.
pub const PAGE_STRIDE: usize = 4096;

/// Bytes per MiB.
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Uptime after which the startup probe reports the service as started.
pub const STARTUP_GRACE_SECS: f64 = 5.0;

/// Human-readable service title.
pub const APP_TITLE: &str = "Container Security Test Application";
