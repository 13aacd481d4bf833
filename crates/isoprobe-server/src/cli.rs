//! Command-line flags with environment fallbacks.

use std::path::PathBuf;

use clap::Parser;
use isoprobe_common::config::{CorsConfig, LogFormat, ProbeConfig, WorkloadLimits};
use isoprobe_common::constants;
use isoprobe_common::error::Result;

/// isoprobe: container isolation probe and bounded stress service.
#[derive(Parser, Debug)]
#[command(name = "isoprobe", version, about, long_about = None)]
pub struct Args {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = constants::DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind.
    #[arg(long = "bind", env = "BIND_ADDRESS", default_value = constants::DEFAULT_BIND_ADDRESS)]
    pub bind_address: String,

    /// Upper bound for the memory workload size in MiB.
    #[arg(long, env = "MAX_MEMORY_MB", default_value_t = constants::DEFAULT_MAX_MEMORY_MB)]
    pub max_memory_mb: u64,

    /// Upper bound for CPU workload iterations.
    #[arg(long, env = "MAX_ITERATIONS", default_value_t = constants::DEFAULT_MAX_ITERATIONS)]
    pub max_iterations: u64,

    /// Upper bound for disk workload operations.
    #[arg(
        long,
        env = "MAX_DISK_OPERATIONS",
        default_value_t = constants::DEFAULT_MAX_DISK_OPERATIONS
    )]
    pub max_disk_operations: u64,

    /// Longest time a request waits for its workload, in milliseconds.
    #[arg(
        long,
        env = "MAX_REQUEST_TIMEOUT_MS",
        default_value_t = constants::DEFAULT_REQUEST_TIMEOUT_MS
    )]
    pub request_timeout_ms: u64,

    /// Workloads allowed to run at the same time.
    #[arg(
        long,
        env = "MAX_CONCURRENT_WORKLOADS",
        default_value_t = constants::DEFAULT_MAX_CONCURRENT_WORKLOADS
    )]
    pub max_concurrent_workloads: usize,

    /// Directory for disk workload temp files (defaults to the system temp dir).
    #[arg(long, env = "STRESS_SCRATCH_DIR")]
    pub scratch_dir: Option<PathBuf>,

    /// Tracing filter; `RUST_LOG` takes precedence.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format: `json` or `text`.
    #[arg(long, env = "LOG_FORMAT", default_value = "json")]
    pub log_format: LogFormat,

    /// Emit CORS headers.
    #[arg(long, env = "CORS_ENABLED")]
    pub cors_enabled: bool,

    /// Allowed origins, comma separated; `*` allows any.
    #[arg(long, env = "CORS_ORIGINS", value_delimiter = ',', default_value = "*")]
    pub cors_origins: Vec<String>,
}

impl Args {
    /// Converts the flags into a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any limit is zero.
    pub fn into_config(self) -> Result<ProbeConfig> {
        let config = ProbeConfig {
            bind_address: self.bind_address,
            port: self.port,
            limits: WorkloadLimits {
                max_iterations: self.max_iterations,
                max_memory_mb: self.max_memory_mb,
                max_disk_operations: self.max_disk_operations,
                request_timeout_ms: self.request_timeout_ms,
                max_concurrent: self.max_concurrent_workloads,
            },
            scratch_dir: self.scratch_dir.unwrap_or_else(std::env::temp_dir),
            log_level: self.log_level,
            log_format: self.log_format,
            cors: CorsConfig {
                enabled: self.cors_enabled,
                allowed_origins: self
                    .cors_origins
                    .into_iter()
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect(),
            },
        };
        config.validate()?;
        Ok(config)
    }
}
