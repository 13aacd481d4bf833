//! Runtime configuration model for the isoprobe service.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::bounds::BoundsSpec;
use crate::constants;
use crate::error::{ProbeError, Result};

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Human-readable single-line events.
    Text,
}

impl std::str::FromStr for LogFormat {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            other => Err(ProbeError::Config {
                message: format!("unknown log format: {other}"),
            }),
        }
    }
}

/// Cross-origin settings applied by the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Whether CORS headers are emitted at all.
    pub enabled: bool,
    /// Allowed origins; `*` allows any.
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            allowed_origins: vec!["*".to_string()],
        }
    }
}

impl CorsConfig {
    /// Returns whether `origin` may receive an allow-origin header.
    pub fn allows(&self, origin: Option<&str>) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
            || origin.is_some_and(|origin| self.allowed_origins.iter().any(|o| o == origin))
    }
}

/// Upper bounds enforced on every workload parameter, regardless of what
/// the client asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadLimits {
    /// Maximum CPU workload iterations.
    pub max_iterations: u64,
    /// Maximum memory workload size in MiB.
    pub max_memory_mb: u64,
    /// Maximum disk workload operations.
    pub max_disk_operations: u64,
    /// Maximum time a handler waits for a workload, in milliseconds.
    pub request_timeout_ms: u64,
    /// Number of workloads allowed to execute at the same time.
    pub max_concurrent: usize,
}

impl Default for WorkloadLimits {
    fn default() -> Self {
        Self {
            max_iterations: constants::DEFAULT_MAX_ITERATIONS,
            max_memory_mb: constants::DEFAULT_MAX_MEMORY_MB,
            max_disk_operations: constants::DEFAULT_MAX_DISK_OPERATIONS,
            request_timeout_ms: constants::DEFAULT_REQUEST_TIMEOUT_MS,
            max_concurrent: constants::DEFAULT_MAX_CONCURRENT_WORKLOADS,
        }
    }
}

impl WorkloadLimits {
    /// Bounds for the `iterations` parameter.
    pub fn cpu_iterations(&self) -> BoundsSpec {
        BoundsSpec {
            default: constants::DEFAULT_CPU_ITERATIONS,
            min: 1,
            max: to_signed(self.max_iterations),
        }
    }

    /// Bounds for the `size` parameter of the memory workload.
    pub fn memory_mb(&self) -> BoundsSpec {
        BoundsSpec {
            default: constants::DEFAULT_MEMORY_MB,
            min: 1,
            max: to_signed(self.max_memory_mb),
        }
    }

    /// Bounds for the `size` parameter of the combined workload.
    pub fn combined_memory_mb(&self) -> BoundsSpec {
        BoundsSpec {
            default: constants::DEFAULT_COMBINED_MEMORY_MB,
            ..self.memory_mb()
        }
    }

    /// Bounds for the `operations` parameter.
    pub fn disk_operations(&self) -> BoundsSpec {
        BoundsSpec {
            default: constants::DEFAULT_DISK_OPERATIONS,
            min: 1,
            max: to_signed(self.max_disk_operations),
        }
    }
}

fn to_signed(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Root configuration for the isoprobe service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Address the HTTP server binds to.
    pub bind_address: String,
    /// Port the HTTP server listens on.
    pub port: u16,
    /// Bounds and concurrency for workloads.
    pub limits: WorkloadLimits,
    /// Directory in which the disk workload creates its temporary file.
    pub scratch_dir: PathBuf,
    /// Tracing filter directive, e.g. `info` or `isoprobe=debug`.
    pub log_level: String,
    /// Tracing output format.
    pub log_format: LogFormat,
    /// Cross-origin settings.
    pub cors: CorsConfig,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            bind_address: constants::DEFAULT_BIND_ADDRESS.to_string(),
            port: constants::DEFAULT_PORT,
            limits: WorkloadLimits::default(),
            scratch_dir: std::env::temp_dir(),
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            cors: CorsConfig::default(),
        }
    }
}

impl ProbeConfig {
    /// Checks that every limit is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Config`] naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("max_iterations", self.limits.max_iterations),
            ("max_memory_mb", self.limits.max_memory_mb),
            ("max_disk_operations", self.limits.max_disk_operations),
            ("request_timeout_ms", self.limits.request_timeout_ms),
            ("max_concurrent_workloads", self.limits.max_concurrent as u64),
        ];
        if let Some((name, _)) = checks.iter().find(|(_, value)| *value == 0) {
            return Err(ProbeError::Config {
                message: format!("{name} must be at least 1"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        ProbeConfig::default().validate().expect("defaults must validate");
    }

    #[test]
    fn zero_limit_is_rejected() {
        let mut config = ProbeConfig::default();
        config.limits.max_memory_mb = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_memory_mb"));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let mut config = ProbeConfig::default();
        config.limits.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn cpu_bounds_follow_configured_max() {
        let limits = WorkloadLimits {
            max_iterations: 100,
            ..WorkloadLimits::default()
        };
        let bounds = limits.cpu_iterations();
        assert_eq!(bounds.validate(Some("5")), 5);
        assert_eq!(bounds.validate(Some("1000")), 100);
        assert_eq!(bounds.validate(None), 100);
    }

    #[test]
    fn combined_memory_uses_its_own_default() {
        let limits = WorkloadLimits::default();
        assert_eq!(limits.combined_memory_mb().validate(None), 50);
        assert_eq!(limits.memory_mb().validate(None), 100);
    }

    #[test]
    fn log_format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn cors_wildcard_allows_any_origin() {
        let cors = CorsConfig::default();
        assert!(cors.allows(Some("https://example.com")));
        assert!(cors.allows(None));
    }

    #[test]
    fn cors_list_allows_only_listed_origins() {
        let cors = CorsConfig {
            enabled: true,
            allowed_origins: vec!["https://a.test".into()],
        };
        assert!(cors.allows(Some("https://a.test")));
        assert!(!cors.allows(Some("https://b.test")));
        assert!(!cors.allows(None));
    }
}
