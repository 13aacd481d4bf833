//! Unified error types for the isoprobe workspace.
//!
//! Inspectors convert these into partial or `available: false` reports at
//! their origin. Workloads convert them into structured error payloads at
//! the engine boundary. Only configuration and startup failures travel
//! further.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// The host lacks the requested introspection facility.
    #[error("unavailable: {reason}")]
    Unavailable {
        /// Human-readable explanation, e.g. non-Linux host.
        reason: String,
    },

    /// The allocator refused a workload buffer.
    #[error("failed to allocate {bytes} bytes: {message}")]
    Allocation {
        /// Number of bytes requested.
        bytes: u64,
        /// Allocator failure description.
        message: String,
    },

    /// A workload failed for a reason other than I/O or allocation.
    #[error("workload failed: {message}")]
    Workload {
        /// Description of the failure.
        message: String,
    },

    /// The caller stopped waiting for a workload.
    #[error("workload did not finish within {timeout_ms}ms")]
    Timeout {
        /// Configured timeout in milliseconds.
        timeout_ms: u64,
    },
}

impl ProbeError {
    /// Wraps an I/O error with the path it occurred at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, ProbeError>;
