//! Domain primitive types used across the isoprobe workspace.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Outcome of probing a host facility that may not exist.
///
/// Serializes as the inner report flattened next to `"available": true`,
/// or as `{"available": false, "reason": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    /// The facility was readable; per-item failures live inside `T`.
    Available(T),
    /// The facility could not be read at all.
    Unavailable {
        /// Human-readable explanation.
        reason: String,
    },
}

impl<T> Probe<T> {
    /// Builds an unavailable probe from any displayable reason.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Returns whether the facility was readable.
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Returns the report if the facility was readable.
    pub const fn report(&self) -> Option<&T> {
        match self {
            Self::Available(report) => Some(report),
            Self::Unavailable { .. } => None,
        }
    }
}

impl<T: Serialize> Serialize for Probe<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a, T> {
            available: bool,
            #[serde(skip_serializing_if = "Option::is_none")]
            reason: Option<&'a str>,
            #[serde(flatten)]
            report: Option<&'a T>,
        }

        let wire = match self {
            Self::Available(report) => Wire {
                available: true,
                reason: None,
                report: Some(report),
            },
            Self::Unavailable { reason } => Wire {
                available: false,
                reason: Some(reason),
                report: None,
            },
        };
        wire.serialize(serializer)
    }
}

/// Kind of synthetic workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadKind {
    /// Floating point loop.
    Cpu,
    /// Buffer allocation with page touching.
    Memory,
    /// Sequential temp-file writes and reads.
    Disk,
    /// Memory allocation followed by the CPU loop.
    Combined,
}

impl WorkloadKind {
    /// Label used in the `test` field of responses.
    pub const fn test_label(self) -> &'static str {
        match self {
            Self::Cpu => "CPU computation",
            Self::Memory => "Memory allocation",
            Self::Disk => "Disk I/O",
            Self::Combined => "Combined CPU and Memory stress",
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Memory => write!(f, "memory"),
            Self::Disk => write!(f, "disk"),
            Self::Combined => write!(f, "combined"),
        }
    }
}

/// Converts a byte count to MiB, rounded to two decimals.
#[allow(clippy::cast_precision_loss)]
pub fn bytes_to_mb(bytes: u64) -> f64 {
    round2(bytes as f64 / crate::constants::BYTES_PER_MB as f64)
}

/// Rounds to two decimals for presentation.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
