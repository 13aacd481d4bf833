//! Cgroup membership and limits of the current process.
//!
//! Membership comes from `/proc/self/cgroup`, one `id:controllers:path`
//! line per hierarchy. Limits come from the cgroups v2 unified hierarchy
//! at `/sys/fs/cgroup`.

pub mod limits;

pub use limits::{CgroupLimits, LimitFile};

use std::path::PathBuf;

use isoprobe_common::constants::{CGROUP_V2_PATH, PROC_SELF_CGROUP};
use isoprobe_common::error::{ProbeError, Result};
use isoprobe_common::types::Probe;
use serde::Serialize;

/// One line of the membership record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CgroupEntry {
    /// Hierarchy ID (`0` on cgroups v2).
    pub id: String,
    /// Comma-separated controller list (empty on cgroups v2).
    pub controllers: String,
    /// Path of the cgroup relative to the hierarchy root.
    pub path: String,
}

/// Membership and limits of the current process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CgroupReport {
    /// Membership entries in file order.
    pub cgroups: Vec<CgroupEntry>,
    /// Resource limits of the hierarchy root.
    pub limits: CgroupLimits,
}

/// Parses a membership record.
///
/// Blank lines are skipped. Lines with fewer than three fields keep what
/// they have and leave the rest empty; a path containing `:` is kept whole.
pub fn parse_membership(content: &str) -> Vec<CgroupEntry> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let mut fields = line.splitn(3, ':');
            let mut next = || fields.next().unwrap_or_default().to_string();
            CgroupEntry {
                id: next(),
                controllers: next(),
                path: next(),
            }
        })
        .collect()
}

/// Reads cgroup membership and limits.
#[derive(Debug, Clone)]
pub struct CgroupInspector {
    membership_file: PathBuf,
    cgroup_root: PathBuf,
}

impl Default for CgroupInspector {
    fn default() -> Self {
        Self::new(PROC_SELF_CGROUP, CGROUP_V2_PATH)
    }
}

impl CgroupInspector {
    /// Creates an inspector over an explicit membership file and cgroup root.
    pub fn new(membership_file: impl Into<PathBuf>, cgroup_root: impl Into<PathBuf>) -> Self {
        Self {
            membership_file: membership_file.into(),
            cgroup_root: cgroup_root.into(),
        }
    }

    /// Reads membership and limits.
    ///
    /// Returns [`Probe::Unavailable`] if the membership record cannot be
    /// read. Limit files are read independently and never fail the call.
    pub fn inspect(&self) -> Probe<CgroupReport> {
        let content = match self.read_membership() {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!(error = %e, "cgroup membership not accessible");
                return Probe::unavailable(e.to_string());
            }
        };

        Probe::Available(CgroupReport {
            cgroups: parse_membership(&content),
            limits: CgroupLimits::read(&self.cgroup_root),
        })
    }

    fn read_membership(&self) -> Result<String> {
        if !self.membership_file.exists() {
            return Err(ProbeError::Unavailable {
                reason: format!(
                    "{} not accessible (not running on Linux)",
                    self.membership_file.display()
                ),
            });
        }
        std::fs::read_to_string(&self.membership_file)
            .map_err(|e| ProbeError::io(&self.membership_file, e))
    }
}
