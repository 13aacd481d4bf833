//! Cgroups v2 resource-limit files.
//!
//! Values are returned verbatim (trimmed). `max` means unlimited, and
//! `cpu.max` holds `"<quota> <period>"`; interpreting them is left to the
//! reader of the report.

use std::io::ErrorKind;
use std::path::Path;

use isoprobe_common::error::{ProbeError, Result};
use serde::Serialize;

/// A limit file under the cgroup root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitFile {
    /// CPU bandwidth, `cpu.max`.
    Cpu,
    /// Hard memory limit, `memory.max`.
    Memory,
    /// Process count limit, `pids.max`.
    Pids,
}

impl LimitFile {
    /// Every limit file, in report order.
    pub const ALL: [Self; 3] = [Self::Cpu, Self::Memory, Self::Pids];

    /// File name relative to the cgroup root.
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Cpu => "cpu.max",
            Self::Memory => "memory.max",
            Self::Pids => "pids.max",
        }
    }
}

/// Raw resource limits of the current cgroup.
///
/// `None` means the file was missing or unreadable, not that no limit
/// applies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CgroupLimits {
    /// Contents of `cpu.max`.
    pub cpu: Option<String>,
    /// Contents of `memory.max`.
    pub memory: Option<String>,
    /// Contents of `pids.max`.
    pub pids: Option<String>,
}

impl CgroupLimits {
    /// Reads every limit file under `cgroup_root` independently.
    pub fn read(cgroup_root: &Path) -> Self {
        let mut limits = Self::default();
        for file in LimitFile::ALL {
            let value = match read_limit(cgroup_root, file) {
                Ok(value) => value,
                Err(e) => {
                    tracing::debug!(file = file.file_name(), error = %e, "cgroup limit unreadable");
                    None
                }
            };
            match file {
                LimitFile::Cpu => limits.cpu = value,
                LimitFile::Memory => limits.memory = value,
                LimitFile::Pids => limits.pids = value,
            }
        }
        limits
    }
}

/// Reads one limit file.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn read_limit(cgroup_root: &Path, file: LimitFile) -> Result<Option<String>> {
    let path = cgroup_root.join(file.file_name());
    match std::fs::read_to_string(&path) {
        Ok(content) => Ok(Some(content.trim().to_string())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ProbeError::io(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_and_trims_present_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("cpu.max"), "50000 100000\n").expect("write");
        std::fs::write(dir.path().join("memory.max"), "268435456\n").expect("write");
        std::fs::write(dir.path().join("pids.max"), "max\n").expect("write");

        let limits = CgroupLimits::read(dir.path());
        assert_eq!(limits.cpu.as_deref(), Some("50000 100000"));
        assert_eq!(limits.memory.as_deref(), Some("268435456"));
        assert_eq!(limits.pids.as_deref(), Some("max"));
    }

    #[test]
    fn missing_file_does_not_affect_others() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("pids.max"), "64").expect("write");

        let limits = CgroupLimits::read(dir.path());
        assert!(limits.cpu.is_none());
        assert!(limits.memory.is_none());
        assert_eq!(limits.pids.as_deref(), Some("64"));
    }

    #[test]
    fn unreadable_file_is_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        // A directory in place of the file makes the read fail.
        std::fs::create_dir(dir.path().join("memory.max")).expect("mkdir");
        std::fs::write(dir.path().join("cpu.max"), "max 100000").expect("write");

        assert!(read_limit(dir.path(), LimitFile::Memory).is_err());
        let limits = CgroupLimits::read(dir.path());
        assert!(limits.memory.is_none());
        assert_eq!(limits.cpu.as_deref(), Some("max 100000"));
    }

    #[test]
    fn absent_limits_serialize_as_null() {
        let json = serde_json::to_value(CgroupLimits::default()).expect("serialize");
        assert!(json["cpu"].is_null());
        assert!(json.as_object().expect("object").contains_key("pids"));
    }
}
