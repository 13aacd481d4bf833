//! Namespace identity of a process.
//!
//! Each entry of `/proc/<pid>/ns` is a magic link whose target inode
//! identifies the namespace. Two processes share a namespace exactly when
//! the inodes are equal; the number itself carries no meaning.

mod kind;

pub use kind::NamespaceKind;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use isoprobe_common::constants::PROC_ROOT;
use isoprobe_common::error::{ProbeError, Result};
use isoprobe_common::types::Probe;
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

/// Namespace state of one kind for one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceRecord {
    /// Namespace kind.
    pub kind: NamespaceKind,
    /// Whether the entry could be resolved.
    pub exists: bool,
    /// Opaque namespace identifier (inode of the link target).
    pub inode: Option<u64>,
    /// Why the entry could not be read, when it exists but is unreadable.
    pub error: Option<String>,
}

impl NamespaceRecord {
    fn from_probe(kind: NamespaceKind, probe: Result<Option<u64>>) -> Self {
        match probe {
            Ok(Some(inode)) => Self {
                kind,
                exists: true,
                inode: Some(inode),
                error: None,
            },
            Ok(None) => Self {
                kind,
                exists: false,
                inode: None,
                error: None,
            },
            Err(e) => Self {
                kind,
                exists: false,
                inode: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// All namespace records of one process, in [`NamespaceKind::ALL`] order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceReport {
    /// PID the records were read for.
    pub pid: u32,
    /// One record per kind.
    pub records: Vec<NamespaceRecord>,
}

impl Serialize for NamespaceReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        struct ByKind<'a>(&'a [NamespaceRecord]);

        #[derive(Serialize)]
        struct Entry<'a> {
            exists: bool,
            inode: Option<u64>,
            #[serde(skip_serializing_if = "Option::is_none")]
            error: Option<&'a str>,
        }

        impl Serialize for ByKind<'_> {
            fn serialize<S: Serializer>(
                &self,
                serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for record in self.0 {
                    map.serialize_entry(
                        record.kind.as_str(),
                        &Entry {
                            exists: record.exists,
                            inode: record.inode,
                            error: record.error.as_deref(),
                        },
                    )?;
                }
                map.end()
            }
        }

        let mut state = serializer.serialize_struct("NamespaceReport", 2)?;
        state.serialize_field("pid", &self.pid)?;
        state.serialize_field("namespaces", &ByKind(&self.records))?;
        state.end()
    }
}

/// Reads namespace identity from a proc filesystem.
#[derive(Debug, Clone)]
pub struct NamespaceInspector {
    proc_root: PathBuf,
}

impl Default for NamespaceInspector {
    fn default() -> Self {
        Self::new(PROC_ROOT)
    }
}

impl NamespaceInspector {
    /// Creates an inspector rooted at `proc_root` (normally `/proc`).
    pub fn new(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
        }
    }

    /// Inspects the calling process.
    pub fn inspect_self(&self) -> Probe<NamespaceReport> {
        self.inspect(std::process::id())
    }

    /// Inspects every namespace kind of `pid`.
    ///
    /// Returns [`Probe::Unavailable`] if the namespace directory cannot be
    /// listed. Each kind is probed independently: one unreadable entry
    /// never hides the others.
    pub fn inspect(&self, pid: u32) -> Probe<NamespaceReport> {
        let ns_dir = self.proc_root.join(pid.to_string()).join("ns");
        if !ns_dir.is_dir() {
            tracing::debug!(path = %ns_dir.display(), "namespace directory not accessible");
            return Probe::unavailable(format!(
                "{} not accessible (not running on Linux or permission denied)",
                ns_dir.display()
            ));
        }

        let records = NamespaceKind::ALL
            .iter()
            .map(|&kind| {
                let record = NamespaceRecord::from_probe(kind, probe_kind(&ns_dir, kind));
                if let Some(error) = &record.error {
                    tracing::warn!(%kind, pid, error = %error, "namespace entry unreadable");
                }
                record
            })
            .collect();

        Probe::Available(NamespaceReport { pid, records })
    }
}

/// Resolves one namespace link to its identifier.
///
/// `Ok(None)` means the kernel does not expose this kind.
fn probe_kind(ns_dir: &Path, kind: NamespaceKind) -> Result<Option<u64>> {
    let path = ns_dir.join(kind.as_str());
    match std::fs::metadata(&path) {
        Ok(meta) => Ok(Some(inode_of(&meta))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ProbeError::io(path, e)),
    }
}

#[cfg(unix)]
fn inode_of(meta: &std::fs::Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    meta.ino()
}

#[cfg(not(unix))]
const fn inode_of(_meta: &std::fs::Metadata) -> u64 {
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(report: &NamespaceReport, kind: NamespaceKind) -> Option<&NamespaceRecord> {
        report.records.iter().find(|r| r.kind == kind)
    }

    fn fake_proc(pid: u32, kinds: &[&str]) -> tempfile::TempDir {
        let root = tempfile::tempdir().expect("tempdir");
        let ns = root.path().join(pid.to_string()).join("ns");
        std::fs::create_dir_all(&ns).expect("create ns dir");
        for kind in kinds {
            std::fs::write(ns.join(kind), b"").expect("create ns entry");
        }
        root
    }

    #[test]
    fn missing_proc_is_unavailable() {
        let root = tempfile::tempdir().expect("tempdir");
        let probe = NamespaceInspector::new(root.path()).inspect(1);
        assert!(!probe.is_available());
    }

    #[test]
    fn reports_every_kind_in_order() {
        let root = fake_proc(42, &["pid", "net", "mnt", "uts", "ipc", "user", "cgroup"]);
        let probe = NamespaceInspector::new(root.path()).inspect(42);
        let report = probe.report().expect("available");
        assert_eq!(report.records.len(), 7);
        let kinds: Vec<_> = report.records.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, NamespaceKind::ALL);
        assert!(report.records.iter().all(|r| r.exists && r.inode.is_some()));
    }

    #[test]
    fn missing_kind_does_not_hide_others() {
        let root = fake_proc(7, &["pid", "net", "mnt", "uts", "ipc", "user"]);
        let probe = NamespaceInspector::new(root.path()).inspect(7);
        let report = probe.report().expect("available");
        let cgroup = record(report, NamespaceKind::Cgroup).expect("record");
        assert!(!cgroup.exists);
        assert!(cgroup.inode.is_none());
        assert!(cgroup.error.is_none());
        assert!(record(report, NamespaceKind::Pid).expect("record").exists);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_link_is_absent() {
        let root = fake_proc(9, &["pid"]);
        let ns = root.path().join("9").join("ns");
        std::os::unix::fs::symlink(ns.join("does-not-exist"), ns.join("net")).expect("symlink");
        let probe = NamespaceInspector::new(root.path()).inspect(9);
        let net = probe
            .report()
            .and_then(|r| record(r, NamespaceKind::Net))
            .expect("record");
        assert!(!net.exists);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_entry_carries_its_own_error() {
        let root = fake_proc(11, &["pid", "mnt"]);
        let ns = root.path().join("11").join("ns");
        std::os::unix::fs::symlink(ns.join("net"), ns.join("net")).expect("symlink");

        let probe = NamespaceInspector::new(root.path()).inspect(11);
        let report = probe.report().expect("available");
        let net = record(report, NamespaceKind::Net).expect("record");
        assert!(!net.exists);
        assert!(net.inode.is_none());
        assert!(net.error.is_some());
        assert!(record(report, NamespaceKind::Pid).expect("record").exists);
        assert!(record(report, NamespaceKind::Mnt).expect("record").exists);

        let json = serde_json::to_value(&probe).expect("serialize");
        assert!(json["namespaces"]["net"]["error"].is_string());
        assert_eq!(json["namespaces"]["pid"]["exists"], true);
        assert!(json["namespaces"]["pid"].get("error").is_none());
    }

    #[test]
    fn serializes_as_map_keyed_by_kind() {
        let root = fake_proc(3, &["pid"]);
        let probe = NamespaceInspector::new(root.path()).inspect(3);
        let json = serde_json::to_value(&probe).expect("serialize");
        assert_eq!(json["available"], true);
        assert_eq!(json["namespaces"]["pid"]["exists"], true);
        assert!(json["namespaces"]["pid"]["inode"].is_u64());
        assert_eq!(json["namespaces"]["net"]["exists"], false);
        assert!(json["namespaces"]["net"]["inode"].is_null());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn live_process_reports_pid_namespace() {
        let probe = NamespaceInspector::default().inspect_self();
        if let Some(report) = probe.report() {
            assert_eq!(report.records.len(), 7);
        }
    }
}
