//! The seven namespace kinds exposed under `/proc/<pid>/ns`.

use std::fmt;

use serde::Serialize;

/// A Linux namespace kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NamespaceKind {
    /// Process ID space.
    Pid,
    /// Network stack.
    Net,
    /// Mount table.
    Mnt,
    /// Hostname and domain name.
    Uts,
    /// System V IPC and POSIX message queues.
    Ipc,
    /// User and group ID mappings.
    User,
    /// Cgroup root view.
    Cgroup,
}

impl NamespaceKind {
    /// Every kind, in report order.
    pub const ALL: [Self; 7] = [
        Self::Pid,
        Self::Net,
        Self::Mnt,
        Self::Uts,
        Self::Ipc,
        Self::User,
        Self::Cgroup,
    ];

    /// Entry name under `/proc/<pid>/ns`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pid => "pid",
            Self::Net => "net",
            Self::Mnt => "mnt",
            Self::Uts => "uts",
            Self::Ipc => "ipc",
            Self::User => "user",
            Self::Cgroup => "cgroup",
        }
    }
}

impl fmt::Display for NamespaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
