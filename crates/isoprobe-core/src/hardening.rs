//! Container hardening checks: non-root execution and read-only root.

use std::io::ErrorKind;
use std::path::Path;

use serde::Serialize;

/// Credentials of the running process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UserInfo {
    /// Real user ID.
    pub uid: u32,
    /// Real group ID.
    pub gid: u32,
    /// Whether the process runs as UID 0.
    pub is_root: bool,
}

/// Returns the credentials of the running process.
pub fn user_info() -> UserInfo {
    let uid = nix::unistd::getuid().as_raw();
    let gid = nix::unistd::getgid().as_raw();
    UserInfo {
        uid,
        gid,
        is_root: uid == 0,
    }
}

/// Checks whether `dir` rejects writes.
///
/// Creates and removes a probe file. `EROFS` and `EACCES` mean read-only;
/// any other failure is reported as writable, since it says nothing about
/// the mount flags.
pub fn is_read_only(dir: &Path) -> bool {
    let probe = dir.join(format!(".isoprobe-write-test-{}", std::process::id()));
    match std::fs::write(&probe, b"test") {
        Ok(()) => {
            if let Err(e) = std::fs::remove_file(&probe) {
                tracing::warn!(path = %probe.display(), error = %e, "failed to remove write probe");
            }
            false
        }
        Err(e) => {
            e.raw_os_error() == Some(libc::EROFS)
                || e.raw_os_error() == Some(libc::EACCES)
                || e.kind() == ErrorKind::PermissionDenied
        }
    }
}

/// Severity of a hardening finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Directly weakens isolation.
    High,
    /// Widens the attack surface.
    Medium,
}

/// A hardening finding with a remedy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityWarning {
    /// Severity of the finding.
    pub severity: Severity,
    /// What was observed.
    pub message: String,
    /// How to fix it.
    pub recommendation: String,
}

/// Hardening summary of the running process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityStatus {
    /// Process credentials.
    pub user: UserInfo,
    /// Whether the root filesystem rejects writes.
    pub read_only_filesystem: bool,
    /// Findings, most severe first.
    pub warnings: Vec<SecurityWarning>,
}

/// Derives findings from the observed state.
pub fn security_warnings(user: &UserInfo, read_only_root: bool) -> Vec<SecurityWarning> {
    let mut warnings = Vec::new();
    if user.is_root {
        warnings.push(SecurityWarning {
            severity: Severity::High,
            message: "Application running as root user (UID 0)".to_string(),
            recommendation: "Use non-root user (e.g., --user 1000:1000)".to_string(),
        });
    }
    if !read_only_root {
        warnings.push(SecurityWarning {
            severity: Severity::Medium,
            message: "Filesystem is writable".to_string(),
            recommendation: "Use read-only filesystem (--read-only with --tmpfs /tmp)".to_string(),
        });
    }
    warnings
}

/// Collects the hardening summary, probing `root` for writability.
pub fn security_status(root: &Path) -> SecurityStatus {
    let user = user_info();
    let read_only_filesystem = is_read_only(root);
    SecurityStatus {
        user,
        read_only_filesystem,
        warnings: security_warnings(&user, read_only_filesystem),
    }
}
