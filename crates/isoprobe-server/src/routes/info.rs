//! System, isolation, and hardening information.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use isoprobe_common::types::{Probe, bytes_to_mb, round2};
use isoprobe_core::cgroup::CgroupReport;
use isoprobe_core::hardening::{self, SecurityWarning, UserInfo};
use isoprobe_core::namespace::NamespaceReport;
use isoprobe_core::system::{self, HostInfo};
use isoprobe_runtime::process;
use serde::Serialize;

use super::timestamp;
use crate::state::AppState;

const NAMESPACE_DESCRIPTION: &str =
    "Namespace isolation information for container security research";
const CGROUP_DESCRIPTION: &str = "Cgroup resource limits and configuration";
const CAPABILITIES_NOTE: &str = "Capability inspection requires external tools like capsh";

/// Process section of `GET /info`.
#[derive(Debug, Serialize)]
pub struct ProcessSummary {
    /// Process ID.
    pub pid: u32,
    /// Real user ID.
    pub uid: u32,
    /// Real group ID.
    pub gid: u32,
    /// Seconds since the service started.
    pub uptime_seconds: f64,
    /// Resident set size in MiB.
    pub memory_rss_mb: f64,
    /// Heap and anonymous data in MiB.
    pub memory_data_mb: f64,
}

/// Body of `GET /info`.
#[derive(Debug, Serialize)]
pub struct SystemInfo {
    /// Host description.
    #[serde(flatten)]
    pub host: HostInfo,
    /// Running process.
    pub process: ProcessSummary,
    /// RFC 3339 time of the report.
    pub timestamp: String,
}

/// A probe result preceded by a description line.
#[derive(Debug, Serialize)]
pub struct Described<T> {
    /// What the report shows.
    pub description: &'static str,
    /// The probe result.
    #[serde(flatten)]
    pub probe: Probe<T>,
}

/// Hardening section of `GET /info/security`.
#[derive(Debug, Serialize)]
pub struct Hardening {
    /// Whether the root filesystem rejects writes.
    pub read_only_filesystem: bool,
    /// Findings, most severe first.
    pub warnings: Vec<SecurityWarning>,
}

/// Static note about capability inspection.
#[derive(Debug, Serialize)]
pub struct CapabilitiesNote {
    /// Explanation.
    pub message: &'static str,
}

/// Body of `GET /info/security`.
#[derive(Debug, Serialize)]
pub struct SecurityInfo {
    /// Process credentials.
    pub user: UserInfo,
    /// Read-only root check and findings.
    pub hardening: Hardening,
    /// Capability note.
    pub capabilities: CapabilitiesNote,
    /// RFC 3339 time of the report.
    pub timestamp: String,
}

/// Security section of `GET /info/all`.
#[derive(Debug, Serialize)]
pub struct SecuritySummary {
    /// Process credentials.
    pub user: UserInfo,
    /// Whether the root filesystem rejects writes.
    pub read_only_filesystem: bool,
}

/// Body of `GET /info/all`.
#[derive(Debug, Serialize)]
pub struct CompleteInfo {
    /// Host and process.
    pub system: SystemInfo,
    /// Namespace identity.
    pub namespace: Probe<NamespaceReport>,
    /// Cgroup membership and limits.
    pub cgroup: Probe<CgroupReport>,
    /// Credentials and read-only root.
    pub security: SecuritySummary,
    /// RFC 3339 time of the report.
    pub timestamp: String,
}

fn system_info(state: &AppState) -> SystemInfo {
    let user = hardening::user_info();
    let memory = process::sample_memory();
    SystemInfo {
        host: system::host_info(),
        process: ProcessSummary {
            pid: std::process::id(),
            uid: user.uid,
            gid: user.gid,
            uptime_seconds: round2(state.metrics.uptime_seconds()),
            memory_rss_mb: bytes_to_mb(memory.rss_bytes),
            memory_data_mb: bytes_to_mb(memory.data_bytes),
        },
        timestamp: timestamp(),
    }
}

/// `GET /info`
pub async fn host(State(state): State<AppState>) -> Json<SystemInfo> {
    tracing::debug!("system info requested");
    Json(system_info(&state))
}

/// `GET /info/namespace`
pub async fn namespace(State(state): State<AppState>) -> Json<Described<NamespaceReport>> {
    tracing::debug!("namespace info requested");
    Json(Described {
        description: NAMESPACE_DESCRIPTION,
        probe: state.namespaces.inspect_self(),
    })
}

/// `GET /info/cgroup`
pub async fn cgroup(State(state): State<AppState>) -> Json<Described<CgroupReport>> {
    tracing::debug!("cgroup info requested");
    Json(Described {
        description: CGROUP_DESCRIPTION,
        probe: state.cgroups.inspect(),
    })
}

/// `GET /info/security`
pub async fn security(State(state): State<AppState>) -> Result<Json<SecurityInfo>, StatusCode> {
    tracing::debug!("security info requested");
    let root_dir = state.root_dir.clone();
    let status = blocking(move || hardening::security_status(&root_dir)).await?;
    Ok(Json(SecurityInfo {
        user: status.user,
        hardening: Hardening {
            read_only_filesystem: status.read_only_filesystem,
            warnings: status.warnings,
        },
        capabilities: CapabilitiesNote {
            message: CAPABILITIES_NOTE,
        },
        timestamp: timestamp(),
    }))
}

/// `GET /info/all`
pub async fn all(State(state): State<AppState>) -> Result<Json<CompleteInfo>, StatusCode> {
    tracing::debug!("complete system info requested");
    let root_dir = state.root_dir.clone();
    let read_only_filesystem = blocking(move || hardening::is_read_only(&root_dir)).await?;
    Ok(Json(CompleteInfo {
        system: system_info(&state),
        namespace: state.namespaces.inspect_self(),
        cgroup: state.cgroups.inspect(),
        security: SecuritySummary {
            user: hardening::user_info(),
            read_only_filesystem,
        },
        timestamp: timestamp(),
    }))
}

/// Runs a filesystem check on the blocking pool.
async fn blocking<T, F>(check: F) -> Result<T, StatusCode>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(check).await.map_err(|e| {
        tracing::error!(error = %e, "blocking check failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}
