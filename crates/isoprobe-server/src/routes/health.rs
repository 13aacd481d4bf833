//! Liveness, readiness, and startup probes.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use isoprobe_common::constants::STARTUP_GRACE_SECS;
use isoprobe_common::types::round2;
use isoprobe_runtime::process::{self, MemoryUsage};
use serde::Serialize;

use super::timestamp;
use crate::state::AppState;

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    /// Always `healthy`.
    pub status: &'static str,
    /// Seconds since the service started.
    pub uptime_seconds: f64,
    /// Process memory in MiB.
    pub memory: MemoryUsage,
    /// RFC 3339 time of the report.
    pub timestamp: String,
}

/// Body of the probe endpoints.
#[derive(Debug, Serialize)]
pub struct ProbeStatus {
    /// Probe state.
    pub status: &'static str,
    /// Seconds since the service started, when relevant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime_seconds: Option<f64>,
    /// RFC 3339 time of the report.
    pub timestamp: String,
}

impl ProbeStatus {
    fn new(status: &'static str, uptime_seconds: Option<f64>) -> Json<Self> {
        Json(Self {
            status,
            uptime_seconds,
            timestamp: timestamp(),
        })
    }
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    let uptime_seconds = round2(state.metrics.uptime_seconds());
    tracing::debug!(uptime_seconds, "health check requested");
    Json(HealthReport {
        status: "healthy",
        uptime_seconds,
        memory: process::sample_memory().usage(),
        timestamp: timestamp(),
    })
}

/// `GET /health/live`
pub async fn live() -> Json<ProbeStatus> {
    ProbeStatus::new("alive", None)
}

/// `GET /health/ready`
///
/// The service has no external dependencies, so it is ready once it
/// accepts connections.
pub async fn ready() -> Json<ProbeStatus> {
    ProbeStatus::new("ready", None)
}

/// `GET /health/startup`: 503 until the startup grace period has passed.
pub async fn startup(State(state): State<AppState>) -> (StatusCode, Json<ProbeStatus>) {
    let uptime = state.metrics.uptime_seconds();
    if uptime > STARTUP_GRACE_SECS {
        (StatusCode::OK, ProbeStatus::new("started", Some(round2(uptime))))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            ProbeStatus::new("starting", Some(round2(uptime))),
        )
    }
}
