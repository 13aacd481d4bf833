//! HTTP routes and router assembly.

pub mod health;
pub mod index;
pub mod info;
pub mod legacy;
pub mod metrics;
pub mod stress;

use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::get;
use chrono::{SecondsFormat, Utc};

use crate::middleware;
use crate::state::AppState;

/// Builds the application router with every route and middleware layer.
///
/// Layers run outermost first: security headers, CORS, access log, then
/// the metrics counter. CORS preflights are answered before they reach
/// the counter.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index::index))
        .route("/health", get(health::health))
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .route("/health/startup", get(health::startup))
        .route("/info", get(info::host))
        .route("/info/namespace", get(info::namespace))
        .route("/info/cgroup", get(info::cgroup))
        .route("/info/security", get(info::security))
        .route("/info/all", get(info::all))
        .route("/stress/cpu", get(stress::cpu))
        .route("/stress/memory", get(stress::memory))
        .route("/stress/disk", get(stress::disk))
        .route("/stress/combined", get(stress::combined))
        .route("/metrics", get(metrics::export))
        .route("/namespace", get(legacy::namespace))
        .route("/cgroup", get(legacy::cgroup))
        .route("/compute", get(legacy::compute))
        .route("/memory", get(legacy::memory))
        .fallback(index::not_found)
        .layer(from_fn_with_state(state.clone(), middleware::track_metrics))
        .layer(from_fn(middleware::log_requests))
        .layer(from_fn_with_state(state.clone(), middleware::cors))
        .layer(from_fn(middleware::security_headers))
        .with_state(state)
}

/// Current UTC time in RFC 3339 with millisecond precision.
pub(crate) fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
