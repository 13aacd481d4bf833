//! Service catalogue and the not-found fallback.

use axum::Json;
use axum::http::{Method, StatusCode, Uri};
use axum::response::IntoResponse;
use isoprobe_common::constants::APP_TITLE;
use isoprobe_core::system;
use serde_json::{Value, json};

use super::timestamp;

/// `GET /`: name, version, and endpoint catalogue.
pub async fn index() -> Json<Value> {
    Json(json!({
        "name": APP_TITLE,
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Service for testing container namespace and cgroup isolation",
        "endpoints": {
            "root": {
                "path": "GET /",
                "description": "API information",
            },
            "health": {
                "path": "GET /health",
                "description": "Health check with basic metrics",
                "sub_endpoints": [
                    "GET /health/live - Liveness probe",
                    "GET /health/ready - Readiness probe",
                    "GET /health/startup - Startup probe",
                ],
            },
            "info": {
                "path": "GET /info",
                "description": "System information",
                "sub_endpoints": [
                    "GET /info/namespace - Namespace isolation",
                    "GET /info/cgroup - Cgroup configuration",
                    "GET /info/security - Security status",
                    "GET /info/all - Complete system overview",
                ],
            },
            "stress": {
                "path": "GET /stress",
                "description": "Stress testing endpoints",
                "sub_endpoints": [
                    "GET /stress/cpu?iterations=N - CPU stress test",
                    "GET /stress/memory?size=N - Memory stress test (MB)",
                    "GET /stress/combined?iterations=N&size=M - Combined test",
                    "GET /stress/disk?operations=N - Disk I/O test",
                ],
            },
            "metrics": {
                "path": "GET /metrics",
                "description": "Text-format metrics",
            },
            "legacy": {
                "description": "Legacy endpoints (backward compatibility)",
                "endpoints": [
                    "GET /namespace - Redirects to /info/namespace",
                    "GET /cgroup - Redirects to /info/cgroup",
                    "GET /compute - Redirects to /stress/cpu",
                    "GET /memory - Redirects to /stress/memory",
                ],
            },
        },
        "hostname": system::hostname(),
        "timestamp": timestamp(),
    }))
}

/// Fallback for unknown routes.
pub async fn not_found(method: Method, uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Not Found",
            "message": format!("Endpoint {method} {} not found", uri.path()),
            "available_endpoints": ["/", "/health", "/info", "/stress", "/metrics"],
        })),
    )
}
