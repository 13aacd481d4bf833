//! Request middleware: metrics, access log, security headers, and CORS.

use std::net::SocketAddr;
use std::time::Instant;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::state::AppState;

const SECURITY_HEADERS: [(&str, &str); 6] = [
    ("x-content-type-options", "nosniff"),
    ("x-xss-protection", "1; mode=block"),
    ("x-frame-options", "DENY"),
    (
        "content-security-policy",
        "default-src 'self'; script-src 'self'; style-src 'self'; img-src 'self' data:;",
    ),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    ("permissions-policy", "geolocation=(), microphone=(), camera=()"),
];

const CORS_ALLOW_METHODS: &str = "GET, POST, OPTIONS";
const CORS_ALLOW_HEADERS: &str = "Content-Type, Authorization";
const CORS_MAX_AGE_SECS: &str = "86400";

/// Counts every request, and every response with status 400 or above as
/// an error.
pub async fn track_metrics(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    state.metrics.record_request();
    let response = next.run(request).await;
    if response.status().as_u16() >= 400 {
        state.metrics.record_error();
    }
    response
}

/// Emits one event per request once the response is ready.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    if status >= 500 {
        tracing::error!(%method, %path, status, duration_ms, ip = ip.as_deref(), "HTTP request");
    } else if status >= 400 {
        tracing::warn!(%method, %path, status, duration_ms, ip = ip.as_deref(), "HTTP request");
    } else {
        tracing::info!(%method, %path, status, duration_ms, ip = ip.as_deref(), "HTTP request");
    }
    response
}

/// Adds the fixed hardening headers to every response.
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    for (name, value) in SECURITY_HEADERS {
        let _ = headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    response
}

/// Applies the configured cross-origin policy.
///
/// Does nothing when CORS is disabled. Preflight `OPTIONS` requests are
/// answered directly with 204.
pub async fn cors(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let cors = &state.config.cors;
    if !cors.enabled {
        return next.run(request).await;
    }

    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let allow_origin = cors
        .allows(origin.as_deref())
        .then(|| origin.unwrap_or_else(|| "*".to_string()));

    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };
    apply_cors_headers(response.headers_mut(), allow_origin.as_deref());
    response
}

fn apply_cors_headers(headers: &mut HeaderMap, allow_origin: Option<&str>) {
    let allowed = allow_origin.and_then(|o| HeaderValue::from_str(o).ok().map(|v| (o, v)));
    if let Some((origin, value)) = allowed {
        let _ = headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
        // An echoed origin makes the response depend on the request.
        if origin != "*" {
            let _ = headers.append(header::VARY, HeaderValue::from_static("Origin"));
        }
    }
    let _ = headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(CORS_ALLOW_METHODS),
    );
    let _ = headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(CORS_ALLOW_HEADERS),
    );
    let _ = headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static(CORS_MAX_AGE_SECS),
    );
}
