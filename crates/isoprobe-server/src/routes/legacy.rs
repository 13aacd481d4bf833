//! Redirects kept for clients of the first API layout.

use axum::extract::RawQuery;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

fn found(path: &str, query: Option<String>) -> Response {
    let location = match query {
        Some(q) if !q.is_empty() => format!("{path}?{q}"),
        _ => path.to_string(),
    };
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// `GET /namespace`
pub async fn namespace(RawQuery(query): RawQuery) -> Response {
    found("/info/namespace", query)
}

/// `GET /cgroup`
pub async fn cgroup(RawQuery(query): RawQuery) -> Response {
    found("/info/cgroup", query)
}

/// `GET /compute`
pub async fn compute(RawQuery(query): RawQuery) -> Response {
    found("/stress/cpu", query)
}

/// `GET /memory`
pub async fn memory(RawQuery(query): RawQuery) -> Response {
    found("/stress/memory", query)
}
