//! Bounded workload endpoints.
//!
//! Query values are passed through raw; the engine clamps them. Failures
//! answer 500, or 504 when the request timeout expired first.

use std::collections::HashMap;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use isoprobe_runtime::engine::WorkloadOutcome;
use isoprobe_runtime::workload::FailureCause;

use crate::state::AppState;

type Params = Query<HashMap<String, String>>;

fn param<'a>(params: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    params.get(name).map(String::as_str)
}

fn respond(outcome: WorkloadOutcome) -> Response {
    match outcome {
        Ok(report) => Json(report).into_response(),
        Err(failure) => {
            let status = match failure.cause {
                FailureCause::Timeout => StatusCode::GATEWAY_TIMEOUT,
                FailureCause::Resource | FailureCause::Internal => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            (status, Json(failure)).into_response()
        }
    }
}

/// `GET /stress/cpu?iterations=N`
pub async fn cpu(State(state): State<AppState>, Query(params): Params) -> Response {
    respond(state.engine.cpu(param(&params, "iterations")).await)
}

/// `GET /stress/memory?size=N`
pub async fn memory(State(state): State<AppState>, Query(params): Params) -> Response {
    respond(state.engine.memory(param(&params, "size")).await)
}

/// `GET /stress/disk?operations=N`
pub async fn disk(State(state): State<AppState>, Query(params): Params) -> Response {
    respond(state.engine.disk(param(&params, "operations")).await)
}

/// `GET /stress/combined?iterations=N&size=M`
pub async fn combined(State(state): State<AppState>, Query(params): Params) -> Response {
    respond(
        state
            .engine
            .combined(param(&params, "iterations"), param(&params, "size"))
            .await,
    )
}
