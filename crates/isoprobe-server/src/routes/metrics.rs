//! Text metrics export.

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use isoprobe_common::constants::METRICS_CONTENT_TYPE;

use crate::state::AppState;

/// `GET /metrics`
pub async fn export(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, METRICS_CONTENT_TYPE)],
        state.metrics.snapshot().to_text(),
    )
}
