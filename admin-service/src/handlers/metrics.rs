use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::AppState;

/// Prometheus exposition of the HTTP metrics. 404 when no recorder is
/// installed (tests, embedded use).
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
