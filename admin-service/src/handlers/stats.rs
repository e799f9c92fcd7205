use axum::{extract::State, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{dtos::StatsResponse, AppState};

/// Dashboard counters
#[utoipa::path(
    get,
    path = "/api/stats",
    responses(
        (status = 200, description = "Active identity and session counts", body = StatsResponse),
        (status = 500, description = "Upstream failure", body = ErrorResponse)
    ),
    tag = "Stats",
    security(("bearer_auth" = []))
)]
pub async fn get_stats(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let active_identities = state
        .kratos
        .get_active_identity_count()
        .await
        .map_err(|e| e.into_app_error("Failed to fetch active identity count"))?;

    let active_sessions = state
        .kratos
        .get_session_count()
        .await
        .map_err(|e| e.into_app_error("Failed to fetch session count"))?;

    Ok(Json(StatsResponse {
        active_identities,
        active_sessions,
    }))
}
