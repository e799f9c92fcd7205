use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{PaginationQuery, SessionListResponse},
    middleware::AdminPrincipal,
    AppState,
};

/// List sessions
///
/// Kratos pages sessions by size only, so `page` is echoed back but the
/// first `per_page` sessions are returned and no total is reported.
#[utoipa::path(
    get,
    path = "/api/sessions",
    params(PaginationQuery),
    responses(
        (status = 200, description = "`{data, page, per_page}`"),
        (status = 400, description = "Invalid pagination", body = ErrorResponse),
        (status = 500, description = "Upstream failure", body = ErrorResponse)
    ),
    tag = "Sessions",
    security(("bearer_auth" = []))
)]
pub async fn list_sessions(
    State(state): State<AppState>,
    query: Result<Query<PaginationQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query.map_err(|e| AppError::bad_request(e.body_text()))?;
    let (page, per_page) = query.resolve().map_err(AppError::bad_request)?;

    let sessions = state
        .kratos
        .list_sessions(page, per_page)
        .await
        .map_err(|e| e.into_app_error("Failed to fetch sessions"))?;

    Ok(Json(SessionListResponse {
        data: sessions,
        page,
        per_page,
    }))
}

/// Revoke (disable) a session
#[utoipa::path(
    delete,
    path = "/api/sessions/{id}",
    params(("id" = String, Path, description = "Session ID")),
    responses(
        (status = 204, description = "Session revoked"),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 500, description = "Upstream failure", body = ErrorResponse)
    ),
    tag = "Sessions",
    security(("bearer_auth" = []))
)]
pub async fn revoke_session(
    State(state): State<AppState>,
    principal: AdminPrincipal,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state
        .kratos
        .revoke_session(&id)
        .await
        .map_err(|e| e.into_app_error("Failed to revoke session"))?;

    tracing::info!(actor = %principal.0, session_id = %id, "Session revoked via admin API");
    Ok(StatusCode::NO_CONTENT)
}
