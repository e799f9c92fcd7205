use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{
    dtos::{LoginRequest, LoginResponse},
    utils::ValidatedJson,
    AppState,
};

/// Exchange the admin password for a bearer token
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Invalid request body", body = ErrorResponse),
        (status = 401, description = "Invalid password", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let issued = state.jwt.issue(&req.password).map_err(|e| {
        tracing::warn!(error = %e, "Admin login failed");
        AppError::from(e)
    })?;

    tracing::info!(expires_at = issued.expires_at, "Admin logged in");

    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            token: issued.token,
            expires_at: issued.expires_at,
        }),
    ))
}
