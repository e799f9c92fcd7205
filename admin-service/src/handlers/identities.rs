use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{
        DataResponse, GetIdentityQuery, IdentityListResponse, IdentityRequest, PaginationQuery,
        ResetPasswordRequest,
    },
    middleware::AdminPrincipal,
    services::{CreateIdentityBody, UpdateIdentityBody},
    utils::ValidatedJson,
    AppState,
};

/// List identities, one page at a time
#[utoipa::path(
    get,
    path = "/api/identities",
    params(PaginationQuery),
    responses(
        (status = 200, description = "`{data, page, per_page, total}`"),
        (status = 400, description = "Invalid pagination", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Upstream failure", body = ErrorResponse)
    ),
    tag = "Identities",
    security(("bearer_auth" = []))
)]
pub async fn list_identities(
    State(state): State<AppState>,
    query: Result<Query<PaginationQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query.map_err(|e| AppError::bad_request(e.body_text()))?;
    let (page, per_page) = query.resolve().map_err(AppError::bad_request)?;

    let result = state
        .kratos
        .list_identities(page, per_page)
        .await
        .map_err(|e| e.into_app_error("Failed to fetch identities"))?;

    Ok(Json(IdentityListResponse {
        data: result.identities,
        page,
        per_page,
        total: result.total,
    }))
}

/// Get one identity, optionally with credential metadata
#[utoipa::path(
    get,
    path = "/api/identities/{id}",
    params(
        ("id" = String, Path, description = "Identity ID"),
        GetIdentityQuery
    ),
    responses(
        (status = 200, description = "Identity"),
        (status = 404, description = "Identity not found", body = ErrorResponse),
        (status = 500, description = "Upstream failure", body = ErrorResponse)
    ),
    tag = "Identities",
    security(("bearer_auth" = []))
)]
pub async fn get_identity(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<GetIdentityQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query.map_err(|e| AppError::bad_request(e.body_text()))?;

    let identity = if query.include_credentials {
        state.kratos.get_identity_with_credentials(&id).await
    } else {
        state.kratos.get_identity(&id).await
    }
    .map_err(|e| e.into_app_error("Failed to fetch identity"))?;

    Ok(Json(identity))
}

/// Create an identity
#[utoipa::path(
    post,
    path = "/api/identities",
    request_body = IdentityRequest,
    responses(
        (status = 201, description = "Created identity"),
        (status = 400, description = "Invalid request body", body = ErrorResponse),
        (status = 500, description = "Upstream failure", body = ErrorResponse)
    ),
    tag = "Identities",
    security(("bearer_auth" = []))
)]
pub async fn create_identity(
    State(state): State<AppState>,
    principal: AdminPrincipal,
    ValidatedJson(req): ValidatedJson<IdentityRequest>,
) -> Result<impl IntoResponse, AppError> {
    let state_value = req.parsed_state().map_err(AppError::invalid_body)?;

    let body = CreateIdentityBody {
        schema_id: req.schema_id,
        traits: req.traits.into(),
        state: state_value,
    };

    let identity = state
        .kratos
        .create_identity(&body)
        .await
        .map_err(|e| e.into_app_error("Failed to create identity"))?;

    tracing::info!(actor = %principal.0, identity_id = %identity.id, "Identity created via admin API");
    Ok((StatusCode::CREATED, Json(identity)))
}

/// Replace an identity's schema, traits and state
#[utoipa::path(
    put,
    path = "/api/identities/{id}",
    params(("id" = String, Path, description = "Identity ID")),
    request_body = IdentityRequest,
    responses(
        (status = 200, description = "Updated identity"),
        (status = 400, description = "Invalid request body", body = ErrorResponse),
        (status = 404, description = "Identity not found", body = ErrorResponse),
        (status = 500, description = "Upstream failure", body = ErrorResponse)
    ),
    tag = "Identities",
    security(("bearer_auth" = []))
)]
pub async fn update_identity(
    State(state): State<AppState>,
    principal: AdminPrincipal,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<IdentityRequest>,
) -> Result<impl IntoResponse, AppError> {
    let state_value = req.parsed_state().map_err(AppError::invalid_body)?;

    let body = UpdateIdentityBody {
        schema_id: req.schema_id,
        traits: req.traits.into(),
        state: state_value,
        credentials: None,
    };

    let identity = state
        .kratos
        .update_identity(&id, &body)
        .await
        .map_err(|e| e.into_app_error("Failed to update identity"))?;

    tracing::info!(actor = %principal.0, identity_id = %id, "Identity updated via admin API");
    Ok(Json(identity))
}

/// Delete an identity
#[utoipa::path(
    delete,
    path = "/api/identities/{id}",
    params(("id" = String, Path, description = "Identity ID")),
    responses(
        (status = 204, description = "Identity deleted"),
        (status = 404, description = "Identity not found", body = ErrorResponse),
        (status = 500, description = "Upstream failure", body = ErrorResponse)
    ),
    tag = "Identities",
    security(("bearer_auth" = []))
)]
pub async fn delete_identity(
    State(state): State<AppState>,
    principal: AdminPrincipal,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state
        .kratos
        .delete_identity(&id)
        .await
        .map_err(|e| e.into_app_error("Failed to delete identity"))?;

    tracing::info!(actor = %principal.0, identity_id = %id, "Identity deleted via admin API");
    Ok(StatusCode::NO_CONTENT)
}

/// List the sessions of one identity
#[utoipa::path(
    get,
    path = "/api/identities/{id}/sessions",
    params(("id" = String, Path, description = "Identity ID")),
    responses(
        (status = 200, description = "`{data: [...]}`"),
        (status = 404, description = "Identity not found", body = ErrorResponse),
        (status = 500, description = "Upstream failure", body = ErrorResponse)
    ),
    tag = "Identities",
    security(("bearer_auth" = []))
)]
pub async fn get_identity_sessions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let sessions = state
        .kratos
        .get_identity_sessions(&id)
        .await
        .map_err(|e| e.into_app_error("Failed to fetch sessions"))?;

    Ok(Json(DataResponse { data: sessions }))
}

/// Set a new password for an identity
#[utoipa::path(
    post,
    path = "/api/identities/{id}/password",
    params(("id" = String, Path, description = "Identity ID")),
    request_body = ResetPasswordRequest,
    responses(
        (status = 204, description = "Password updated"),
        (status = 400, description = "Password too short", body = ErrorResponse),
        (status = 404, description = "Identity not found", body = ErrorResponse),
        (status = 500, description = "Upstream failure", body = ErrorResponse)
    ),
    tag = "Identities",
    security(("bearer_auth" = []))
)]
pub async fn reset_password(
    State(state): State<AppState>,
    principal: AdminPrincipal,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .kratos
        .reset_password(&id, &req.password)
        .await
        .map_err(|e| e.into_app_error("Failed to reset password"))?;

    tracing::info!(actor = %principal.0, identity_id = %id, "Password reset via admin API");
    Ok(StatusCode::NO_CONTENT)
}

/// Remove a second-factor credential (totp, webauthn, lookup_secret)
#[utoipa::path(
    delete,
    path = "/api/identities/{id}/credentials/{credential_type}",
    params(
        ("id" = String, Path, description = "Identity ID"),
        ("credential_type" = String, Path, description = "totp, webauthn or lookup_secret")
    ),
    responses(
        (status = 204, description = "Credential removed"),
        (status = 400, description = "Unsupported credential type", body = ErrorResponse),
        (status = 404, description = "Identity not found", body = ErrorResponse),
        (status = 500, description = "Upstream failure", body = ErrorResponse)
    ),
    tag = "Identities",
    security(("bearer_auth" = []))
)]
pub async fn delete_credential(
    State(state): State<AppState>,
    principal: AdminPrincipal,
    Path((id, credential_type)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    state
        .kratos
        .delete_credential(&id, &credential_type)
        .await
        .map_err(|e| e.into_app_error("Failed to delete credential"))?;

    tracing::info!(
        actor = %principal.0,
        identity_id = %id,
        credential_type = %credential_type,
        "Credential deleted via admin API"
    );
    Ok(StatusCode::NO_CONTENT)
}
