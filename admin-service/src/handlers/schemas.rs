use axum::{extract::State, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{dtos::DataResponse, AppState};

/// List identity schemas with their JSON Schema documents
#[utoipa::path(
    get,
    path = "/api/schemas",
    responses(
        (status = 200, description = "`{data: [{id, schema}]}`"),
        (status = 500, description = "Upstream failure", body = ErrorResponse)
    ),
    tag = "Schemas",
    security(("bearer_auth" = []))
)]
pub async fn list_schemas(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let schemas = state
        .kratos
        .list_identity_schemas()
        .await
        .map_err(|e| e.into_app_error("Failed to fetch schemas"))?;

    Ok(Json(DataResponse { data: schemas }))
}
