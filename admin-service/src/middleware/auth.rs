use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::AppState;

/// Subject of the validated bearer token, stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPrincipal(pub String);

/// Rejects the request with 401 unless it carries a valid
/// `Authorization: Bearer <token>` header. Runs before any protected
/// handler and performs no I/O.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Authorization header required")))?;

    let token = header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!("Invalid authorization header format"))
        })?;

    let subject = state.jwt.validate(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        AppError::from(e)
    })?;

    req.extensions_mut().insert(AdminPrincipal(subject));

    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminPrincipal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminPrincipal>()
            .cloned()
            .ok_or_else(|| {
                AppError::InternalError(anyhow::anyhow!(
                    "Auth principal missing from request extensions"
                ))
            })
    }
}
