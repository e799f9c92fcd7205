use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Bad request: {message}")]
    BadRequest {
        message: String,
        details: Option<String>,
    },

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Unauthorized: {0}")]
    Unauthorized(anyhow::Error),

    /// Failure reported by (or while talking to) an upstream dependency.
    /// `details` is returned to the caller verbatim.
    #[error("{message}: {details}")]
    UpstreamError { message: String, details: String },

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest {
            message: message.into(),
            details: None,
        }
    }

    pub fn invalid_body(details: impl ToString) -> Self {
        AppError::BadRequest {
            message: "Invalid request body".to_string(),
            details: Some(details.to_string()),
        }
    }

    pub fn upstream(message: impl Into<String>, details: impl ToString) -> Self {
        AppError::UpstreamError {
            message: message.into(),
            details: details.to_string(),
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            AppError::ValidationError(err) => (
                StatusCode::BAD_REQUEST,
                "Invalid request body".to_string(),
                Some(err.to_string()),
            ),
            AppError::BadRequest { message, details } => {
                (StatusCode::BAD_REQUEST, message, details)
            }
            AppError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string(), None),
            AppError::Unauthorized(err) => (StatusCode::UNAUTHORIZED, err.to_string(), None),
            AppError::UpstreamError { message, details } => {
                (StatusCode::INTERNAL_SERVER_ERROR, message, Some(details))
            }
            AppError::InternalError(err) => {
                tracing::error!(error = ?err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    Some(err.to_string()),
                )
            }
            AppError::ConfigError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration error".to_string(),
                Some(err.to_string()),
            ),
        };

        (status, Json(ErrorResponse { error, details })).into_response()
    }
}
