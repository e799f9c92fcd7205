use service_core::error::AppError;
use thiserror::Error;

/// Failures of the Kratos gateway. Every upstream failure names the
/// operation (and identifier, where there is one) it happened in.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("{}: not found", describe(.operation, .id))]
    NotFound { operation: &'static str, id: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("{operation}: upstream returned {status}: {body}")]
    Upstream {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("{operation}: request failed: {source}")]
    Transport {
        operation: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation}: failed to decode response: {source}")]
    Decode {
        operation: String,
        #[source]
        source: serde_json::Error,
    },
}

impl GatewayError {
    /// Maps to the HTTP error envelope. `context` becomes the `error` field of
    /// upstream failures; the gateway error text goes to `details`.
    pub fn into_app_error(self, context: &str) -> AppError {
        match self {
            GatewayError::NotFound { .. } => AppError::NotFound(anyhow::anyhow!(self.to_string())),
            GatewayError::InvalidArgument(msg) => AppError::bad_request(msg),
            other => AppError::upstream(context, other),
        }
    }
}

/// `operation` followed by `id` when there is one.
pub(crate) fn describe(operation: &str, id: &str) -> String {
    if id.is_empty() {
        operation.to_string()
    } else {
        format!("{} {}", operation, id)
    }
}

/// Failures of the admin token service.
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Invalid password")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Failed to generate token: {0}")]
    Signing(jsonwebtoken::errors::Error),
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(e) => {
                AppError::InternalError(anyhow::anyhow!("Failed to generate token: {}", e))
            }
            other => AppError::Unauthorized(anyhow::anyhow!(other.to_string())),
        }
    }
}
