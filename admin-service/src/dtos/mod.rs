pub mod auth;
pub mod identity;
pub mod session;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub use auth::{LoginRequest, LoginResponse};
pub use identity::{GetIdentityQuery, IdentityListResponse, IdentityRequest, ResetPasswordRequest};
pub use session::{SessionListResponse, StatsResponse};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PER_PAGE: i64 = 20;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Failed to fetch identities")]
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "list identities: upstream returned 503: unavailable")]
    pub details: Option<String>,
}

/// `{ "data": [...] }` envelope used by unpaginated list endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: Vec<T>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
}

/// `?page=&per_page=`, both optional and 1-based.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationQuery {
    /// Page number, starting at 1 (default 1)
    pub page: Option<i64>,
    /// Items per page (default 20)
    pub per_page: Option<i64>,
}

impl PaginationQuery {
    /// Resolves defaults; rejects values below 1.
    pub fn resolve(&self) -> Result<(usize, usize), String> {
        let page = self.page.unwrap_or(DEFAULT_PAGE);
        let per_page = self.per_page.unwrap_or(DEFAULT_PER_PAGE);

        if page < 1 {
            return Err("page must be at least 1".to_string());
        }
        if per_page < 1 {
            return Err("per_page must be at least 1".to_string());
        }

        Ok((page as usize, per_page as usize))
    }
}
