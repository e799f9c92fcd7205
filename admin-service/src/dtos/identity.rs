use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::{Identity, IdentityState};

/// Body of create and (full-replace) update.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct IdentityRequest {
    #[validate(length(min = 1, message = "schema_id is required"))]
    #[schema(example = "default")]
    pub schema_id: String,

    /// Trait document; must be a JSON object matching the schema.
    #[schema(value_type = Object, example = json!({"email": "ada@example.com"}))]
    pub traits: Map<String, Value>,

    /// `active` or `inactive`; omitted or empty leaves the upstream default.
    #[serde(default)]
    #[schema(example = "active")]
    pub state: Option<String>,
}

impl IdentityRequest {
    pub fn parsed_state(&self) -> Result<Option<IdentityState>, String> {
        match self.state.as_deref() {
            None | Some("") => Ok(None),
            Some(s) => s.parse().map(Some),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "newpassword123", min_length = 8)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GetIdentityQuery {
    /// Include credential metadata (totp, password, oidc, webauthn, lookup_secret)
    #[serde(default)]
    pub include_credentials: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IdentityListResponse {
    pub data: Vec<Identity>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
}
