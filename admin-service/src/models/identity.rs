//! Identity model - a user record owned by Kratos.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Credential types that can be requested alongside an identity.
pub const INCLUDED_CREDENTIAL_TYPES: [&str; 5] =
    ["totp", "password", "oidc", "webauthn", "lookup_secret"];

/// Identity state codes, as defined by Kratos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum IdentityState {
    Active,
    Inactive,
}

impl std::str::FromStr for IdentityState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(IdentityState::Active),
            "inactive" => Ok(IdentityState::Inactive),
            _ => Err(format!("Invalid identity state: {}", s)),
        }
    }
}

/// Identity as returned by the Kratos admin API.
///
/// Only the fields this service reasons about are typed. Everything else
/// (addresses, metadata, timestamps the UI displays) is kept in `extra` and
/// written back out unchanged, timestamps included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub schema_id: String,
    /// Schema-dependent trait document, left untyped.
    #[serde(default)]
    pub traits: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<IdentityState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Identity {
    pub fn is_active(&self) -> bool {
        self.state == Some(IdentityState::Active)
    }
}
