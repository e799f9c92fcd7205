//! Session model - an authenticated login owned by Kratos.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Identity;

/// Session as returned by the Kratos admin API.
///
/// Revocation is one-way (active -> inactive) and always performed upstream.
/// Timestamps and device data stay untyped in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
