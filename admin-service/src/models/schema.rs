use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Identity schema with its JSON Schema document inlined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IdentitySchema {
    pub id: String,
    #[schema(value_type = Object)]
    pub schema: Value,
}
