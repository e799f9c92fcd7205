use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Session;

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionListResponse {
    pub data: Vec<Session>,
    pub page: usize,
    pub per_page: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    #[schema(example = 42)]
    pub active_identities: usize,
    #[schema(example = 7)]
    pub active_sessions: usize,
}
