//! Risk Record Routes

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiError;
use crate::AppState;
use storage::RiskRecord;

/// Query parameters for the records endpoint
#[derive(Debug, Deserialize)]
pub struct RecordQuery {
    /// Maximum number of records
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

/// Response for the records endpoint
#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub data: Vec<RiskRecord>,
    pub count: usize,
}

/// Most recently persisted risk levels, newest first
pub async fn get_records(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecordQuery>,
) -> Result<Json<RecordResponse>, ApiError> {
    let limit = params.limit.min(500);
    let data = state.repository.recent(limit)?;

    Ok(Json(RecordResponse {
        count: data.len(),
        data,
    }))
}
