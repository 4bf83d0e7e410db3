use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::extraction::JobRecord;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ExtractRequest {
    pub page_text: String,
}

#[derive(Serialize)]
pub struct ExtractResponse {
    pub jobs: Vec<JobRecord>,
}

/// POST /api/v1/jobs/extract
pub async fn handle_extract(
    State(state): State<AppState>,
    Json(req): Json<ExtractRequest>,
) -> Result<Json<ExtractResponse>, AppError> {
    let jobs = state.extractor.extract(&req.page_text).await?;
    Ok(Json(ExtractResponse { jobs }))
}
