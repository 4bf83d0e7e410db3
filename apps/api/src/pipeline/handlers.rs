use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::pipeline::JobOutcome;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct GenerateRequest {
    pub url: Option<String>,
    pub page_text: Option<String>,
}

#[derive(Serialize)]
pub struct GenerateResponse {
    pub results: Vec<JobOutcome>,
}

/// POST /api/v1/emails/generate
/// Takes either a posting URL to fetch or already-scraped page text.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let cancel = state.shutdown.child_token();
    let results = match (req.url, req.page_text) {
        (Some(_), Some(_)) => {
            return Err(AppError::Validation(
                "Provide either url or page_text, not both".to_string(),
            ))
        }
        (Some(url), None) => state.pipeline.process_url(&url, &cancel).await?,
        (None, Some(text)) => state.pipeline.process_page(&text, &cancel).await?,
        (None, None) => {
            return Err(AppError::Validation(
                "One of url or page_text is required".to_string(),
            ))
        }
    };
    Ok(Json(GenerateResponse { results }))
}
