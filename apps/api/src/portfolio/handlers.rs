use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::portfolio::{IndexStatus, LoadOutcome, MatchedLink};
use crate::state::AppState;

/// Upper bound on `k` accepted over HTTP.
const MAX_K: usize = 20;

#[derive(Deserialize)]
pub struct MatchRequest {
    pub skills: String,
    pub k: Option<usize>,
}

#[derive(Serialize)]
pub struct MatchResponse {
    pub links: Vec<MatchedLink>,
}

#[derive(Serialize)]
pub struct ReloadResponse {
    #[serde(flatten)]
    pub outcome: LoadOutcome,
    pub status: IndexStatus,
}

/// POST /api/v1/portfolio/match
pub async fn handle_match(
    State(state): State<AppState>,
    Json(req): Json<MatchRequest>,
) -> Result<Json<MatchResponse>, AppError> {
    let k = req.k.unwrap_or_else(|| state.matcher.default_k());
    if k > MAX_K {
        return Err(AppError::Validation(format!("k must be at most {MAX_K}")));
    }
    let links = state.matcher.match_skills(&req.skills, k).await?;
    Ok(Json(MatchResponse { links }))
}

/// POST /api/v1/portfolio/reload
pub async fn handle_reload(State(state): State<AppState>) -> Result<Json<ReloadResponse>, AppError> {
    let outcome = state.index.load(&state.config.portfolio_csv).await?;
    Ok(Json(ReloadResponse {
        outcome,
        status: state.index.status(),
    }))
}

/// GET /api/v1/portfolio/status
pub async fn handle_status(State(state): State<AppState>) -> Json<IndexStatus> {
    Json(state.index.status())
}
