pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::extraction::handlers as extraction;
use crate::pipeline::handlers as pipeline;
use crate::portfolio::handlers as portfolio;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Stage 1: extraction only
        .route("/api/v1/jobs/extract", post(extraction::handle_extract))
        // Stage 2: portfolio index
        .route("/api/v1/portfolio/match", post(portfolio::handle_match))
        .route("/api/v1/portfolio/reload", post(portfolio::handle_reload))
        .route("/api/v1/portfolio/status", get(portfolio::handle_status))
        // Full run: page → jobs → links → emails
        .route("/api/v1/emails/generate", post(pipeline::handle_generate))
        .with_state(state)
}
