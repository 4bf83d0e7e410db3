use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::extraction::JobExtractor;
use crate::matching::RetrievalMatcher;
use crate::pipeline::Pipeline;
use crate::portfolio::PortfolioIndex;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub extractor: JobExtractor,
    pub matcher: RetrievalMatcher,
    /// Same index the matcher reads; reloads swap its snapshot in place.
    pub index: Arc<PortfolioIndex>,
    pub pipeline: Pipeline,
    /// Cancelled on shutdown; pipeline runs take a child token.
    pub shutdown: CancellationToken,
}
