mod config;
mod email;
mod errors;
mod extraction;
mod llm_client;
mod matching;
mod page;
mod pipeline;
mod portfolio;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::{ComposerKind, Config};
use crate::email::{EmailComposer, LlmComposer, TemplateComposer};
use crate::extraction::JobExtractor;
use crate::llm_client::LlmClient;
use crate::matching::RetrievalMatcher;
use crate::page::HttpPageSource;
use crate::pipeline::Pipeline;
use crate::portfolio::{build_embedder, PortfolioIndex, SnapshotStore};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Outreach API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = Arc::new(LlmClient::new(
        config.llm_api_key.clone(),
        &config.llm_base_url,
        config.llm_model.clone(),
        config.llm_timeout,
        config.llm_max_attempts,
    )?);
    info!("LLM client initialized (model: {})", llm.model());

    // Initialize portfolio index; a portfolio that cannot be loaded is fatal
    let embedder = build_embedder(&config.embedder, config.llm_timeout)?;
    info!("Embedder initialized ({})", embedder.model_id());
    let index = Arc::new(PortfolioIndex::new(
        embedder,
        SnapshotStore::new(&config.index_dir),
    ));
    let outcome = index
        .load(&config.portfolio_csv)
        .await
        .with_context(|| format!("loading portfolio from {}", config.portfolio_csv.display()))?;
    info!("Portfolio index ready: {outcome:?}");

    // Initialize composer (template by default, COMPOSER=llm for backend-written emails)
    let composer: Arc<dyn EmailComposer> = match config.composer {
        ComposerKind::Template => Arc::new(TemplateComposer::new(config.sender_name.clone())),
        ComposerKind::Llm => Arc::new(LlmComposer::new(
            llm.clone(),
            config.llm_timeout,
            config.email_temperature,
            config.sender_name.clone(),
        )),
    };
    info!("Email composer: {:?}", config.composer);

    let extractor = JobExtractor::new(llm, config.llm_timeout);
    let matcher = RetrievalMatcher::new(index.clone(), config.match_top_k);
    let pages = Arc::new(HttpPageSource::new(config.llm_timeout)?);
    let pipeline = Pipeline::new(extractor.clone(), matcher.clone(), composer, pages);
    let shutdown = CancellationToken::new();

    // Build app state
    let state = AppState {
        config: config.clone(),
        extractor,
        matcher,
        index,
        pipeline,
        shutdown: shutdown.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    Ok(())
}

/// Resolves on Ctrl-C and cancels in-flight pipeline runs.
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
    shutdown.cancel();
}
