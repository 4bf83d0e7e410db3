use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Which embedding backend feeds the portfolio index.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbedderKind {
    /// Offline feature-hashing embedder.
    Hashing { dimensions: usize },
    /// OpenAI-compatible `/embeddings` endpoint.
    OpenAi {
        api_key: String,
        base_url: String,
        model: String,
        dimensions: Option<usize>,
    },
}

/// How outreach emails are written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComposerKind {
    Template,
    Llm,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_timeout: Duration,
    pub llm_max_attempts: u32,
    pub email_temperature: f32,
    pub portfolio_csv: PathBuf,
    pub index_dir: PathBuf,
    pub embedder: EmbedderKind,
    pub match_top_k: usize,
    pub composer: ComposerKind,
    pub sender_name: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            llm_api_key: require_env("LLM_API_KEY")?,
            llm_base_url: env_or("LLM_BASE_URL", "https://api.groq.com/openai/v1"),
            llm_model: env_or("LLM_MODEL", "llama-3.1-8b-instant"),
            llm_timeout: Duration::from_secs(parse_env("LLM_TIMEOUT_SECS", 60)?),
            llm_max_attempts: parse_env("LLM_MAX_ATTEMPTS", 1)?,
            email_temperature: parse_env("EMAIL_TEMPERATURE", 0.7)?,
            portfolio_csv: PathBuf::from(env_or("PORTFOLIO_CSV", "resource/my_portfolio.csv")),
            index_dir: PathBuf::from(env_or("INDEX_DIR", "vectorstore")),
            embedder: embedder_from_env()?,
            match_top_k: parse_env("MATCH_TOP_K", 2)?,
            composer: composer_from_env()?,
            sender_name: env_or("SENDER_NAME", "Upendra Paluru"),
            port: parse_env("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

#[cfg(test)]
impl Config {
    /// Offline configuration rooted at `root`: hashing embedder, template composer.
    pub fn for_tests(root: &std::path::Path) -> Self {
        Config {
            llm_api_key: "test-key".to_string(),
            llm_base_url: "http://127.0.0.1:9".to_string(),
            llm_model: "test-model".to_string(),
            llm_timeout: Duration::from_secs(5),
            llm_max_attempts: 1,
            email_temperature: 0.7,
            portfolio_csv: root.join("portfolio.csv"),
            index_dir: root.join("vectorstore"),
            embedder: EmbedderKind::Hashing { dimensions: 512 },
            match_top_k: 2,
            composer: ComposerKind::Template,
            sender_name: "Sam".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}

fn embedder_from_env() -> Result<EmbedderKind> {
    match env_or("EMBEDDER", "hashing").to_lowercase().as_str() {
        "hashing" => Ok(EmbedderKind::Hashing {
            dimensions: parse_env("EMBEDDING_DIMENSIONS", 512)?,
        }),
        "openai" => Ok(EmbedderKind::OpenAi {
            api_key: require_env("EMBEDDING_API_KEY")?,
            base_url: env_or("EMBEDDING_BASE_URL", "https://api.openai.com/v1"),
            model: env_or("EMBEDDING_MODEL", "text-embedding-3-small"),
            dimensions: std::env::var("EMBEDDING_DIMENSIONS")
                .ok()
                .map(|v| v.parse::<usize>())
                .transpose()
                .context("EMBEDDING_DIMENSIONS must be a positive integer")?,
        }),
        other => bail!("EMBEDDER must be 'hashing' or 'openai', got '{other}'"),
    }
}

fn composer_from_env() -> Result<ComposerKind> {
    match env_or("COMPOSER", "template").to_lowercase().as_str() {
        "template" => Ok(ComposerKind::Template),
        "llm" => Ok(ComposerKind::Llm),
        other => bail!("COMPOSER must be 'template' or 'llm', got '{other}'"),
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}
