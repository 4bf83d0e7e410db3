//! Embedding backends for the portfolio index.
//!
//! Default: `HashingEmbedder` (offline, deterministic, fully testable).
//! Optional: `OpenAiEmbedder` for any OpenAI-compatible `/embeddings` endpoint.
//!
//! The index holds an `Arc<dyn Embedder>`, chosen at startup via config.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::EmbedderKind;

const OPENAI_BATCH_SIZE: usize = 64;
const TOKEN_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Embedding API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Embedding API returned {got} vectors for {expected} inputs")]
    CountMismatch { expected: usize, got: usize },

    #[error("Invalid embedder configuration: {0}")]
    Config(String),
}

/// Turns canonical text into fixed-length vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identifies model and output shape. Part of the index content identity,
    /// so vectors from different models are never mixed.
    fn model_id(&self) -> &str;

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;
}

/// Builds the embedder selected in config.
pub fn build_embedder(kind: &EmbedderKind, timeout: Duration) -> Result<Arc<dyn Embedder>, EmbedError> {
    match kind {
        EmbedderKind::Hashing { dimensions } => Ok(Arc::new(HashingEmbedder::new(*dimensions)?)),
        EmbedderKind::OpenAi {
            api_key,
            base_url,
            model,
            dimensions,
        } => Ok(Arc::new(OpenAiEmbedder::new(
            api_key,
            base_url,
            model.clone(),
            *dimensions,
            timeout,
        )?)),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// HashingEmbedder
// ────────────────────────────────────────────────────────────────────────────

/// Feature-hashing embedder.
///
/// Every word token contributes weight 1.0 to one bucket and each of its
/// character trigrams 0.5 to another, so "postgres" and "postgresql" land
/// close together without a synonym table. Vectors are L2-normalized.
pub struct HashingEmbedder {
    dimensions: usize,
    model_id: String,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Result<Self, EmbedError> {
        if dimensions == 0 {
            return Err(EmbedError::Config(
                "hashing embedder needs at least one dimension".to_string(),
            ));
        }
        Ok(Self {
            dimensions,
            model_id: format!("hashing-v1/{dimensions}"),
        })
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimensions];
        let lowered = text.to_lowercase();
        let tokens = lowered
            .split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'))
            .filter(|t| !t.is_empty());

        for token in tokens {
            vector[self.bucket("tok", token)] += TOKEN_WEIGHT;
            let chars: Vec<char> = token.chars().collect();
            for window in chars.windows(3) {
                let gram: String = window.iter().collect();
                vector[self.bucket("tri", &gram)] += TRIGRAM_WEIGHT;
            }
        }

        l2_normalize(&mut vector);
        vector
    }

    fn bucket(&self, namespace: &str, feature: &str) -> usize {
        let digest = Sha256::new()
            .chain_update(namespace.as_bytes())
            .chain_update([0x1f])
            .chain_update(feature.as_bytes())
            .finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        (u64::from_le_bytes(head) % self.dimensions as u64) as usize
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(inputs.iter().map(|text| self.embed_one(text)).collect())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// OpenAiEmbedder
// ────────────────────────────────────────────────────────────────────────────

/// Async embeddings client for OpenAI-compatible endpoints.
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    dimensions: Option<usize>,
    model_id: String,
}

impl OpenAiEmbedder {
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: String,
        dimensions: Option<usize>,
        timeout: Duration,
    ) -> Result<Self, EmbedError> {
        if api_key.trim().is_empty() {
            return Err(EmbedError::Config("missing embedding API key".to_string()));
        }
        if model.trim().is_empty() {
            return Err(EmbedError::Config("missing embedding model name".to_string()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        let model_id = match dimensions {
            Some(d) => format!("openai:{model}/{d}"),
            None => format!("openai:{model}"),
        };
        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            api_key: api_key.trim().to_string(),
            model,
            dimensions,
            model_id,
        })
    }

    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: inputs,
            dimensions: self.dimensions,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(EmbedError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let mut parsed: EmbeddingResponse = response.json().await?;
        parsed.data.sort_by_key(|entry| entry.index);
        if parsed.data.len() != inputs.len() {
            return Err(EmbedError::CountMismatch {
                expected: inputs.len(),
                got: parsed.data.len(),
            });
        }
        Ok(parsed
            .data
            .into_iter()
            .map(|entry| {
                let mut v = entry.embedding;
                l2_normalize(&mut v);
                v
            })
            .collect())
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let mut out = Vec::with_capacity(inputs.len());
        for batch in inputs.chunks(OPENAI_BATCH_SIZE) {
            out.extend(self.embed_batch(batch).await?);
        }
        Ok(out)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Vector math
// ────────────────────────────────────────────────────────────────────────────

fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}

/// Cosine similarity; 0.0 when either vector is zero or lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
