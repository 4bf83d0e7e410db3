//! Portfolio Index: embedding index over portfolio entries with top-K lookup.
//!
//! Readers clone the live `Arc<IndexSnapshot>` under a short read lock and
//! score against it lock-free. A load builds a complete new snapshot first and
//! swaps it in with one write, so queries see either the old index or the new
//! one, never a mix. Loads are serialized by `load_lock`.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::errors::PipelineError;
use crate::portfolio::embedder::{cosine_similarity, Embedder};
use crate::portfolio::source::{canonicalize, content_identity, normalize_term, parse_portfolio};
use crate::portfolio::store::{IndexEntry, IndexSnapshot, SnapshotStore};

/// One retrieved portfolio link. Only `link` is part of the match contract;
/// score and tags ride along for the email relevance text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedLink {
    pub link: String,
    pub score: f32,
    pub tech_stack: Vec<String>,
}

/// What a `load` call ended up doing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LoadOutcome {
    /// Source identical to the live index; nothing touched.
    Unchanged,
    /// Adopted the persisted snapshot without re-embedding.
    Restored { entries: usize },
    /// Re-embedded every entry and replaced the live index.
    Rebuilt { entries: usize },
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexStatus {
    pub entries: usize,
    pub content_id: String,
    pub model_id: String,
    pub built_at: Option<DateTime<Utc>>,
}

pub struct PortfolioIndex {
    embedder: Arc<dyn Embedder>,
    store: SnapshotStore,
    live: RwLock<Arc<IndexSnapshot>>,
    load_lock: Mutex<()>,
}

impl PortfolioIndex {
    pub fn new(embedder: Arc<dyn Embedder>, store: SnapshotStore) -> Self {
        Self {
            embedder,
            store,
            live: RwLock::new(Arc::new(IndexSnapshot::empty())),
            load_lock: Mutex::new(()),
        }
    }

    /// Loads (or reloads) the portfolio from `source`.
    ///
    /// Rebuilding fully replaces the previous index; entries are never merged.
    pub async fn load(&self, source: &Path) -> Result<LoadOutcome, PipelineError> {
        let _writer = self.load_lock.lock().await;

        let bytes = tokio::fs::read(source).await.map_err(|e| {
            PipelineError::IndexLoad(format!("cannot read {}: {e}", source.display()))
        })?;
        let model_id = self.embedder.model_id().to_string();
        let content_id = content_identity(&bytes, &model_id);

        if self.snapshot().content_id == content_id {
            debug!("Portfolio unchanged ({}), skipping reload", short(&content_id));
            return Ok(LoadOutcome::Unchanged);
        }

        if let Some(persisted) = self.read_persisted().await {
            if persisted.content_id == content_id && persisted.model_id == model_id {
                let entries = persisted.entries.len();
                self.swap(persisted);
                info!(
                    "Restored portfolio index from {} ({} entries)",
                    self.store.dir().display(),
                    entries
                );
                return Ok(LoadOutcome::Restored { entries });
            }
        }

        let portfolio = parse_portfolio(&bytes)?;
        let texts: Vec<String> = portfolio.iter().map(|e| e.canonical_stack()).collect();
        let embeddings = if texts.is_empty() {
            Vec::new()
        } else {
            self.embedder
                .embed(&texts)
                .await
                .map_err(|e| PipelineError::BackendUnavailable(format!("embedding failed: {e}")))?
        };
        if embeddings.len() != portfolio.len() {
            return Err(PipelineError::BackendUnavailable(format!(
                "embedder returned {} vectors for {} entries",
                embeddings.len(),
                portfolio.len()
            )));
        }

        let entries: Vec<IndexEntry> = portfolio
            .into_iter()
            .zip(embeddings)
            .map(|(entry, embedding)| IndexEntry {
                entry_id: entry.entry_id(),
                tech_stack: entry.tech_stack.into_iter().collect(),
                link: entry.link,
                embedding,
            })
            .collect();

        let snapshot = IndexSnapshot {
            content_id,
            model_id,
            built_at: Some(Utc::now()),
            entries,
        };
        let count = snapshot.entries.len();

        self.persist(&snapshot).await;
        self.swap(snapshot);
        info!("Rebuilt portfolio index ({count} entries)");

        Ok(LoadOutcome::Rebuilt { entries: count })
    }

    /// Returns up to `k` links whose tech stacks are closest to `skills`,
    /// best first. Ties keep portfolio order. Links are unique.
    pub async fn query(&self, skills: &[String], k: usize) -> Result<Vec<MatchedLink>, PipelineError> {
        let terms: Vec<String> = skills
            .iter()
            .map(|s| normalize_term(s))
            .filter(|s| !s.is_empty())
            .collect();
        if terms.is_empty() {
            return Err(PipelineError::EmptyQuery);
        }

        let snapshot = self.snapshot();
        if snapshot.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_text = canonicalize(&terms);
        let query_vector = self
            .embedder
            .embed(&[query_text])
            .await
            .map_err(|e| PipelineError::BackendUnavailable(format!("query embedding failed: {e}")))?
            .pop()
            .ok_or_else(|| PipelineError::BackendUnavailable("empty query embedding".to_string()))?;

        Ok(rank(&snapshot, &query_vector, k))
    }

    pub fn status(&self) -> IndexStatus {
        let snapshot = self.snapshot();
        IndexStatus {
            entries: snapshot.entries.len(),
            content_id: snapshot.content_id.clone(),
            model_id: snapshot.model_id.clone(),
            built_at: snapshot.built_at,
        }
    }

    fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.live
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn swap(&self, snapshot: IndexSnapshot) {
        *self.live.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(snapshot);
    }

    async fn read_persisted(&self) -> Option<IndexSnapshot> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.read())
            .await
            .ok()
            .flatten()
    }

    /// A failed write only costs a re-embed on the next restart.
    async fn persist(&self, snapshot: &IndexSnapshot) {
        let store = self.store.clone();
        let owned = snapshot.clone();
        match tokio::task::spawn_blocking(move || store.write(&owned)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Could not persist portfolio index: {e:#}"),
            Err(e) => warn!("Index persistence task failed: {e}"),
        }
    }
}

/// Scores every entry, keeps the best `2k` candidates, dedupes by link and
/// truncates to `k`.
fn rank(snapshot: &IndexSnapshot, query: &[f32], k: usize) -> Vec<MatchedLink> {
    let mut scored: Vec<(usize, f32)> = snapshot
        .entries
        .iter()
        .enumerate()
        .map(|(i, entry)| (i, cosine_similarity(query, &entry.embedding)))
        .collect();

    // stable: equal scores stay in insertion order
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let mut seen = HashSet::new();
    scored
        .into_iter()
        .take(k.saturating_mul(2))
        .filter_map(|(i, score)| {
            let entry = &snapshot.entries[i];
            seen.insert(entry.link.as_str()).then(|| MatchedLink {
                link: entry.link.clone(),
                score,
                tech_stack: entry.tech_stack.clone(),
            })
        })
        .take(k)
        .collect()
}

fn short(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}
