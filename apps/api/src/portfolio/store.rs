//! On-disk persistence of built index snapshots.
//!
//! One JSON file per index directory. Writes go to a temp file in the same
//! directory and are renamed into place, so readers never see a partial file.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::warn;

const SNAPSHOT_FILE: &str = "portfolio_index.json";

/// Embedding of one portfolio entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub entry_id: String,
    pub tech_stack: Vec<String>,
    pub link: String,
    pub embedding: Vec<f32>,
}

/// A complete, immutable index generation. Entries keep CSV insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub content_id: String,
    pub model_id: String,
    pub built_at: Option<DateTime<Utc>>,
    pub entries: Vec<IndexEntry>,
}

impl IndexSnapshot {
    pub fn empty() -> Self {
        Self {
            content_id: String::new(),
            model_id: String::new(),
            built_at: None,
            entries: Vec::new(),
        }
    }

    /// All embeddings share one length.
    fn is_consistent(&self) -> bool {
        let mut lengths = self.entries.iter().map(|e| e.embedding.len());
        match lengths.next() {
            Some(first) => first > 0 && lengths.all(|len| len == first),
            None => true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE)
    }

    /// Reads the persisted snapshot. A missing, unreadable or inconsistent file
    /// counts as absent; the caller rebuilds.
    pub fn read(&self) -> Option<IndexSnapshot> {
        let path = self.path();
        if !path.exists() {
            return None;
        }
        let snapshot = fs::read(&path)
            .map_err(anyhow::Error::from)
            .and_then(|bytes| serde_json::from_slice::<IndexSnapshot>(&bytes).map_err(Into::into));
        match snapshot {
            Ok(s) if s.is_consistent() => Some(s),
            Ok(_) => {
                warn!("Ignoring inconsistent index snapshot at {}", path.display());
                None
            }
            Err(e) => {
                warn!("Ignoring unreadable index snapshot at {}: {e}", path.display());
                None
            }
        }
    }

    /// Atomically replaces the persisted snapshot.
    pub fn write(&self, snapshot: &IndexSnapshot) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("cannot create index dir {}", self.dir.display()))?;
        let tmp = NamedTempFile::new_in(&self.dir).context("cannot create temp snapshot file")?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer(&mut writer, snapshot).context("cannot serialize snapshot")?;
            writer.flush().context("cannot flush snapshot")?;
        }
        tmp.as_file().sync_all().context("cannot sync snapshot")?;
        tmp.persist(self.path())
            .map_err(|e| e.error)
            .with_context(|| format!("cannot persist snapshot to {}", self.path().display()))?;
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
