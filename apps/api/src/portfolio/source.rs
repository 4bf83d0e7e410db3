//! Portfolio backing store: the tabular file of tech stacks and project links.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::PipelineError;

/// One piece of prior work: its normalized tech-stack tags and a link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioEntry {
    pub tech_stack: BTreeSet<String>,
    pub link: String,
}

impl PortfolioEntry {
    /// Order-independent text form of the tag set, used for embedding.
    pub fn canonical_stack(&self) -> String {
        self.tech_stack
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Stable identity of a (tech stack, link) pair.
    pub fn entry_id(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_stack().as_bytes());
        hasher.update([0x1f]);
        hasher.update(self.link.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Lowercases, trims and collapses internal whitespace.
pub fn normalize_term(term: &str) -> String {
    term.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Canonical string for a set of terms: normalized, deduplicated, sorted, joined.
/// Index construction and queries both go through this.
pub fn canonicalize<I, S>(terms: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    terms
        .into_iter()
        .map(|t| normalize_term(t.as_ref()))
        .filter(|t| !t.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fingerprint of the backing file together with the embedding model that
/// will index it. Equal fingerprints mean a reload has nothing to do.
pub fn content_identity(bytes: &[u8], model_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.update([0x1f]);
    hasher.update(model_id.as_bytes());
    hex::encode(hasher.finalize())
}

/// Parses portfolio CSV bytes. Expects a header row with a tech-stack column
/// (`Techstack`) and a link column (`Links`); other columns are ignored.
/// Rows repeating an earlier (tech stack, link) pair are skipped.
pub fn parse_portfolio(bytes: &[u8]) -> Result<Vec<PortfolioEntry>, PipelineError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| PipelineError::IndexLoad(format!("unreadable header row: {e}")))?
        .clone();

    let stack_col = find_column(&headers, &["techstack"])
        .ok_or_else(|| PipelineError::IndexLoad("missing tech stack column".to_string()))?;
    let link_col = find_column(&headers, &["links", "link"])
        .ok_or_else(|| PipelineError::IndexLoad("missing link column".to_string()))?;

    let mut entries = Vec::new();
    let mut seen = HashSet::new();

    for (row, record) in reader.records().enumerate() {
        // header is line 1
        let line = row + 2;
        let record =
            record.map_err(|e| PipelineError::IndexLoad(format!("line {line}: {e}")))?;

        let link = record.get(link_col).unwrap_or_default().trim();
        if link.is_empty() {
            return Err(PipelineError::IndexLoad(format!("line {line}: row has no link")));
        }

        let tech_stack: BTreeSet<String> = record
            .get(stack_col)
            .unwrap_or_default()
            .split(',')
            .map(normalize_term)
            .filter(|t| !t.is_empty())
            .collect();
        if tech_stack.is_empty() {
            return Err(PipelineError::IndexLoad(format!(
                "line {line}: row has no tech stack tags"
            )));
        }

        let entry = PortfolioEntry {
            tech_stack,
            link: link.to_string(),
        };
        if seen.insert(entry.entry_id()) {
            entries.push(entry);
        }
    }

    Ok(entries)
}

fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers.iter().position(|h| {
        let key: String = h
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        names.contains(&key.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Techstack,Links\n\
        \"React, Node.js, MongoDB\",https://example.com/react-portfolio\n\
        \"Python, Flask\",https://example.com/python-portfolio\n";

    #[test]
    fn test_parse_sample_portfolio() {
        let entries = parse_portfolio(SAMPLE.as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].link, "https://example.com/react-portfolio");
        assert!(entries[0].tech_stack.contains("node.js"));
        assert!(entries[1].tech_stack.contains("flask"));
    }

    #[test]
    fn test_canonical_stack_is_order_independent() {
        let a = parse_portfolio(b"Techstack,Links\n\"Flask, Python\",a\n").unwrap();
        let b = parse_portfolio(b"Techstack,Links\n\"python , FLASK\",a\n").unwrap();
        assert_eq!(a[0].canonical_stack(), "flask python");
        assert_eq!(a[0].canonical_stack(), b[0].canonical_stack());
        assert_eq!(a[0].entry_id(), b[0].entry_id());
    }

    #[test]
    fn test_header_names_are_flexible() {
        let entries = parse_portfolio(b"id,Tech Stack,link\n1,Rust,https://x\n").unwrap();
        assert_eq!(entries[0].link, "https://x");
        assert!(entries[0].tech_stack.contains("rust"));
    }

    #[test]
    fn test_duplicate_rows_are_collapsed() {
        let csv = "Techstack,Links\nRust,https://x\n\"rust\",https://x\nRust,https://y\n";
        let entries = parse_portfolio(csv.as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].link, "https://y");
    }

    #[test]
    fn test_row_without_link_is_load_error() {
        let err = parse_portfolio(b"Techstack,Links\nRust,\n").unwrap_err();
        assert!(matches!(err, PipelineError::IndexLoad(ref m) if m.contains("line 2")));
    }

    #[test]
    fn test_row_without_tags_is_load_error() {
        assert!(parse_portfolio(b"Techstack,Links\n\" , \",https://x\n").is_err());
    }

    #[test]
    fn test_missing_link_column_is_load_error() {
        let err = parse_portfolio(b"Techstack,Url\nRust,https://x\n").unwrap_err();
        assert!(matches!(err, PipelineError::IndexLoad(_)));
    }

    #[test]
    fn test_ragged_rows_are_load_error() {
        assert!(parse_portfolio(b"Techstack,Links\nRust,https://x,extra\n").is_err());
    }

    #[test]
    fn test_header_only_file_is_empty_portfolio() {
        assert!(parse_portfolio(b"Techstack,Links\n").unwrap().is_empty());
    }

    #[test]
    fn test_canonicalize_matches_entry_form() {
        assert_eq!(canonicalize(["  Python ", "REST   APIs", "python"]), "python rest apis");
    }

    #[test]
    fn test_content_identity_depends_on_model() {
        let a = content_identity(SAMPLE.as_bytes(), "hashing-v1/512");
        let b = content_identity(SAMPLE.as_bytes(), "hashing-v1/256");
        assert_ne!(a, b);
        assert_eq!(a, content_identity(SAMPLE.as_bytes(), "hashing-v1/512"));
        assert_eq!(a.len(), 64);
    }
}
