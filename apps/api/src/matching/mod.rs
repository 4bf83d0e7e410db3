//! Retrieval Matcher: resolves a job's free-text skills into portfolio links.
//!
//! Never surfaces `EmptyQuery`: a job without usable skills simply gets no
//! grounding links.

use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::debug;

use crate::errors::PipelineError;
use crate::extraction::JobRecord;
use crate::portfolio::{MatchedLink, PortfolioIndex};

/// Separators seen in scraped skill lists: commas, semicolons, newlines,
/// bullets, pipes, spaced slashes, spaced ampersands and the words "and"/"or".
fn separator() -> &'static Regex {
    static SEPARATOR: OnceLock<Regex> = OnceLock::new();
    SEPARATOR.get_or_init(|| {
        Regex::new(r"(?i)[,;\n\r•|]|\s+/\s+|\s+&\s+|\s+(?:and|or)\s+")
            .expect("skill separator pattern is valid")
    })
}

/// Splits a free-text skill field into trimmed, non-empty terms.
/// Falls back to the whole string when splitting yields nothing usable.
pub fn split_skills(skills: &str) -> Vec<String> {
    if skills.trim().is_empty() {
        return Vec::new();
    }
    let terms: Vec<String> = separator()
        .split(skills)
        .map(|t| {
            t.trim_matches(|c: char| c.is_whitespace() || matches!(c, '.' | '-' | '*' | '(' | ')'))
                .to_string()
        })
        .filter(|t| !t.is_empty())
        .collect();

    if terms.is_empty() {
        vec![skills.trim().to_string()]
    } else {
        terms
    }
}

#[derive(Clone)]
pub struct RetrievalMatcher {
    index: Arc<PortfolioIndex>,
    default_k: usize,
}

impl RetrievalMatcher {
    pub fn new(index: Arc<PortfolioIndex>, default_k: usize) -> Self {
        Self { index, default_k }
    }

    pub fn default_k(&self) -> usize {
        self.default_k
    }

    /// Top links for `job` using the configured `k`.
    pub async fn match_job(&self, job: &JobRecord) -> Result<Vec<MatchedLink>, PipelineError> {
        self.match_skills(&job.skills, self.default_k).await
    }

    /// Top `k` links for a free-text skill field.
    pub async fn match_skills(&self, skills: &str, k: usize) -> Result<Vec<MatchedLink>, PipelineError> {
        let terms = split_skills(skills);
        if terms.is_empty() {
            debug!("No skill terms; skipping portfolio lookup");
            return Ok(Vec::new());
        }
        debug!("Matching {} skill term(s) with k={k}", terms.len());
        match self.index.query(&terms, k).await {
            Err(PipelineError::EmptyQuery) => Ok(Vec::new()),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::embedder::HashingEmbedder;
    use crate::portfolio::SnapshotStore;

    #[test]
    fn test_split_on_commas_and_conjunctions() {
        assert_eq!(
            split_skills("Python, REST APIs and Docker; AWS or GCP"),
            ["Python", "REST APIs", "Docker", "AWS", "GCP"]
        );
    }

    #[test]
    fn test_split_on_bullets_newlines_and_ampersands() {
        assert_eq!(
            split_skills("• React\n• Node.js & MongoDB | CI / CD"),
            ["React", "Node.js", "MongoDB", "CI", "CD"]
        );
    }

    #[test]
    fn test_split_keeps_words_containing_and() {
        assert_eq!(split_skills("Android, Pandas"), ["Android", "Pandas"]);
    }

    #[test]
    fn test_split_keeps_unspaced_slash_terms() {
        assert_eq!(split_skills("TCP/IP, C/C++"), ["TCP/IP", "C/C++"]);
    }

    #[test]
    fn test_split_keeps_unspaced_ampersand_terms() {
        assert_eq!(split_skills("R&D, AT&T & Verizon"), ["R&D", "AT&T", "Verizon"]);
    }

    #[test]
    fn test_split_blank_is_empty() {
        assert!(split_skills("   ").is_empty());
        assert!(split_skills("").is_empty());
    }

    #[test]
    fn test_split_only_separators_falls_back_to_whole_string() {
        assert_eq!(split_skills(" , ; "), [", ;"]);
    }

    #[test]
    fn test_single_prose_skill_is_one_term() {
        assert_eq!(
            split_skills("Kubernetes orchestration"),
            ["Kubernetes orchestration"]
        );
    }

    async fn matcher(csv: &str, k: usize) -> (RetrievalMatcher, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portfolio.csv");
        std::fs::write(&path, csv).unwrap();
        let index = PortfolioIndex::new(
            Arc::new(HashingEmbedder::new(512).unwrap()),
            SnapshotStore::new(dir.path().join("vectorstore")),
        );
        index.load(&path).await.unwrap();
        (RetrievalMatcher::new(Arc::new(index), k), dir)
    }

    fn job(skills: &str) -> JobRecord {
        JobRecord {
            skills: skills.to_string(),
            ..JobRecord::default()
        }
    }

    #[tokio::test]
    async fn test_python_rest_job_matches_python_portfolio() {
        let (matcher, _dir) =
            matcher("Techstack,Links\n\"python, flask\",a\nreact,b\n", 1).await;
        let links = matcher.match_job(&job("Python, REST APIs")).await.unwrap();
        let links: Vec<&str> = links.iter().map(|l| l.link.as_str()).collect();
        assert_eq!(links, ["a"]);
    }

    #[tokio::test]
    async fn test_empty_skills_yield_empty_result_not_error() {
        let (matcher, _dir) = matcher("Techstack,Links\nrust,a\n", 2).await;
        assert!(matcher.match_job(&job("")).await.unwrap().is_empty());
        assert!(matcher.match_job(&job("  \n ")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_match_never_exceeds_k_or_invents_links() {
        let csv = "Techstack,Links\nrust,a\n\"rust, tokio\",b\n\"go, grpc\",c\n\"python\",d\n";
        let (matcher, _dir) = matcher(csv, 2).await;
        let known = ["a", "b", "c", "d"];
        for skills in ["Rust", "Rust, Go, Python", "Java", "tokio and grpc"] {
            for k in [1, 2, 3] {
                let links = matcher.match_skills(skills, k).await.unwrap();
                assert!(links.len() <= k);
                assert!(links.iter().all(|l| known.contains(&l.link.as_str())));
            }
        }
    }
}
