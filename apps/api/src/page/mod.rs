// Job-page text provider: fetches a posting URL and reduces it to plain text
// for the extraction stage.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use tracing::{debug, warn};

use crate::errors::PipelineError;

const USER_AGENT: &str = concat!("outreach-api/", env!("CARGO_PKG_VERSION"));

#[async_trait]
pub trait PageSource: Send + Sync {
    /// Cleaned page text for `url`.
    async fn fetch_text(&self, url: &str) -> Result<String, PipelineError>;
}

pub struct HttpPageSource {
    client: Client,
    timeout: Duration,
}

impl HttpPageSource {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(timeout)
            .build()?;
        Ok(Self { client, timeout })
    }

    fn classify(&self, err: reqwest::Error) -> PipelineError {
        if err.is_timeout() {
            PipelineError::BackendTimeout(self.timeout)
        } else {
            PipelineError::BackendUnavailable(err.to_string())
        }
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch_text(&self, url: &str) -> Result<String, PipelineError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(PipelineError::EmptyInput("url is blank".to_string()));
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Page fetch for {url} returned {status}");
            return Err(PipelineError::BackendUnavailable(format!(
                "page fetch returned {status}"
            )));
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;
        let text = clean_text(&body);
        debug!("Fetched {url}: {} bytes raw, {} chars clean", body.len(), text.len());
        Ok(text)
    }
}

struct Patterns {
    blocks: Regex,
    tags: Regex,
    entities: Regex,
    urls: Regex,
    noise: Regex,
    spaces: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        blocks: Regex::new(r"(?is)<(script|style|noscript)\b[^>]*>.*?</(script|style|noscript)>")
            .expect("block pattern is valid"),
        tags: Regex::new(r"<[^>]*?>").expect("tag pattern is valid"),
        entities: Regex::new(r"&(?:[a-zA-Z]+|#\d+);").expect("entity pattern is valid"),
        urls: Regex::new(r"(?i)\b(?:https?://|www\.)\S+").expect("url pattern is valid"),
        noise: Regex::new(r"[^\p{L}\p{N}\s,.;:+#/()\-]").expect("noise pattern is valid"),
        spaces: Regex::new(r"\s+").expect("space pattern is valid"),
    })
}

/// Reduces fetched HTML or text to a single line of readable words:
/// script and style blocks, tags, entities, URLs and symbol noise are removed
/// and whitespace runs collapse to one space.
pub fn clean_text(raw: &str) -> String {
    let p = patterns();
    let text = p.blocks.replace_all(raw, " ");
    let text = p.tags.replace_all(&text, " ");
    let text = p.entities.replace_all(&text, " ");
    let text = p.urls.replace_all(&text, " ");
    let text = p.noise.replace_all(&text, " ");
    let text = p.spaces.replace_all(&text, " ");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_strips_markup_and_scripts() {
        let html = "<html><head><style>body{color:red}</style><script>var x = 1;</script></head>\
                    <body><h1>Backend Engineer</h1><p>Python &amp; Rust</p></body></html>";
        assert_eq!(clean_text(html), "Backend Engineer Python Rust");
    }

    #[test]
    fn test_clean_text_removes_urls_and_symbols() {
        let text = "Apply at https://jobs.example.com/123 now!!! ★★★ Skills: C++, C#, Node.js";
        assert_eq!(clean_text(text), "Apply at now Skills: C++, C#, Node.js");
    }

    #[test]
    fn test_clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  a\n\n\tb   c  "), "a b c");
        assert_eq!(clean_text("   "), "");
    }

    #[tokio::test]
    async fn test_blank_url_is_empty_input() {
        let source = HttpPageSource::new(Duration::from_secs(1)).unwrap();
        let err = source.fetch_text("   ").await.unwrap_err();
        assert!(matches!(err, PipelineError::EmptyInput(_)));
    }
}
