// Stage 3: outreach email composition from a job record and its matched links.
//
// Email shape: subject line first, opening paragraph naming the role, one
// bullet per matched link, closing paragraph, signature. No bullet section at
// all when nothing matched.

use async_trait::async_trait;

use crate::errors::PipelineError;
use crate::extraction::JobRecord;
use crate::portfolio::MatchedLink;

pub mod llm;
pub mod prompts;
pub mod template;

pub use llm::LlmComposer;
pub use template::TemplateComposer;

/// Carried in the pipeline as `Arc<dyn EmailComposer>`, swapped via config.
#[async_trait]
pub trait EmailComposer: Send + Sync {
    async fn compose(&self, job: &JobRecord, links: &[MatchedLink]) -> Result<String, PipelineError>;
}
