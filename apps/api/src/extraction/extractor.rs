//! Job Extractor: turns cleaned page text into job records via one backend call.
//!
//! No retry happens here: a second attempt would resend the same (probably
//! oversized) page and fail the same way. Retry policy belongs to the caller.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::errors::PipelineError;
use crate::extraction::job::{parse_jobs, JobRecord};
use crate::extraction::prompts::EXTRACT_JOBS_PROMPT_TEMPLATE;
use crate::llm_client::prompts::{fill_template, JSON_ONLY_SYSTEM};
use crate::llm_client::{GenerationRequest, TextGenerator};

/// Extraction always runs greedy so the reply is as parseable as possible.
const EXTRACTION_TEMPERATURE: f32 = 0.0;

#[derive(Clone)]
pub struct JobExtractor {
    llm: Arc<dyn TextGenerator>,
    timeout: Duration,
}

impl JobExtractor {
    pub fn new(llm: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    /// Extracts every job posting found in `page_text`, in the order the
    /// backend listed them. Either the whole list or an error; never partial.
    pub async fn extract(&self, page_text: &str) -> Result<Vec<JobRecord>, PipelineError> {
        if page_text.trim().is_empty() {
            return Err(PipelineError::EmptyInput(
                "page text cannot be blank".to_string(),
            ));
        }

        let request = GenerationRequest {
            system: JSON_ONLY_SYSTEM.to_string(),
            prompt: fill_template(EXTRACT_JOBS_PROMPT_TEMPLATE, &[("page_data", page_text)]),
            temperature: EXTRACTION_TEMPERATURE,
        };

        debug!("Extracting jobs from {} chars of page text", page_text.len());

        let raw = tokio::time::timeout(self.timeout, self.llm.generate(&request))
            .await
            .map_err(|_| PipelineError::BackendTimeout(self.timeout))?
            .map_err(|e| e.classify(self.timeout))?;

        let jobs = parse_jobs(&raw)?;
        info!("Extracted {} job(s)", jobs.len());
        Ok(jobs)
    }
}
