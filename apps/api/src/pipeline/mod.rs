//! Orchestrator: page text in, one outcome per extracted job out.
//!
//! Extraction is all-or-nothing for the page. After that every job runs its
//! match → compose chain independently: a failure is recorded on that job's
//! outcome and its siblings carry on. Outcomes come back in extraction order.

pub mod handlers;

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::email::EmailComposer;
use crate::errors::PipelineError;
use crate::extraction::{JobExtractor, JobRecord};
use crate::matching::RetrievalMatcher;
use crate::page::PageSource;
use crate::portfolio::MatchedLink;

/// Result for one extracted job. Exactly one of `email` / `error` is set.
#[derive(Debug, Clone, Serialize)]
pub struct JobOutcome {
    pub index: usize,
    pub job: JobRecord,
    pub links: Vec<MatchedLink>,
    pub email: Option<String>,
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct Pipeline {
    extractor: JobExtractor,
    matcher: RetrievalMatcher,
    composer: Arc<dyn EmailComposer>,
    pages: Arc<dyn PageSource>,
}

impl Pipeline {
    pub fn new(
        extractor: JobExtractor,
        matcher: RetrievalMatcher,
        composer: Arc<dyn EmailComposer>,
        pages: Arc<dyn PageSource>,
    ) -> Self {
        Self {
            extractor,
            matcher,
            composer,
            pages,
        }
    }

    /// Fetches `url`, cleans it and runs [`Pipeline::process_page`] on the text.
    pub async fn process_url(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<JobOutcome>, PipelineError> {
        let page_text = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            text = self.pages.fetch_text(url) => text?,
        };
        self.process_page(&page_text, cancel).await
    }

    pub async fn process_page(
        &self,
        page_text: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<JobOutcome>, PipelineError> {
        let run_id = Uuid::new_v4();

        let jobs = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            jobs = self.extractor.extract(page_text) => jobs?,
        };
        info!(%run_id, "Processing {} job(s)", jobs.len());

        let work = jobs
            .into_iter()
            .enumerate()
            .map(|(index, job)| self.process_job(run_id, index, job));

        let outcomes = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            outcomes = join_all(work) => outcomes,
        };

        let failed = outcomes.iter().filter(|o| o.error.is_some()).count();
        info!(%run_id, "Run finished: {} email(s), {failed} failed job(s)", outcomes.len() - failed);
        Ok(outcomes)
    }

    async fn process_job(&self, run_id: Uuid, index: usize, job: JobRecord) -> JobOutcome {
        let links = match self.matcher.match_job(&job).await {
            Ok(links) => links,
            Err(e) => {
                warn!(%run_id, index, "Portfolio match failed: {e}");
                return JobOutcome {
                    index,
                    job,
                    links: Vec::new(),
                    email: None,
                    error: Some(e.to_string()),
                };
            }
        };

        match self.composer.compose(&job, &links).await {
            Ok(email) => JobOutcome {
                index,
                job,
                links,
                email: Some(email),
                error: None,
            },
            Err(e) => {
                warn!(%run_id, index, "Email composition failed: {e}");
                JobOutcome {
                    index,
                    job,
                    links,
                    email: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}
