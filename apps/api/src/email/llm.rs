//! Backend-written emails. The reply is free prose, so the email contract is
//! enforced on the way out rather than trusted.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::email::prompts::{EMAIL_PROMPT_TEMPLATE, NO_PROJECTS_INSTRUCTION, PROJECT_LIST_INSTRUCTION};
use crate::email::template::{contains_url, strip_urls};
use crate::email::EmailComposer;
use crate::errors::PipelineError;
use crate::extraction::JobRecord;
use crate::llm_client::prompts::{fill_template, PROSE_SYSTEM};
use crate::llm_client::{GenerationRequest, TextGenerator};
use crate::portfolio::MatchedLink;

pub struct LlmComposer {
    llm: Arc<dyn TextGenerator>,
    timeout: Duration,
    temperature: f32,
    sender_name: String,
}

impl LlmComposer {
    pub fn new(
        llm: Arc<dyn TextGenerator>,
        timeout: Duration,
        temperature: f32,
        sender_name: impl Into<String>,
    ) -> Self {
        Self {
            llm,
            timeout,
            temperature,
            sender_name: sender_name.into(),
        }
    }

    fn build_prompt(&self, job: &JobRecord, links: &[MatchedLink]) -> String {
        let job_description = serde_json::to_string_pretty(job).unwrap_or_else(|_| format!("{job:?}"));
        let (link_list, instruction) = if links.is_empty() {
            ("None.".to_string(), NO_PROJECTS_INSTRUCTION)
        } else {
            let list = links
                .iter()
                .map(|l| format!("- {} (tech: {})", l.link, l.tech_stack.join(", ")))
                .collect::<Vec<_>>()
                .join("\n");
            (list, PROJECT_LIST_INSTRUCTION)
        };
        fill_template(
            EMAIL_PROMPT_TEMPLATE,
            &[
                ("project_instruction", instruction),
                ("sender_name", self.sender_name.as_str()),
                ("link_list", link_list.as_str()),
                ("job_description", job_description.as_str()),
            ],
        )
    }
}

#[async_trait]
impl EmailComposer for LlmComposer {
    async fn compose(&self, job: &JobRecord, links: &[MatchedLink]) -> Result<String, PipelineError> {
        let request = GenerationRequest {
            system: PROSE_SYSTEM.to_string(),
            prompt: self.build_prompt(job, links),
            temperature: self.temperature,
        };
        let raw = tokio::time::timeout(self.timeout, self.llm.generate(&request))
            .await
            .map_err(|_| PipelineError::BackendTimeout(self.timeout))?
            .map_err(|e| e.classify(self.timeout))?;

        debug!("Composer reply: {} chars", raw.len());
        Ok(enforce_email_contract(&raw, &fallback_subject(job), !links.is_empty()))
    }
}

fn fallback_subject(job: &JobRecord) -> String {
    let role = strip_urls(&job.role);
    if role.is_empty() {
        "Subject: Exploring opportunities with your team".to_string()
    } else {
        format!("Subject: Application for {role}")
    }
}

fn is_subject(line: &str) -> bool {
    line.trim_start()
        .get(..8)
        .is_some_and(|p| p.eq_ignore_ascii_case("subject:"))
}

fn is_bullet(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with('•') || t.starts_with("- ") || t.starts_with("* ")
}

/// Normalizes backend prose into the email contract:
/// - nothing before the first `Subject:` line (one is added if missing)
/// - without links, bullet lines and the header introducing them are dropped
/// - raw URLs outside bullet lines are removed
pub fn enforce_email_contract(raw: &str, fallback_subject: &str, has_links: bool) -> String {
    let lines: Vec<&str> = raw.lines().collect();
    let body = match lines.iter().position(|l| is_subject(l)) {
        Some(start) => &lines[start..],
        None => &lines[..],
    };

    let mut out: Vec<String> = Vec::new();
    if body.first().map_or(true, |l| !is_subject(l)) {
        out.push(fallback_subject.to_string());
        out.push(String::new());
    }

    for line in body {
        if is_bullet(line) {
            if has_links {
                out.push(line.trim_end().to_string());
            } else if let Some(last) = out.iter().rposition(|l| !l.trim().is_empty()) {
                // dangling header such as "Relevant projects:"
                if out[last].trim_end().ends_with(':') && !is_subject(&out[last]) {
                    out.truncate(last);
                }
            }
            continue;
        }
        if !contains_url(line) {
            out.push(line.trim_end().to_string());
        } else {
            let cleaned = strip_urls(line);
            if !cleaned.is_empty() {
                out.push(cleaned);
            }
        }
    }

    if !has_links {
        out = drop_orphan_headers(out);
    }
    collapse_blank_lines(&out)
}

/// Drops header lines ("Relevant projects:") left with nothing under them:
/// a non-subject line ending in `:` followed by a blank line or the end.
fn drop_orphan_headers(lines: Vec<String>) -> Vec<String> {
    let orphan = |i: usize| {
        let line = lines[i].trim_end();
        line.ends_with(':')
            && !is_subject(line)
            && lines.get(i + 1).map_or(true, |next| next.trim().is_empty())
    };
    (0..lines.len())
        .filter(|&i| !orphan(i))
        .map(|i| lines[i].clone())
        .collect()
}

fn collapse_blank_lines(lines: &[String]) -> String {
    let mut result: Vec<&str> = Vec::with_capacity(lines.len());
    for line in lines {
        let blank = line.trim().is_empty();
        if blank && result.last().map_or(true, |l: &&str| l.trim().is_empty()) {
            continue;
        }
        result.push(line);
    }
    while result.last().is_some_and(|l| l.trim().is_empty()) {
        result.pop();
    }
    result.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::{Reply, ScriptedGenerator};

    const REPLY: &str = "Sure! Here is your email:\n\nSubject: Backend Engineer role\n\nHi team,\n\nI'm excited about the role.\n\nRelevant projects:\n• Python Portfolio: [Python Portfolio](https://x.dev/python) - Flask APIs\n\nSee more at https://x.dev/all for details.\n\nBest regards,\nSam";

    fn job() -> JobRecord {
        JobRecord {
            role: "Backend Engineer".to_string(),
            skills: "Python".to_string(),
            ..JobRecord::default()
        }
    }

    #[test]
    fn test_preamble_before_subject_is_dropped() {
        let email = enforce_email_contract(REPLY, "Subject: fallback", true);
        assert!(email.starts_with("Subject: Backend Engineer role"));
    }

    #[test]
    fn test_bullets_kept_when_links_exist() {
        let email = enforce_email_contract(REPLY, "Subject: fallback", true);
        assert!(email.contains("• Python Portfolio"));
        assert!(email.contains("Relevant projects:"));
    }

    #[test]
    fn test_bullets_and_header_dropped_without_links() {
        let email = enforce_email_contract(REPLY, "Subject: fallback", false);
        assert!(!email.contains('•'));
        assert!(!email.contains("Relevant projects:"));
        assert!(!email.contains("\n\n\n"));
    }

    #[test]
    fn test_header_without_bullets_dropped_without_links() {
        let reply = "Subject: Hi\n\nOpening.\n\nRelevant projects:\n\nClosing.\n\nBest regards,\nSam";
        let email = enforce_email_contract(reply, "Subject: x", false);
        assert!(!email.contains("Relevant projects:"));
        assert_eq!(email, "Subject: Hi\n\nOpening.\n\nClosing.\n\nBest regards,\nSam");
    }

    #[test]
    fn test_trailing_header_dropped_without_links() {
        let email = enforce_email_contract("Subject: Hi\n\nOpening.\n\nMy projects:", "Subject: x", false);
        assert_eq!(email, "Subject: Hi\n\nOpening.");
    }

    #[test]
    fn test_header_kept_when_links_exist() {
        let reply = "Subject: Hi\n\nRelevant projects:\n• A: [A](https://x.dev/a) - Rust\n\nBest regards,\nSam";
        let email = enforce_email_contract(reply, "Subject: x", true);
        assert!(email.contains("Relevant projects:\n• A"));
    }

    #[test]
    fn test_raw_urls_outside_bullets_removed() {
        let email = enforce_email_contract(REPLY, "Subject: fallback", true);
        for line in email.lines().filter(|l| !is_bullet(l)) {
            assert!(!contains_url(line), "raw url left in: {line}");
        }
    }

    #[test]
    fn test_missing_subject_gets_fallback() {
        let email = enforce_email_contract("Hello there.\n\nBest regards,\nSam", "Subject: Hi", false);
        assert!(email.starts_with("Subject: Hi\n\nHello there."));
    }

    #[test]
    fn test_subject_detection_is_case_insensitive() {
        assert!(is_subject("  SUBJECT: hello"));
        assert!(!is_subject("Subj"));
    }

    #[tokio::test]
    async fn test_compose_uses_link_list_and_enforces_contract() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Reply::Text(REPLY.to_string())]));
        let composer = LlmComposer::new(generator.clone(), Duration::from_secs(5), 0.7, "Sam");
        let links = vec![MatchedLink {
            link: "https://x.dev/python".to_string(),
            score: 0.9,
            tech_stack: vec!["flask".to_string(), "python".to_string()],
        }];

        let email = composer.compose(&job(), &links).await.unwrap();
        assert!(email.starts_with("Subject:"));

        let seen = generator.seen.lock().unwrap();
        assert!(seen[0].prompt.contains("- https://x.dev/python (tech: flask, python)"));
        assert!(seen[0].prompt.contains("Backend Engineer"));
        assert_eq!(seen[0].temperature, 0.7);
    }

    #[tokio::test]
    async fn test_compose_without_links_says_no_project_list() {
        let generator = Arc::new(ScriptedGenerator::always("Subject: Hi\n\nBody\n\nBest regards,\nSam"));
        let composer = LlmComposer::new(generator.clone(), Duration::from_secs(5), 0.7, "Sam");
        composer.compose(&job(), &[]).await.unwrap();
        let seen = generator.seen.lock().unwrap();
        assert!(seen[0].prompt.contains(NO_PROJECTS_INSTRUCTION));
    }

    #[tokio::test]
    async fn test_compose_without_links_strips_bare_project_header() {
        let generator = Arc::new(ScriptedGenerator::always(
            "Subject: Hi\n\nOpening.\n\nRelevant projects:\n\nClosing.\n\nBest regards,\nSam",
        ));
        let composer = LlmComposer::new(generator, Duration::from_secs(5), 0.7, "Sam");
        let email = composer.compose(&job(), &[]).await.unwrap();
        assert!(!email.contains("Relevant projects:"));
        assert!(!email.contains('•'));
        assert!(email.starts_with("Subject: Hi"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_compose_times_out() {
        let generator = Arc::new(ScriptedGenerator::new(vec![Reply::Delay(
            Duration::from_secs(120),
            "Subject: late".to_string(),
        )]));
        let composer = LlmComposer::new(generator, Duration::from_secs(3), 0.7, "Sam");
        let err = composer.compose(&job(), &[]).await.unwrap_err();
        assert!(matches!(err, PipelineError::BackendTimeout(_)));
    }
}
