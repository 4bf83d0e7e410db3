//! Deterministic email fill. No backend call.

use std::collections::HashSet;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

use crate::email::EmailComposer;
use crate::errors::PipelineError;
use crate::extraction::JobRecord;
use crate::portfolio::MatchedLink;

pub struct TemplateComposer {
    sender_name: String,
}

impl TemplateComposer {
    pub fn new(sender_name: impl Into<String>) -> Self {
        Self {
            sender_name: sender_name.into(),
        }
    }

    pub fn render(&self, job: &JobRecord, links: &[MatchedLink]) -> String {
        let role = strip_urls(&job.role);
        let role = if role.is_empty() {
            "the open position".to_string()
        } else {
            role
        };

        let mut sections = vec![
            format!("Subject: Application for {role}"),
            opening_paragraph(&role, job),
        ];

        let bullets = bullet_lines(links);
        if !bullets.is_empty() {
            sections.push(bullets.join("\n"));
        }

        sections.push(
            "I would welcome the chance to discuss how I can contribute to your team. \
             Please let me know a convenient time for a short call."
                .to_string(),
        );
        sections.push(format!("Best regards,\n{}", self.sender_name));

        sections.join("\n\n")
    }
}

#[async_trait]
impl EmailComposer for TemplateComposer {
    async fn compose(&self, job: &JobRecord, links: &[MatchedLink]) -> Result<String, PipelineError> {
        Ok(self.render(job, links))
    }
}

fn opening_paragraph(role: &str, job: &JobRecord) -> String {
    let mut paragraph = format!(
        "I came across your opening for {role} and I am excited about the opportunity to contribute."
    );
    let skills = strip_urls(&job.skills);
    if !skills.is_empty() {
        paragraph.push_str(&format!(
            " The emphasis on {skills} lines up closely with work I have already delivered."
        ));
    }
    let experience = strip_urls(&job.experience);
    if !experience.is_empty() {
        paragraph.push_str(&format!(
            " My background fits the {experience} of experience you are looking for."
        ));
    }
    paragraph
}

/// `• Name: [Name](link) - relevance` per link, first occurrence of a link only.
pub fn bullet_lines(links: &[MatchedLink]) -> Vec<String> {
    let mut seen = HashSet::new();
    links
        .iter()
        .filter(|l| !l.link.trim().is_empty() && seen.insert(l.link.trim()))
        .map(|l| {
            let name = project_name(&l.link);
            let relevance = if l.tech_stack.is_empty() {
                "Relevant prior work for this role".to_string()
            } else {
                format!("Built with {}", l.tech_stack.join(", "))
            };
            format!("• {name}: [{name}]({}) - {relevance}", l.link.trim())
        })
        .collect()
}

/// Human-readable name from the last path segment of a link:
/// `https://x.dev/ml-python-portfolio/` → `Ml Python Portfolio`.
pub fn project_name(link: &str) -> String {
    let without_scheme = link.split_once("://").map(|(_, rest)| rest).unwrap_or(link);
    let path = without_scheme
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');
    let segment = path.rsplit('/').next().unwrap_or(path);
    let words: Vec<String> = segment
        .split(['-', '_', '.', ' '])
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect();
    if words.is_empty() {
        "Project".to_string()
    } else {
        words.join(" ")
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn url_pattern() -> &'static Regex {
    static URL: OnceLock<Regex> = OnceLock::new();
    URL.get_or_init(|| Regex::new(r"(?i)\b(?:https?://|www\.)\S+").expect("url pattern is valid"))
}

/// Removes raw URLs and collapses whitespace.
pub(crate) fn strip_urls(text: &str) -> String {
    url_pattern()
        .replace_all(text, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn contains_url(text: &str) -> bool {
    url_pattern().is_match(text)
}
