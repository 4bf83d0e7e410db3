//! Job records and the parse boundary that turns backend text into them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::PipelineError;

/// One job posting pulled out of a scraped page.
///
/// Always carries exactly these four fields. Anything the backend left out is
/// an empty string; anything extra it added is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub role: String,
    pub experience: String,
    pub skills: String,
    pub description: String,
}

const FIELDS: [&str; 4] = ["role", "experience", "skills", "description"];

/// Top-level shape of an extraction reply. The prompt asks for a list but the
/// backend sometimes answers a single-posting page with a bare object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ExtractedJobs {
    Many(Vec<Map<String, Value>>),
    One(Map<String, Value>),
}

impl ExtractedJobs {
    /// Resolves the union into records, preserving reply order.
    pub fn into_records(self) -> Vec<JobRecord> {
        match self {
            ExtractedJobs::Many(objects) => objects.iter().map(JobRecord::from_object).collect(),
            ExtractedJobs::One(object) => vec![JobRecord::from_object(&object)],
        }
    }
}

impl JobRecord {
    /// Coerces an arbitrary JSON object to the four-field shape.
    pub fn from_object(object: &Map<String, Value>) -> Self {
        let [role, experience, skills, description] = FIELDS.map(|field| {
            lookup(object, field)
                .map(render_value)
                .unwrap_or_default()
        });
        Self {
            role,
            experience,
            skills,
            description,
        }
    }
}

/// Parses a raw backend reply. The reply must be a JSON list of objects or a
/// single object, with nothing around it. Any failure, including prose or
/// markdown wrapping, surfaces as `ExtractionParse`.
pub fn parse_jobs(raw: &str) -> Result<Vec<JobRecord>, PipelineError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PipelineError::ExtractionParse);
    }
    serde_json::from_str::<ExtractedJobs>(trimmed)
        .map(ExtractedJobs::into_records)
        .map_err(|e| {
            tracing::debug!("Extraction reply rejected: {e}");
            PipelineError::ExtractionParse
        })
}

fn lookup<'a>(object: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    object.get(field).or_else(|| {
        object
            .iter()
            .find(|(key, _)| key.trim().eq_ignore_ascii_case(field))
            .map(|(_, value)| value)
    })
}

/// Flattens a JSON value to display text. Lists (the backend often sends
/// `skills` as one) are joined with ", ".
fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(items) => items
            .iter()
            .map(render_value)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}
