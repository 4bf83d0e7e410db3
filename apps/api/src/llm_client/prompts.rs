// Shared prompt constants and prompt-building utilities.
// Each stage that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// System prompt for free-form prose generation.
pub const PROSE_SYSTEM: &str = "You write concise, professional business correspondence. \
    Output only the requested text with no preamble.";

/// Fills `{name}` placeholders in a prompt template.
/// Values are inserted verbatim; placeholders without a value are left untouched.
pub fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (name, value)| {
        acc.replace(&format!("{{{name}}}"), value)
    })
}
