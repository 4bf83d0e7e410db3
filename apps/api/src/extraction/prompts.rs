// Prompt constants for job extraction.

/// Extraction prompt template. Replace `{page_data}` before sending.
pub const EXTRACT_JOBS_PROMPT_TEMPLATE: &str = r#"### SCRAPED TEXT FROM WEBSITE:
{page_data}

### INSTRUCTION:
You are an expert job posting extractor. The above content is scraped from a job listing website.

Your task is to extract all relevant job postings from the text and return them in **strict JSON format**.

Each JSON object must contain the following keys:
- "role"
- "experience"
- "skills"
- "description"

Do NOT include any introduction, explanation, or preamble.
Respond with **JSON only**: not Markdown, not prose, just the JSON.
Do NOT use triple backticks or text like "Here is the JSON:"
If information is missing, use an empty string.

### OUTPUT FORMAT:
[
  {
    "role": "...",
    "experience": "...",
    "skills": "...",
    "description": "..."
  }
]"#;
