// Prompt constants for cold-email composition.

/// Cold email prompt template.
/// Replace: {job_description}, {link_list}, {project_instruction}, {sender_name}
pub const EMAIL_PROMPT_TEMPLATE: &str = r#"No preamble, just the email content.

### JOB DESCRIPTION:
{job_description}

### RELEVANT PORTFOLIO LINKS:
{link_list}

### INSTRUCTIONS:
Write a cold email tailored to the job above, following these formatting rules:

1. Start directly with the email content (no introductory text).

2. Structure the email like this:
Subject: [Your Subject Line]

[Opening paragraph expressing enthusiasm for the role and company]

{project_instruction}

[Closing paragraph expressing interest in discussing further]

Best regards,
{sender_name}

3. Requirements:
- Focus on how the work demonstrates the skills required by the job description
- Keep any project descriptions concise and technology-focused

4. Do NOT include:
- Any text before "Subject:"
- Any surrounding tags
- Duplicated links or raw URLs
- Paragraph-style project descriptions
- Any explanation of the email's purpose

Ensure the output looks like an actual, ready-to-send cold email."#;

/// Used when at least one portfolio link matched.
pub const PROJECT_LIST_INSTRUCTION: &str = "[Bullet-point list of the portfolio links above, one per link, formatted exactly as:
• Project Name: [Project Name](project-link) - Brief description of relevance and technologies used (1 line)]";

/// Used when nothing matched; the email must not carry an empty project section.
pub const NO_PROJECTS_INSTRUCTION: &str =
    "[No project list. Do NOT add any bullet points, project header or links.]";
