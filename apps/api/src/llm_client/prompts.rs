// Prompt constants for the customization call.
// The structural rules below are requested of the model, never enforced.

/// System role for the customization call.
pub const CUSTOMIZE_SYSTEM: &str = "You are an expert resume customization AI.";

/// Customization prompt template.
/// Replace `{job_description}`, `{notes}` and `{html}` before sending.
pub const CUSTOMIZE_PROMPT_TEMPLATE: &str = r#"Modify ONLY THE TEXT CONTENT WITHIN <li> TAGS in this HTML resume to better match the job description.
PRESERVE ALL HTML TAGS AND STRUCTURE EXACTLY. Follow these rules:

1. Only modify text between <li> and </li> tags
2. Keep the same number of list items in each section
3. Replace technologies from job description where appropriate
4. Use concrete achievements: "Accomplished [X] by doing [Y], resulting in [Z]"
5. Maintain original capitalization and punctuation style
6. Never add or remove any HTML tags

Job Description: {job_description}
User Notes: {notes}

HTML Resume:
{html}
"#;
