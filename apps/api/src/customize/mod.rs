//! Customizer: asks the text-generation service to tailor list-item text to a
//! job description, then cleans up what comes back.
//!
//! Flow: fill prompt → one completion call → strip code fence → prettify →
//! structure check (advisory, logged, never enforced).

pub mod sanitize;

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::llm_client::prompts::{CUSTOMIZE_PROMPT_TEMPLATE, CUSTOMIZE_SYSTEM};
use crate::llm_client::{CompletionService, LlmError};
use crate::models::resume::{CustomizedHtml, StructureCheck, StructuredHtml};

const FENCE: &str = "```";

#[derive(Debug, Error)]
pub enum CustomizeError {
    #[error("text generation service failed: {0}")]
    Service(#[from] LlmError),

    #[error("text generation service returned an empty document")]
    EmptyResponse,
}

/// Result of one customization pass.
#[derive(Debug, Clone)]
pub struct Customization {
    pub html: CustomizedHtml,
    pub check: StructureCheck,
}

/// Tailors structured resume HTML through an injected completion service.
#[derive(Clone)]
pub struct Customizer {
    llm: Arc<dyn CompletionService>,
}

impl Customizer {
    pub fn new(llm: Arc<dyn CompletionService>) -> Self {
        Self { llm }
    }

    pub async fn customize(
        &self,
        resume: &StructuredHtml,
        job_description: &str,
        notes: &str,
    ) -> Result<Customization, CustomizeError> {
        let prompt = build_prompt(&resume.0, job_description, notes);
        let response = self.llm.complete(&prompt, CUSTOMIZE_SYSTEM).await?;

        let body = strip_fence_lines(&response);
        if body.is_empty() {
            return Err(CustomizeError::EmptyResponse);
        }

        let html = sanitize::prettify(body);
        let check = check_structure(&resume.0, &html);
        if check.preserved {
            info!(
                "Customized resume keeps {} list item(s)",
                check.customized_list_items
            );
        } else {
            warn!(
                "Model changed resume structure: list items {} -> {}, elements {} -> {}",
                check.original_list_items,
                check.customized_list_items,
                check.original_elements,
                check.customized_elements
            );
        }

        Ok(Customization {
            html: CustomizedHtml(html),
            check,
        })
    }
}

/// Fills the customization template in a single pass, so placeholder-like
/// text inside the substituted values is left alone.
pub fn build_prompt(html: &str, job_description: &str, notes: &str) -> String {
    let values = [
        ("{job_description}", job_description),
        ("{notes}", notes),
        ("{html}", html),
    ];

    let mut prompt = String::with_capacity(
        CUSTOMIZE_PROMPT_TEMPLATE.len() + html.len() + job_description.len() + notes.len(),
    );
    let mut rest = CUSTOMIZE_PROMPT_TEMPLATE;
    while let Some(start) = rest.find('{') {
        prompt.push_str(&rest[..start]);
        let tail = &rest[start..];
        match values.iter().find(|(key, _)| tail.starts_with(key)) {
            Some((key, value)) => {
                prompt.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                prompt.push('{');
                rest = &tail[1..];
            }
        }
    }
    prompt.push_str(rest);
    prompt
}

/// Drops a surrounding code fence from a model response.
///
/// The trimmed response must start and end with a triple backtick and span at
/// least three lines; the first and last lines are removed and the remainder
/// trimmed. Anything else is returned trimmed but otherwise untouched.
pub fn strip_fence_lines(response: &str) -> &str {
    let text = response.trim();
    if !(text.starts_with(FENCE) && text.ends_with(FENCE)) {
        return text;
    }

    let line_count = text.lines().count();
    if line_count < 3 {
        return text;
    }

    let body_start = text.find('\n').map_or(text.len(), |i| i + 1);
    let body_end = text.rfind('\n').unwrap_or(body_start);
    if body_start >= body_end {
        return "";
    }
    text[body_start..body_end].trim()
}

/// Compares list-item and structural element counts before and after.
pub fn check_structure(original: &str, customized: &str) -> StructureCheck {
    let (original_list_items, original_elements) = sanitize::count_elements(original);
    let (customized_list_items, customized_elements) = sanitize::count_elements(customized);
    StructureCheck {
        original_list_items,
        customized_list_items,
        original_elements,
        customized_elements,
        preserved: original_list_items == customized_list_items
            && original_elements == customized_elements,
    }
}
