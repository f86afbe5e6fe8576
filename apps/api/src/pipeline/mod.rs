//! Resume pipeline: orchestrates one interaction end to end.
//!
//! Flow: Extracting → Structuring → Customizing → AwaitingEdit → Rendering →
//! Ready, or Failed from any stage. No retries: a failure ends the interaction
//! and the user starts over.
//!
//! Extraction and rendering are CPU-bound and run on the blocking pool.

pub mod handlers;

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::customize::Customizer;
use crate::errors::AppError;
use crate::extract::TextExtractor;
use crate::models::resume::{CustomizedHtml, RenderedPdf, StructureCheck, StructuredHtml};
use crate::render::Renderer;
use crate::structure::structure;

/// Where an interaction currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    Extracting,
    Structuring,
    Customizing,
    AwaitingEdit,
    Rendering,
    Ready,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Extracting => "extracting",
            Stage::Structuring => "structuring",
            Stage::Customizing => "customizing",
            Stage::AwaitingEdit => "awaiting_edit",
            Stage::Rendering => "rendering",
            Stage::Ready => "ready",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One user-triggered run. Tracks and logs stage transitions.
#[derive(Debug)]
pub struct Interaction {
    pub id: Uuid,
    stage: Stage,
}

impl Interaction {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            stage: Stage::Idle,
        }
    }

    /// Picks up an interaction whose customized HTML is back from the user.
    /// Keeps the client's id when it sends one so logs line up.
    pub fn resume_edit(id: Option<Uuid>) -> Self {
        Self {
            id: id.unwrap_or_else(Uuid::new_v4),
            stage: Stage::AwaitingEdit,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn advance(&mut self, next: Stage) {
        info!(interaction = %self.id, "{} -> {}", self.stage, next);
        self.stage = next;
    }

    /// Records the failure and hands the error back for propagation.
    fn fail(&mut self, err: AppError) -> AppError {
        error!(interaction = %self.id, "failed while {}: {err}", self.stage);
        self.stage = Stage::Failed;
        err
    }
}

impl Default for Interaction {
    fn default() -> Self {
        Self::new()
    }
}

/// Output of the customization half, shown to the user for editing.
#[derive(Debug, Clone, Serialize)]
pub struct CustomizationOutcome {
    pub interaction_id: Uuid,
    pub stage: Stage,
    pub page_count: usize,
    pub original_html: StructuredHtml,
    pub customized_html: CustomizedHtml,
    pub structure_check: StructureCheck,
}

/// The four stages wired together with their collaborators.
#[derive(Clone)]
pub struct ResumePipeline {
    extractor: Arc<dyn TextExtractor>,
    customizer: Customizer,
    renderer: Renderer,
}

impl ResumePipeline {
    pub fn new(extractor: Arc<dyn TextExtractor>, customizer: Customizer, renderer: Renderer) -> Self {
        Self {
            extractor,
            customizer,
            renderer,
        }
    }

    /// Idle → Extracting → Structuring → Customizing → AwaitingEdit.
    pub async fn customize(
        &self,
        interaction: &mut Interaction,
        document: Bytes,
        job_description: &str,
        notes: &str,
    ) -> Result<CustomizationOutcome, AppError> {
        interaction.advance(Stage::Extracting);
        let extractor = Arc::clone(&self.extractor);
        let raw = tokio::task::spawn_blocking(move || extractor.extract(&document))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in extraction: {e}")))
            .and_then(|r| r.map_err(AppError::from))
            .map_err(|e| interaction.fail(e))?;

        interaction.advance(Stage::Structuring);
        let original_html = structure(&raw);

        interaction.advance(Stage::Customizing);
        let customization = self
            .customizer
            .customize(&original_html, job_description, notes)
            .await
            .map_err(|e| interaction.fail(e.into()))?;

        interaction.advance(Stage::AwaitingEdit);
        Ok(CustomizationOutcome {
            interaction_id: interaction.id,
            stage: interaction.stage(),
            page_count: raw.page_count(),
            original_html,
            customized_html: customization.html,
            structure_check: customization.check,
        })
    }

    /// AwaitingEdit → Rendering → Ready.
    pub async fn render(
        &self,
        interaction: &mut Interaction,
        final_html: String,
    ) -> Result<RenderedPdf, AppError> {
        interaction.advance(Stage::Rendering);
        let renderer = self.renderer.clone();
        let pdf = tokio::task::spawn_blocking(move || renderer.render(&final_html))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in rendering: {e}")))
            .and_then(|r| r.map_err(AppError::from))
            .map_err(|e| interaction.fail(e))?;

        interaction.advance(Stage::Ready);
        info!(
            interaction = %interaction.id,
            "Rendered {} bytes with {} engine",
            pdf.bytes.len(),
            self.renderer.engine_name()
        );
        Ok(pdf)
    }

    /// Whole interaction in one call. `edited_html` replaces the customized
    /// HTML when present and non-blank.
    pub async fn run(
        &self,
        interaction: &mut Interaction,
        document: Bytes,
        job_description: &str,
        notes: &str,
        edited_html: Option<String>,
    ) -> Result<RenderedPdf, AppError> {
        let outcome = self
            .customize(interaction, document, job_description, notes)
            .await?;
        let final_html = edited_html
            .filter(|html| !html.trim().is_empty())
            .unwrap_or(outcome.customized_html.0);
        self.render(interaction, final_html).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customize::tests::ScriptedLlm;
    use crate::extract::{ExtractionError, PdfTextExtractor};
    use crate::models::resume::RawText;
    use crate::render::BuiltinEngine;

    /// Extractor double standing in for a one-page PDF.
    struct OnePage(&'static str);

    impl TextExtractor for OnePage {
        fn extract(&self, _document: &[u8]) -> Result<RawText, ExtractionError> {
            Ok(RawText::from_pages([self.0]))
        }
    }

    const MOCK_REPLY: &str = "```html\n<html><head><style></style></head><body><h2>Experience</h2>\
        <ul><li>Built Python widgets</li><li>Fixed Python bugs</li></ul></body></html>\n```";

    fn pipeline(
        extractor: Arc<dyn TextExtractor>,
        llm: Arc<ScriptedLlm>,
        scratch: &std::path::Path,
    ) -> ResumePipeline {
        ResumePipeline::new(
            extractor,
            Customizer::new(llm),
            Renderer::new(Arc::new(BuiltinEngine::new()), scratch),
        )
    }

    fn entries(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn test_end_to_end_one_page_resume() {
        let scratch = tempfile::tempdir().unwrap();
        let llm = Arc::new(ScriptedLlm::replying(MOCK_REPLY));
        let pipeline = pipeline(
            Arc::new(OnePage("Experience\n\n- Built widgets\n- Fixed bugs")),
            llm.clone(),
            scratch.path(),
        );
        let mut interaction = Interaction::new();

        let outcome = pipeline
            .customize(
                &mut interaction,
                Bytes::from_static(b"%PDF-1.4"),
                "seeking Python expert",
                "",
            )
            .await
            .unwrap();

        assert_eq!(interaction.stage(), Stage::AwaitingEdit);
        let original = &outcome.original_html.0;
        assert_eq!(original.matches("<h2>Experience</h2>").count(), 1);
        assert_eq!(original.matches("<ul>").count(), 1);
        assert_eq!(original.matches("<li>").count(), 2);

        {
            let prompts = llm.prompts.lock().unwrap();
            assert_eq!(prompts.len(), 1);
            assert!(prompts[0].0.contains("<li>Built widgets</li>"));
            assert!(prompts[0].0.contains("<li>Fixed bugs</li>"));
        }
        assert!(outcome.customized_html.0.contains("Built Python widgets"));
        assert!(outcome.structure_check.preserved);

        let pdf = pipeline
            .render(&mut interaction, outcome.customized_html.0.clone())
            .await
            .unwrap();

        assert_eq!(interaction.stage(), Stage::Ready);
        assert!(!pdf.bytes.is_empty());
        assert!(pdf.bytes.starts_with(b"%PDF-"));
        assert_eq!(entries(scratch.path()), 0);
    }

    #[tokio::test]
    async fn test_non_pdf_upload_fails_in_extraction() {
        let scratch = tempfile::tempdir().unwrap();
        let llm = Arc::new(ScriptedLlm::replying(MOCK_REPLY));
        let pipeline = pipeline(Arc::new(PdfTextExtractor), llm.clone(), scratch.path());
        let mut interaction = Interaction::new();

        let err = pipeline
            .run(
                &mut interaction,
                Bytes::from_static(b"Jane Doe\nExperience\n- Built widgets"),
                "seeking Python expert",
                "",
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Extraction(ExtractionError::NotPdf)));
        assert!(err.user_message().starts_with("Error processing resume: "));
        assert_eq!(interaction.stage(), Stage::Failed);
        assert!(llm.prompts.lock().unwrap().is_empty());
        assert_eq!(entries(scratch.path()), 0);
    }

    #[tokio::test]
    async fn test_service_failure_stops_before_rendering() {
        let scratch = tempfile::tempdir().unwrap();
        let pipeline = pipeline(
            Arc::new(OnePage("Experience\n\n- Built widgets")),
            Arc::new(ScriptedLlm::failing("rate limited")),
            scratch.path(),
        );
        let mut interaction = Interaction::new();

        let err = pipeline
            .run(&mut interaction, Bytes::new(), "jd", "", None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Customization(_)));
        assert!(err.user_message().contains("rate limited"));
        assert_eq!(interaction.stage(), Stage::Failed);
        assert_eq!(entries(scratch.path()), 0);
    }

    #[tokio::test]
    async fn test_run_prefers_edited_html() {
        let scratch = tempfile::tempdir().unwrap();
        let pipeline = pipeline(
            Arc::new(OnePage("Experience\n\n- Built widgets")),
            Arc::new(ScriptedLlm::replying(MOCK_REPLY)),
            scratch.path(),
        );
        let mut interaction = Interaction::new();

        // A blank edit falls back to the customized HTML, an empty document fails.
        let pdf = pipeline
            .run(&mut interaction, Bytes::new(), "jd", "", Some("  ".into()))
            .await
            .unwrap();
        assert!(!pdf.bytes.is_empty());

        let mut interaction = Interaction::new();
        let err = pipeline
            .run(
                &mut interaction,
                Bytes::new(),
                "jd",
                "",
                Some("<html><body><ul></ul></body></html>".into()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Render(_)));
        assert_eq!(interaction.stage(), Stage::Failed);
        assert_eq!(entries(scratch.path()), 0);
    }

    #[tokio::test]
    async fn test_end_to_end_with_real_extraction() {
        let fixture_dir = tempfile::tempdir().unwrap();
        let upload = Renderer::new(Arc::new(BuiltinEngine::new()), fixture_dir.path())
            .render("<h2>Experience</h2><ul><li>Built widgets</li><li>Fixed bugs</li></ul>")
            .unwrap();

        let scratch = tempfile::tempdir().unwrap();
        let llm = Arc::new(ScriptedLlm::replying(MOCK_REPLY));
        let pipeline = pipeline(Arc::new(PdfTextExtractor), llm.clone(), scratch.path());
        let mut interaction = Interaction::new();

        let outcome = pipeline
            .customize(
                &mut interaction,
                Bytes::from(upload.bytes),
                "seeking Python expert",
                "",
            )
            .await
            .unwrap();

        assert_eq!(outcome.page_count, 1);
        let original = &outcome.original_html.0;
        assert!(original.contains("<h2>Experience</h2>"));
        assert!(original.contains("<li>Built widgets</li>"));
        assert!(original.contains("<li>Fixed bugs</li>"));
        assert!(llm.prompts.lock().unwrap()[0]
            .0
            .contains("<li>Built widgets</li>"));

        let pdf = pipeline
            .render(&mut interaction, outcome.customized_html.0)
            .await
            .unwrap();
        assert_eq!(interaction.stage(), Stage::Ready);
        assert!(pdf.bytes.starts_with(b"%PDF-"));
        assert_eq!(entries(scratch.path()), 0);
    }

    #[test]
    fn test_resume_edit_keeps_client_interaction_id() {
        let id = Uuid::parse_str("6f1c2a7e-3b4d-4e5f-8a9b-0c1d2e3f4a5b").unwrap();
        let interaction = Interaction::resume_edit(Some(id));
        assert_eq!(interaction.id, id);
        assert_eq!(interaction.stage(), Stage::AwaitingEdit);

        let fresh = Interaction::resume_edit(None);
        assert_ne!(fresh.id, id);
        assert_eq!(fresh.stage(), Stage::AwaitingEdit);
    }

    #[test]
    fn test_stage_display_matches_serde_name() {
        assert_eq!(Stage::AwaitingEdit.to_string(), "awaiting_edit");
        assert_eq!(
            serde_json::to_value(Stage::AwaitingEdit).unwrap(),
            serde_json::json!("awaiting_edit")
        );
    }
}
