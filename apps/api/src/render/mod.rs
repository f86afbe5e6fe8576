// Renderer: final HTML → PDF bytes through a pluggable engine.
// Rendering is CPU-bound and synchronous; callers run it via tokio::task::spawn_blocking.

pub mod builtin;
pub mod command;
pub mod font_metrics;

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::customize::sanitize::is_full_document;
use crate::models::resume::RenderedPdf;

pub use builtin::BuiltinEngine;
pub use command::CommandEngine;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("document has no renderable content")]
    EmptyDocument,

    #[error("rendering engine '{engine}' failed: {message}")]
    Engine { engine: String, message: String },

    #[error("PDF assembly failed: {0}")]
    Pdf(String),

    #[error("rendering engine produced an empty file")]
    EmptyOutput,

    #[error("temporary file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes a PDF for an HTML document to the given path.
pub trait PdfEngine: Send + Sync {
    fn name(&self) -> &'static str;
    fn write_pdf(&self, html: &str, output: &Path) -> Result<(), RenderError>;
}

/// Wraps bare fragments in a minimal `<html><body>` shell.
pub fn wrap_document(html: &str) -> Cow<'_, str> {
    if is_full_document(html) {
        Cow::Borrowed(html)
    } else {
        Cow::Owned(format!("<html><body>{html}</body></html>"))
    }
}

/// Materializes the PDF in a uniquely named temporary file, reads it back and
/// removes it. The file is removed on every exit path.
#[derive(Clone)]
pub struct Renderer {
    engine: Arc<dyn PdfEngine>,
    scratch_dir: PathBuf,
}

impl Renderer {
    pub fn new(engine: Arc<dyn PdfEngine>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            engine,
            scratch_dir: scratch_dir.into(),
        }
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    pub fn render(&self, html: &str) -> Result<RenderedPdf, RenderError> {
        let document = wrap_document(html);

        let output = tempfile::Builder::new()
            .prefix("custom_resume-")
            .suffix(".pdf")
            .tempfile_in(&self.scratch_dir)?;
        debug!(
            "Rendering with {} engine into {}",
            self.engine.name(),
            output.path().display()
        );

        self.engine.write_pdf(&document, output.path())?;
        let bytes = std::fs::read(output.path())?;
        output.close()?;

        if bytes.is_empty() {
            return Err(RenderError::EmptyOutput);
        }
        Ok(RenderedPdf { bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Engine double that records the document it was handed.
    struct RecordingEngine {
        seen: Mutex<Vec<String>>,
        fail: bool,
    }

    impl PdfEngine for RecordingEngine {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn write_pdf(&self, html: &str, output: &Path) -> Result<(), RenderError> {
            self.seen.lock().unwrap().push(html.to_string());
            std::fs::write(output, b"%PDF-1.4 stub")?;
            if self.fail {
                return Err(RenderError::Pdf("layout exploded".into()));
            }
            Ok(())
        }
    }

    fn recording(fail: bool) -> Arc<RecordingEngine> {
        Arc::new(RecordingEngine {
            seen: Mutex::new(Vec::new()),
            fail,
        })
    }

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_wrap_document_wraps_fragments_only() {
        assert_eq!(
            wrap_document("<ul><li>x</li></ul>"),
            "<html><body><ul><li>x</li></ul></body></html>"
        );
        let full = "<html><body><p>x</p></body></html>";
        assert!(matches!(wrap_document(full), Cow::Borrowed(_)));
        assert!(matches!(wrap_document("<!DOCTYPE html><html></html>"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_render_hands_engine_wrapped_fragment() {
        let scratch = tempfile::tempdir().unwrap();
        let engine = recording(false);
        let renderer = Renderer::new(engine.clone(), scratch.path());

        let pdf = renderer.render("<ul><li>Built Python widgets</li></ul>").unwrap();

        assert_eq!(pdf.bytes, b"%PDF-1.4 stub");
        assert_eq!(
            engine.seen.lock().unwrap()[0],
            "<html><body><ul><li>Built Python widgets</li></ul></body></html>"
        );
        assert_eq!(entries(scratch.path()), 0);
    }

    #[test]
    fn test_render_failure_removes_temp_file() {
        let scratch = tempfile::tempdir().unwrap();
        let renderer = Renderer::new(recording(true), scratch.path());

        let err = renderer.render("<p>x</p>").unwrap_err();

        assert!(matches!(err, RenderError::Pdf(_)));
        assert_eq!(entries(scratch.path()), 0);
    }

    #[test]
    fn test_builtin_render_round_trip_leaves_no_files() {
        let scratch = tempfile::tempdir().unwrap();
        let renderer = Renderer::new(Arc::new(BuiltinEngine::new()), scratch.path());

        let pdf = renderer
            .render("<h2>Experience</h2><ul><li>Built Python widgets</li></ul>")
            .unwrap();

        assert!(pdf.bytes.starts_with(b"%PDF-"));
        assert_eq!(entries(scratch.path()), 0);
    }

    #[test]
    fn test_builtin_render_rejects_empty_document() {
        let scratch = tempfile::tempdir().unwrap();
        let renderer = Renderer::new(Arc::new(BuiltinEngine::new()), scratch.path());
        assert!(matches!(
            renderer.render("   ").unwrap_err(),
            RenderError::EmptyDocument
        ));
        assert_eq!(entries(scratch.path()), 0);
    }

    #[test]
    fn test_missing_scratch_dir_is_io_error() {
        let scratch = tempfile::tempdir().unwrap();
        let missing = scratch.path().join("gone");
        let renderer = Renderer::new(Arc::new(BuiltinEngine::new()), missing);
        assert!(matches!(renderer.render("<p>x</p>").unwrap_err(), RenderError::Io(_)));
    }
}
