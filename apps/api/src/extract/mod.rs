//! PDF text extraction.
//!
//! `TextExtractor` is the seam; `PdfTextExtractor` delegates to `pdf-extract`.
//! Extraction is CPU-bound and synchronous, callers run it via
//! `tokio::task::spawn_blocking`.

use thiserror::Error;
use tracing::debug;

use crate::models::resume::RawText;

/// How far into the stream the `%PDF-` header may appear.
const HEADER_SEARCH_WINDOW: usize = 1024;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("uploaded file is not a PDF document")]
    NotPdf,

    #[error("could not read PDF: {0}")]
    Unreadable(String),

    #[error("PDF contains no pages")]
    NoPages,

    #[error("page {page} has no extractable text (scanned or image-only?)")]
    EmptyPage { page: usize },
}

/// Converts an uploaded document into plain text.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, document: &[u8]) -> Result<RawText, ExtractionError>;
}

/// Page-by-page extraction backed by `pdf-extract`.
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, document: &[u8]) -> Result<RawText, ExtractionError> {
        if !has_pdf_header(document) {
            return Err(ExtractionError::NotPdf);
        }

        // pdf-extract panics on some malformed inputs; treat that as unreadable.
        let pages = std::panic::catch_unwind(|| {
            pdf_extract::extract_text_from_mem_by_pages(document)
        })
        .map_err(|_| ExtractionError::Unreadable("parser aborted on malformed input".into()))?
        .map_err(|e| ExtractionError::Unreadable(e.to_string()))?;

        check_pages(&pages)?;
        let raw = RawText::from_pages(pages);
        debug!(
            "Extracted {} line(s) from {} page(s)",
            raw.lines().count(),
            raw.page_count()
        );
        Ok(raw)
    }
}

fn has_pdf_header(document: &[u8]) -> bool {
    let window = &document[..document.len().min(HEADER_SEARCH_WINDOW)];
    window.windows(5).any(|w| w == b"%PDF-")
}

/// Every page must contribute some text; a blank page means the content was lost.
fn check_pages(pages: &[String]) -> Result<(), ExtractionError> {
    if pages.is_empty() {
        return Err(ExtractionError::NoPages);
    }
    match pages.iter().position(|p| p.trim().is_empty()) {
        Some(idx) => Err(ExtractionError::EmptyPage { page: idx + 1 }),
        None => Ok(()),
    }
}
