//! Per-interaction resume artifacts. Nothing here outlives a request.

use serde::Serialize;

/// Text extracted from the uploaded PDF, pages joined by `\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawText {
    text: String,
    page_count: usize,
}

impl RawText {
    pub fn from_pages<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pages: Vec<S> = pages.into_iter().collect();
        let page_count = pages.len();
        let text = pages
            .iter()
            .map(|page| page.as_ref())
            .collect::<Vec<&str>>()
            .join("\n");
        Self { text, page_count }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Lines in reading order across all pages.
    pub fn lines(&self) -> std::str::Lines<'_> {
        self.text.lines()
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }
}

/// Heuristic HTML document produced by the structurer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StructuredHtml(pub String);

/// Model output after fence stripping and re-serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CustomizedHtml(pub String);

/// Element counts before and after customization.
///
/// Advisory only: a mismatch is reported, the customized HTML still flows on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructureCheck {
    pub original_list_items: usize,
    pub customized_list_items: usize,
    pub original_elements: usize,
    pub customized_elements: usize,
    pub preserved: bool,
}

/// The rendered artifact, already read back from its temporary file.
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
}

impl RenderedPdf {
    /// Download name presented to the user.
    pub const FILE_NAME: &'static str = "custom_resume.pdf";
    pub const MIME_TYPE: &'static str = "application/pdf";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_text_joins_pages_with_newline() {
        let raw = RawText::from_pages(["Page one", "Page two"]);
        assert_eq!(raw.as_str(), "Page one\nPage two");
        assert_eq!(raw.page_count(), 2);
        assert_eq!(raw.lines().count(), 2);
    }

    #[test]
    fn test_raw_text_single_page() {
        let raw = RawText::from_pages(vec!["Experience\n\n- Built widgets".to_string()]);
        assert_eq!(raw.page_count(), 1);
        assert_eq!(raw.lines().collect::<Vec<_>>(), ["Experience", "", "- Built widgets"]);
    }
}
