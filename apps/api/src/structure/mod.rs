//! Structurer: turns extracted resume text into a minimal styled HTML document.
//!
//! This is a heuristic, not a parser. Two rules drive it:
//!
//! 1. [`classify_block`]: a blank-line separated block whose trimmed text is a
//!    capital letter followed only by ASCII letters and spaces is a heading.
//!    Short capitalized prose ("Team player") is misclassified as a heading.
//! 2. [`classify_line`]: inside any other block, a line starting with a bullet
//!    glyph, hyphen or asterisk is a bullet; everything else is prose.
//!
//! Every non-heading block becomes one `<ul>`, and prose lines are emitted as
//! `<p>` inside that list alongside the `<li>` bullets.

use std::sync::OnceLock;

use html_escape::encode_text;
use regex::Regex;

use crate::models::resume::{RawText, StructuredHtml};

/// Fixed stylesheet embedded in every structured document.
pub const STYLESHEET: &str = "\
        body { font-family: 'Times New Roman'; margin: 40px; padding: 20px; }
        h2 { color: #2E4053; border-bottom: 2px solid #2E4053; font-weight: bold; }
        ul { margin-top: 5px; margin-bottom: 15px; padding-left: 20px; }
        li { margin-bottom: 5px; }
    ";

const BULLET_MARKERS: [char; 3] = ['•', '-', '*'];

fn block_separator() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n").expect("block separator regex is valid"))
}

fn heading_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z][a-zA-Z ]+$").expect("heading regex is valid"))
}

/// Classification of one blank-line separated block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block<'a> {
    /// Trimmed heading text.
    Heading(&'a str),
    /// Untrimmed block body, split into lines later.
    Body(&'a str),
}

/// Classification of one line inside a body block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    /// Bullet text with the marker removed and whitespace trimmed.
    Bullet(&'a str),
    /// Trimmed prose line.
    Prose(&'a str),
}

/// Rule 1. Needs at least two characters, so a lone "A" stays body text.
pub fn classify_block(block: &str) -> Block<'_> {
    let trimmed = block.trim();
    if heading_pattern().is_match(trimmed) {
        Block::Heading(trimmed)
    } else {
        Block::Body(block)
    }
}

/// Rule 2.
pub fn classify_line(line: &str) -> Line<'_> {
    let trimmed = line.trim();
    match trimmed.strip_prefix(&BULLET_MARKERS[..]) {
        Some(rest) => Line::Bullet(rest.trim()),
        None => Line::Prose(trimmed),
    }
}

/// Builds the structured HTML document for the given text.
/// Pure and deterministic: identical input yields byte-identical output.
pub fn structure(raw: &RawText) -> StructuredHtml {
    StructuredHtml(structure_text(raw.as_str()))
}

pub fn structure_text(text: &str) -> String {
    let mut html = String::with_capacity(text.len() * 2 + STYLESHEET.len() + 64);
    html.push_str("<html><head><style>");
    html.push_str(STYLESHEET);
    html.push_str("</style></head><body>");

    for block in block_separator().split(text) {
        match classify_block(block) {
            Block::Heading(title) => {
                html.push_str("<h2>");
                html.push_str(&encode_text(title));
                html.push_str("</h2>");
            }
            Block::Body(body) => {
                html.push_str("<ul>");
                for line in body.split('\n') {
                    let (open, close, content) = match classify_line(line) {
                        Line::Bullet(text) => ("<li>", "</li>", text),
                        Line::Prose(text) => ("<p>", "</p>", text),
                    };
                    html.push_str(open);
                    html.push_str(&encode_text(content));
                    html.push_str(close);
                }
                html.push_str("</ul>");
            }
        }
    }

    html.push_str("</body></html>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn test_classify_block_heading() {
        assert_eq!(classify_block("  Experience \n"), Block::Heading("Experience"));
        assert_eq!(
            classify_block("Professional Summary"),
            Block::Heading("Professional Summary")
        );
    }

    #[test]
    fn test_classify_block_rejects_lowercase_digits_and_punctuation() {
        assert!(matches!(classify_block("experience"), Block::Body(_)));
        assert!(matches!(classify_block("Skills: Rust"), Block::Body(_)));
        assert!(matches!(classify_block("Class of 2020"), Block::Body(_)));
        assert!(matches!(classify_block("A"), Block::Body(_)));
        assert!(matches!(classify_block("Experience\n- Built"), Block::Body(_)));
    }

    #[test]
    fn test_classify_block_short_prose_false_positive() {
        // Known heuristic weakness: capitalized prose reads as a heading.
        assert_eq!(classify_block("Team player"), Block::Heading("Team player"));
    }

    #[test]
    fn test_classify_line_markers() {
        assert_eq!(classify_line("  - Built widgets "), Line::Bullet("Built widgets"));
        assert_eq!(classify_line("* Fixed bugs"), Line::Bullet("Fixed bugs"));
        assert_eq!(classify_line("• Shipped v2"), Line::Bullet("Shipped v2"));
        assert_eq!(classify_line("Acme Corp, 2020"), Line::Prose("Acme Corp, 2020"));
    }

    #[test]
    fn test_no_headings_without_capitalized_blocks() {
        let html = structure_text("jane doe\njane@example.com\n\n- built widgets\n- fixed bugs 2x");
        assert_eq!(count(&html, "<h2>"), 0);
    }

    #[test]
    fn test_one_heading_per_matching_block_verbatim() {
        let html = structure_text("Experience\n\n- Built widgets\n\nEducation\n\nState University, 2019");
        assert_eq!(count(&html, "<h2>"), 2);
        assert!(html.contains("<h2>Experience</h2>"));
        assert!(html.contains("<h2>Education</h2>"));
    }

    #[test]
    fn test_mixed_block_keeps_prose_inside_list() {
        let html = structure_text("Acme Corp\n- Built widgets\n- Fixed bugs");
        assert!(html.contains("<ul><p>Acme Corp</p><li>Built widgets</li><li>Fixed bugs</li></ul>"));
    }

    #[test]
    fn test_end_to_end_sample_structure() {
        let html = structure_text("Experience\n\n- Built widgets\n- Fixed bugs");
        assert_eq!(count(&html, "<h2>"), 1);
        assert_eq!(count(&html, "<ul>"), 1);
        assert_eq!(count(&html, "<li>"), 2);
        assert!(html.starts_with("<html><head><style>"));
        assert!(html.ends_with("</body></html>"));
        assert!(html.contains(STYLESHEET));
    }

    #[test]
    fn test_blank_lines_with_whitespace_split_blocks() {
        let html = structure_text("Skills\n   \t\n- Rust");
        assert!(html.contains("<h2>Skills</h2><ul><li>Rust</li></ul>"));
    }

    #[test]
    fn test_text_is_escaped() {
        let html = structure_text("- Cut p99 <50ms & halved cost");
        assert!(html.contains("<li>Cut p99 &lt;50ms &amp; halved cost</li>"));
    }

    #[test]
    fn test_structuring_is_idempotent() {
        let text = "Jane Doe\n\nExperience\n\n- Built widgets\n* Fixed bugs\nAcme\n\nSkills\n\nRust, Go";
        let raw = RawText::from_pages([text]);
        assert_eq!(structure(&raw), structure(&raw));
    }
}
