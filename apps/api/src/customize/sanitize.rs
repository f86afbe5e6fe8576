//! Tolerant re-serialization of model output.
//!
//! The text is parsed with `scraper` (html5ever) and written back one node per
//! line, indented by one space per nesting level. This normalizes markup and
//! closes dangling tags; it does not check what the model changed.

use html_escape::{encode_double_quoted_attribute, encode_text};
use scraper::{ElementRef, Html, Node, Selector};

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose text content is written back unescaped.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Tags counted by [`count_elements`].
const STRUCTURAL_SELECTOR: &str = "h1, h2, h3, h4, h5, h6, p, ul, ol, li";

/// True when the text opens with a document wrapper rather than a fragment.
pub fn is_full_document(html: &str) -> bool {
    let head = html.trim_start();
    let prefix: String = head.chars().take(9).collect::<String>().to_ascii_lowercase();
    prefix.starts_with("<html") || prefix.starts_with("<!doctype")
}

fn parse(html: &str) -> Html {
    if is_full_document(html) {
        Html::parse_document(html)
    } else {
        Html::parse_fragment(html)
    }
}

/// Parses `html` tolerantly and re-serializes it as indented markup.
pub fn prettify(html: &str) -> String {
    let document = parse(html);
    let mut out = String::with_capacity(html.len() + html.len() / 2);

    // Fragments are parsed under a synthetic <html> root; skip it.
    let top = if is_full_document(html) {
        document.tree.root().children()
    } else {
        document.root_element().children()
    };
    for child in top {
        match ElementRef::wrap(child) {
            Some(element) => write_element(element, 0, &mut out),
            None => write_leaf(child.value(), 0, false, &mut out),
        }
    }

    out
}

fn write_element(element: ElementRef<'_>, depth: usize, out: &mut String) {
    let indent = " ".repeat(depth);
    let name = element.value().name();
    let mut attrs: Vec<(&str, &str)> = element.value().attrs().collect();
    attrs.sort_unstable();

    out.push_str(&indent);
    out.push('<');
    out.push_str(name);
    for (key, value) in attrs {
        out.push_str(&format!(" {key}=\"{}\"", encode_double_quoted_attribute(value)));
    }

    if VOID_ELEMENTS.contains(&name) {
        out.push_str("/>\n");
        return;
    }
    out.push_str(">\n");

    let raw_text = RAW_TEXT_ELEMENTS.contains(&name);
    for child in element.children() {
        match ElementRef::wrap(child) {
            Some(child_element) => write_element(child_element, depth + 1, out),
            None => write_leaf(child.value(), depth + 1, raw_text, out),
        }
    }
    out.push_str(&format!("{indent}</{name}>\n"));
}

fn write_leaf(node: &Node, depth: usize, raw_text: bool, out: &mut String) {
    let indent = " ".repeat(depth);
    match node {
        Node::Doctype(doctype) => {
            out.push_str(&format!("<!DOCTYPE {}>\n", doctype.name()));
        }
        Node::Comment(comment) => {
            out.push_str(&format!("{indent}<!--{}-->\n", &**comment));
        }
        Node::Text(text) if raw_text => {
            for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
                out.push_str(&indent);
                out.push_str(line);
                out.push('\n');
            }
        }
        Node::Text(text) => {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push_str(&indent);
                out.push_str(&encode_text(trimmed));
                out.push('\n');
            }
        }
        _ => {}
    }
}

/// Counts `<li>` elements and structural elements (headings, paragraphs, lists).
pub fn count_elements(html: &str) -> (usize, usize) {
    let document = parse(html);
    let li = Selector::parse("li").expect("li selector is valid");
    let structural = Selector::parse(STRUCTURAL_SELECTOR).expect("structural selector is valid");
    (
        document.select(&li).count(),
        document.select(&structural).count(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prettify_fragment_indents_one_space_per_level() {
        let out = prettify("<ul><li>Built Python widgets</li></ul>");
        assert_eq!(out, "<ul>\n <li>\n  Built Python widgets\n </li>\n</ul>\n");
    }

    #[test]
    fn test_prettify_closes_dangling_tags() {
        let out = prettify("<ul><li>one<li>two</ul>");
        assert_eq!(out.matches("</li>").count(), 2);
        assert!(out.ends_with("</ul>\n"));
    }

    #[test]
    fn test_prettify_document_keeps_wrapper_and_style() {
        let out = prettify(
            "<html><head><style>h2 { color: #2E4053; }</style></head><body><h2>Experience</h2></body></html>",
        );
        assert!(out.starts_with("<html>\n"));
        assert!(out.contains("h2 { color: #2E4053; }"));
        assert!(out.contains("<h2>\n   Experience\n  </h2>"));
        assert!(out.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_prettify_escapes_text_and_attributes() {
        let out = prettify(r#"<p class="a&quot;b">R&amp;D &lt;team&gt;</p>"#);
        assert!(out.contains("R&amp;D &lt;team&gt;"));
        assert!(out.contains(r#"class="a&quot;b""#));
    }

    #[test]
    fn test_prettify_void_elements_self_close() {
        let out = prettify("<p>line<br>next</p>");
        assert!(out.contains("<br/>"));
        assert!(!out.contains("</br>"));
    }

    #[test]
    fn test_prettify_is_stable_on_its_own_output() {
        let once = prettify("<h2>Skills</h2><ul><li>Rust</li><p>Go</p></ul>");
        assert_eq!(prettify(&once), once);
    }

    #[test]
    fn test_is_full_document_detection() {
        assert!(is_full_document("  <html><body></body></html>"));
        assert!(is_full_document("<!DOCTYPE html><html></html>"));
        assert!(is_full_document("<HTML></HTML>"));
        assert!(!is_full_document("<ul><li>x</li></ul>"));
        assert!(!is_full_document(""));
    }

    #[test]
    fn test_count_elements() {
        let (li, structural) =
            count_elements("<h2>Experience</h2><ul><p>Acme</p><li>a</li><li>b</li></ul>");
        assert_eq!(li, 2);
        assert_eq!(structural, 5);
    }
}
