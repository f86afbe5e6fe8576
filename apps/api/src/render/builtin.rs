//! In-process HTML-to-PDF engine.
//!
//! Understands the subset of HTML the structurer emits (headings, paragraphs,
//! list items) plus generic containers, and lays it out with the fixed resume
//! style: Times body text, bold slate headings with a rule beneath, indented
//! bullets. Stylesheets in the document are not interpreted.

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use scraper::{ElementRef, Html, Node};

use crate::render::font_metrics::{default_page_config, get_metrics, FontFace, PageConfig};
use crate::render::{PdfEngine, RenderError};

/// `#2E4053` from the stylesheet.
const HEADING_RGB: (f32, f32, f32) = (46.0 / 255.0, 64.0 / 255.0, 83.0 / 255.0);
const HEADING_RULE_WIDTH: f32 = 1.5;
const HEADING_SPACE_BEFORE: f32 = 10.0;
const HEADING_SPACE_AFTER: f32 = 6.0;
const LIST_INDENT: f32 = 15.0;
const MARKER_GAP: f32 = 12.0;
const ITEM_SPACE_AFTER: f32 = 3.75;
const LIST_SPACE_AFTER: f32 = 11.25;
const PARAGRAPH_SPACE_AFTER: f32 = 4.0;

const SKIPPED_ELEMENTS: &[&str] = &["head", "style", "script", "title", "meta", "link", "template"];
const INLINE_ELEMENTS: &[&str] = &[
    "a", "abbr", "b", "cite", "code", "em", "font", "i", "mark", "small", "span", "strong",
    "sub", "sup", "u",
];

#[derive(Debug, Clone, PartialEq)]
enum BlockKind {
    Heading,
    Paragraph,
    ListItem { marker: String },
    /// Marks the end of a list so the gap below it can be applied.
    ListEnd,
}

#[derive(Debug, Clone, PartialEq)]
struct TextBlock {
    kind: BlockKind,
    text: String,
}

/// Lays out HTML with `lopdf` using the base-14 Times faces.
pub struct BuiltinEngine {
    page: PageConfig,
}

impl BuiltinEngine {
    pub fn new() -> Self {
        Self {
            page: default_page_config(),
        }
    }

    fn build_document(&self, html: &str) -> Result<Document, RenderError> {
        let blocks = collect_blocks(html);
        if !blocks
            .iter()
            .any(|b| b.kind != BlockKind::ListEnd && !b.text.is_empty())
        {
            return Err(RenderError::EmptyDocument);
        }

        let pages = layout_pages(&blocks, &self.page);
        assemble(pages, &self.page)
    }
}

impl Default for BuiltinEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfEngine for BuiltinEngine {
    fn name(&self) -> &'static str {
        "builtin"
    }

    fn write_pdf(&self, html: &str, output: &Path) -> Result<(), RenderError> {
        let mut document = self.build_document(html)?;
        document.compress();
        document
            .save(output)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// HTML → text blocks
// ────────────────────────────────────────────────────────────────────────────

struct BlockCollector {
    blocks: Vec<TextBlock>,
    pending: String,
}

fn collect_blocks(html: &str) -> Vec<TextBlock> {
    let document = Html::parse_document(html);
    let mut collector = BlockCollector {
        blocks: Vec::new(),
        pending: String::new(),
    };
    collector.visit_children(document.root_element());
    collector.flush();
    collector.blocks
}

impl BlockCollector {
    fn visit_children(&mut self, element: ElementRef<'_>) {
        let ordered = element.value().name() == "ol";
        let mut ordinal = 0usize;
        for child in element.children() {
            match ElementRef::wrap(child) {
                Some(child_element) => self.visit_element(child_element, ordered, &mut ordinal),
                None => {
                    if let Node::Text(text) = child.value() {
                        self.pending.push_str(text);
                    }
                }
            }
        }
    }

    fn visit_element(&mut self, element: ElementRef<'_>, ordered: bool, ordinal: &mut usize) {
        let name = element.value().name();
        match name {
            _ if SKIPPED_ELEMENTS.contains(&name) => {}
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.flush();
                self.push(BlockKind::Heading, inline_text(element));
            }
            "p" => {
                self.flush();
                self.push(BlockKind::Paragraph, inline_text(element));
            }
            "li" => {
                self.flush();
                *ordinal += 1;
                let marker = if ordered {
                    format!("{ordinal}.")
                } else {
                    "\u{2022}".to_string()
                };
                self.push(BlockKind::ListItem { marker }, inline_text(element));
            }
            "br" => self.pending.push(' '),
            _ if INLINE_ELEMENTS.contains(&name) => {
                self.pending.push(' ');
                self.pending.push_str(&inline_text(element));
                self.pending.push(' ');
            }
            "ul" | "ol" => {
                self.flush();
                self.visit_children(element);
                self.flush();
                self.blocks.push(TextBlock {
                    kind: BlockKind::ListEnd,
                    text: String::new(),
                });
            }
            _ => {
                self.flush();
                self.visit_children(element);
                self.flush();
            }
        }
    }

    fn push(&mut self, kind: BlockKind, text: String) {
        if !text.is_empty() {
            self.blocks.push(TextBlock { kind, text });
        }
    }

    /// Loose text between block elements becomes its own paragraph.
    fn flush(&mut self) {
        let text = collapse_whitespace(&self.pending);
        self.pending.clear();
        self.push(BlockKind::Paragraph, text);
    }
}

fn inline_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ────────────────────────────────────────────────────────────────────────────
// Text blocks → positioned page operations
// ────────────────────────────────────────────────────────────────────────────

struct PageCursor<'a> {
    page: &'a PageConfig,
    pages: Vec<Vec<Operation>>,
    y: f32,
}

impl<'a> PageCursor<'a> {
    fn new(page: &'a PageConfig) -> Self {
        Self {
            page,
            pages: vec![Vec::new()],
            y: page.height_pt - page.margin_pt,
        }
    }

    fn current(&mut self) -> &mut Vec<Operation> {
        // `pages` always holds at least one page.
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Reserves `height` points, starting a new page when it does not fit.
    fn reserve(&mut self, height: f32) {
        let top = self.page.height_pt - self.page.margin_pt;
        if self.y - height < self.page.margin_pt && self.y < top {
            self.pages.push(Vec::new());
            self.y = top;
        }
    }

    fn skip(&mut self, amount: f32) {
        self.y = (self.y - amount).max(self.page.margin_pt);
    }

    fn text_line(
        &mut self,
        face: FontFace,
        size: f32,
        rgb: (f32, f32, f32),
        x: f32,
        text: &str,
    ) {
        let line_height = size * self.page.line_spacing;
        self.reserve(line_height);
        let baseline = self.y - size;
        self.current().extend(text_operations(face, size, rgb, x, baseline, text));
        self.y -= line_height;
    }
}

fn text_operations(
    face: FontFace,
    size: f32,
    rgb: (f32, f32, f32),
    x: f32,
    baseline: f32,
    text: &str,
) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![face.resource_name().into(), size.into()]),
        Operation::new("rg", vec![rgb.0.into(), rgb.1.into(), rgb.2.into()]),
        Operation::new("Td", vec![x.into(), baseline.into()]),
        Operation::new("Tj", vec![Object::string_literal(encode_win_ansi(text))]),
        Operation::new("ET", vec![]),
    ]
}

fn layout_pages(blocks: &[TextBlock], page: &PageConfig) -> Vec<Vec<Operation>> {
    let mut cursor = PageCursor::new(page);
    let left = page.margin_pt;
    let right = page.width_pt - page.margin_pt;
    let black = (0.0, 0.0, 0.0);

    for block in blocks {
        match &block.kind {
            BlockKind::Heading => {
                let size = page.heading_size_pt;
                let metrics = get_metrics(FontFace::TimesBold);
                cursor.skip(HEADING_SPACE_BEFORE);
                let lines = metrics.wrap_lines(&block.text, size, page.text_width_pt());
                // Keep the heading and its rule on one page.
                cursor.reserve(lines.len() as f32 * size * page.line_spacing + HEADING_SPACE_AFTER);
                for line in &lines {
                    cursor.text_line(FontFace::TimesBold, size, HEADING_RGB, left, line);
                }
                let rule_y = cursor.y + size * (page.line_spacing - 1.0) / 2.0;
                cursor.current().extend(vec![
                    Operation::new("w", vec![HEADING_RULE_WIDTH.into()]),
                    Operation::new(
                        "RG",
                        vec![HEADING_RGB.0.into(), HEADING_RGB.1.into(), HEADING_RGB.2.into()],
                    ),
                    Operation::new("m", vec![left.into(), rule_y.into()]),
                    Operation::new("l", vec![right.into(), rule_y.into()]),
                    Operation::new("S", vec![]),
                ]);
                cursor.skip(HEADING_SPACE_AFTER);
            }
            BlockKind::Paragraph => {
                let size = page.body_size_pt;
                let metrics = get_metrics(FontFace::TimesRoman);
                for line in metrics.wrap_lines(&block.text, size, page.text_width_pt()) {
                    cursor.text_line(FontFace::TimesRoman, size, black, left, &line);
                }
                cursor.skip(PARAGRAPH_SPACE_AFTER);
            }
            BlockKind::ListItem { marker } => {
                let size = page.body_size_pt;
                let metrics = get_metrics(FontFace::TimesRoman);
                let text_x = left + LIST_INDENT + MARKER_GAP;
                let lines = metrics.wrap_lines(&block.text, size, right - text_x);
                for (idx, line) in lines.iter().enumerate() {
                    cursor.reserve(size * page.line_spacing);
                    if idx == 0 {
                        let baseline = cursor.y - size;
                        let ops = text_operations(
                            FontFace::TimesRoman,
                            size,
                            black,
                            left + LIST_INDENT,
                            baseline,
                            marker,
                        );
                        cursor.current().extend(ops);
                    }
                    cursor.text_line(FontFace::TimesRoman, size, black, text_x, line);
                }
                cursor.skip(ITEM_SPACE_AFTER);
            }
            BlockKind::ListEnd => cursor.skip(LIST_SPACE_AFTER),
        }
    }

    cursor.pages
}

// ────────────────────────────────────────────────────────────────────────────
// Page operations → PDF document
// ────────────────────────────────────────────────────────────────────────────

fn font_dictionary(doc: &mut Document, face: FontFace) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => face.base_font(),
        "Encoding" => "WinAnsiEncoding",
    })
}

fn assemble(pages: Vec<Vec<Operation>>, page: &PageConfig) -> Result<Document, RenderError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let roman_id = font_dictionary(&mut doc, FontFace::TimesRoman);
    let bold_id = font_dictionary(&mut doc, FontFace::TimesBold);
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            FontFace::TimesRoman.resource_name() => roman_id,
            FontFace::TimesBold.resource_name() => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations };
        let encoded = content
            .encode()
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let media_box: Vec<Object> = vec![
        0.0_f32.into(),
        0.0_f32.into(),
        page.width_pt.into(),
        page.height_pt.into(),
    ];
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => media_box,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    Ok(doc)
}

/// Encodes text for a WinAnsiEncoding simple font. Unmappable characters become `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201c}' => 0x93,
            '\u{201d}' => 0x94,
            '\u{2026}' => 0x85,
            '\u{20ac}' => 0x80,
            _ => b'?',
        })
        .collect()
}
