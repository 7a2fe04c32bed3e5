//! Paginated PDF rendering with a clickable table of contents.
//!
//! Rendering happens in two passes. The compose pass lays the article out
//! into positioned text lines over letter pages with one-inch margins,
//! recording a link rectangle for every table-of-contents entry and an
//! anchor position for every heading. The emit pass writes the layout with
//! `lopdf`: built-in Helvetica faces with WinAnsiEncoding, one content
//! stream per page, and link annotations whose explicit destinations point
//! at the recorded anchor positions.

use std::collections::HashMap;
use std::io::Cursor;

use lopdf::content::{Content, Operation};
use lopdf::{Document as PdfDocument, Object, ObjectId, Stream, StringFormat, dictionary};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::article::{Article, Block, HeadingLevel};
use crate::{Result, VitalisError};

// Letter geometry, in points.
const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 72.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const TITLE_SIZE: f32 = 18.0;
const H2_SIZE: f32 = 14.0;
const H3_SIZE: f32 = 12.0;
const BODY_SIZE: f32 = 11.0;
const LEADING_FACTOR: f32 = 1.35;
const TOC_INDENT: f32 = 18.0;

/// Fixed anchor name for the references section.
const REFERENCES_ANCHOR: &str = "references";

/// Rough advance width per glyph for the built-in Helvetica faces.
/// Good enough for wrapping; an overlong word may overrun the margin.
const GLYPH_WIDTH_FACTOR: f32 = 0.52;

/// Maximum slug length in characters.
const MAX_SLUG_LEN: usize = 50;

static NON_SLUG_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").unwrap());
static SLUG_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]+").unwrap());

/// Produces a short anchor-safe id from heading text.
///
/// Lowercases, strips everything that is not a word character, whitespace,
/// or hyphen, collapses whitespace and hyphen runs to single underscores,
/// trims leading and trailing underscores, and truncates to 50 characters.
/// An empty result falls back to `"section"`. Idempotent on already
/// slug-shaped input.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = NON_SLUG_CHARS.replace_all(&lowered, "");
    let joined = SLUG_SEPARATORS.replace_all(&stripped, "_");
    let slug: String = joined.trim_matches('_').chars().take(MAX_SLUG_LEN).collect();
    if slug.is_empty() { "section".to_string() } else { slug }
}

struct TocEntry<'a> {
    level: HeadingLevel,
    text: &'a str,
    anchor: String,
}

/// One table-of-contents entry per heading block, with unique anchor ids.
///
/// The second, third, ... occurrence of a base slug gets a `_2`, `_3`, ...
/// suffix; the first occurrence keeps the bare base form.
fn toc_entries(blocks: &[Block]) -> Vec<TocEntry<'_>> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut entries = Vec::new();

    for block in blocks {
        if let Block::Heading { level, text } = block {
            let base = slugify(text);
            let count = seen.entry(base.clone()).and_modify(|c| *c += 1).or_insert(1);
            let anchor = if *count > 1 { format!("{}_{}", base, count) } else { base };
            entries.push(TocEntry { level: *level, text, anchor });
        }
    }

    entries
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Face {
    Regular,
    Bold,
}

struct Line {
    face: Face,
    size: f32,
    x: f32,
    y: f32,
    text: String,
    link_colored: bool,
}

struct LinkRect {
    rect: [f32; 4],
    anchor: String,
}

#[derive(Default)]
struct Page {
    lines: Vec<Line>,
    links: Vec<LinkRect>,
}

struct Layout {
    pages: Vec<Page>,
    /// Anchor name -> (page index, y position of the destination top).
    anchors: HashMap<String, (usize, f32)>,
}

/// Cursor-driven page composer. Text flows top to bottom; a line that
/// would cross the bottom margin starts a new page.
struct Composer {
    pages: Vec<Page>,
    anchors: HashMap<String, (usize, f32)>,
    y: f32,
}

impl Composer {
    fn new() -> Self {
        Self { pages: vec![Page::default()], anchors: HashMap::new(), y: PAGE_HEIGHT - MARGIN }
    }

    fn page_index(&self) -> usize {
        self.pages.len() - 1
    }

    fn ensure_room(&mut self, needed: f32) {
        if self.y - needed < MARGIN {
            self.pages.push(Page::default());
            self.y = PAGE_HEIGHT - MARGIN;
        }
    }

    fn gap(&mut self, amount: f32) {
        self.y -= amount;
    }

    /// Registers an anchor destination at the current cursor position.
    fn anchor(&mut self, name: &str) {
        let index = self.page_index();
        self.anchors.insert(name.to_string(), (index, self.y));
    }

    /// Emits one paragraph of text, word-wrapped to the content width.
    /// When `link` is set, every emitted line gets a clickable rectangle
    /// targeting that anchor.
    fn text(&mut self, face: Face, size: f32, indent: f32, text: &str, link: Option<&str>) {
        let leading = size * LEADING_FACTOR;
        for wrapped in wrap(text, size, CONTENT_WIDTH - indent) {
            self.ensure_room(leading);
            self.y -= leading;
            let x = MARGIN + indent;
            let y = self.y;

            if let Some(anchor) = link {
                let width = text_width(&wrapped, size);
                let index = self.page_index();
                self.pages[index].links.push(LinkRect {
                    rect: [x, y - 2.0, x + width, y + size],
                    anchor: anchor.to_string(),
                });
            }

            let index = self.page_index();
            self.pages[index].lines.push(Line {
                face,
                size,
                x,
                y,
                text: wrapped,
                link_colored: link.is_some(),
            });
        }
    }

    /// Emits a heading with its anchor destination registered exactly at
    /// the heading's position, breaking the page first if needed so the
    /// destination never lands on the previous page.
    fn heading(&mut self, anchor: Option<&str>, size: f32, text: &str) {
        self.ensure_room(size * LEADING_FACTOR);
        if let Some(name) = anchor {
            self.anchor(name);
        }
        self.text(Face::Bold, size, 0.0, text, None);
    }

    fn finish(self) -> Layout {
        Layout { pages: self.pages, anchors: self.anchors }
    }
}

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * GLYPH_WIDTH_FACTOR
}

/// Greedy word wrap against the estimated Helvetica advance width.
fn wrap(text: &str, size: f32, width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if text_width(&current, size) + text_width(" ", size) + text_width(word, size) <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Renders an article as a paginated PDF with a clickable table of
/// contents, returning the complete document as a byte buffer.
pub fn render_pdf(article: &Article) -> Result<Vec<u8>> {
    let entries = toc_entries(&article.blocks);
    let layout = compose(article, &entries);
    emit(&layout)
}

fn compose(article: &Article, entries: &[TocEntry<'_>]) -> Layout {
    let mut composer = Composer::new();

    composer.text(Face::Bold, TITLE_SIZE, 0.0, &article.title, None);
    composer.gap(10.0);

    if !entries.is_empty() || !article.references.is_empty() {
        composer.text(Face::Bold, H2_SIZE, 0.0, "Table of Contents", None);
        composer.gap(4.0);

        for entry in entries {
            let indent = if entry.level == HeadingLevel::H3 { TOC_INDENT } else { 0.0 };
            composer.text(Face::Regular, BODY_SIZE, indent, entry.text, Some(&entry.anchor));
        }
        if !article.references.is_empty() {
            composer.text(Face::Regular, BODY_SIZE, 0.0, "References", Some(REFERENCES_ANCHOR));
        }
        composer.gap(14.0);
    }

    let mut toc_iter = entries.iter();
    for block in &article.blocks {
        match block {
            Block::Heading { level, text } => {
                let size = if *level == HeadingLevel::H2 { H2_SIZE } else { H3_SIZE };
                let anchor = toc_iter.next().map(|entry| entry.anchor.as_str());
                composer.gap(8.0);
                composer.heading(anchor, size, text);
                composer.gap(2.0);
            }
            Block::Paragraph { text } => {
                // Embedded literal newlines become explicit line breaks.
                for segment in text.split('\n') {
                    composer.text(Face::Regular, BODY_SIZE, 0.0, segment, None);
                }
                composer.gap(6.0);
            }
        }
    }

    if !article.references.is_empty() {
        composer.gap(16.0);
        composer.heading(Some(REFERENCES_ANCHOR), H2_SIZE, "References");
        composer.gap(4.0);

        for reference in &article.references {
            let flat = reference.split_whitespace().collect::<Vec<_>>().join(" ");
            composer.text(Face::Regular, BODY_SIZE, 0.0, &flat, None);
            composer.gap(4.0);
        }
    }

    composer.finish()
}

fn emit(layout: &Layout) -> Result<Vec<u8>> {
    let mut doc = PdfDocument::with_version("1.5");

    let pages_id = doc.new_object_id();
    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    // Page ids are allocated up front so link destinations can reference
    // pages that have not been written yet.
    let page_ids: Vec<ObjectId> = layout.pages.iter().map(|_| doc.new_object_id()).collect();

    for (index, page) in layout.pages.iter().enumerate() {
        let encoded = page_content(page)
            .encode()
            .map_err(|e| VitalisError::Pdf(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        let mut annotations: Vec<Object> = Vec::new();
        for link in &page.links {
            let Some(&(target_page, target_y)) = layout.anchors.get(&link.anchor) else {
                continue;
            };
            let destination = vec![
                Object::Reference(page_ids[target_page]),
                "XYZ".into(),
                Object::Null,
                target_y.into(),
                Object::Null,
            ];
            let annotation_id = doc.add_object(dictionary! {
                "Type" => "Annot",
                "Subtype" => "Link",
                "Rect" => link.rect.iter().map(|&v| Object::from(v)).collect::<Vec<Object>>(),
                "Border" => vec![0.into(), 0.into(), 0.into()],
                "Dest" => Object::Array(destination),
            });
            annotations.push(Object::Reference(annotation_id));
        }

        let mut page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        };
        if !annotations.is_empty() {
            page_dict.set("Annots", Object::Array(annotations));
        }
        doc.objects.insert(page_ids[index], Object::Dictionary(page_dict));
    }

    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_ids.len() as i64,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            "Resources" => resources_id,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut cursor = Cursor::new(Vec::new());
    doc.save_to(&mut cursor).map_err(|e| VitalisError::Pdf(e.to_string()))?;
    Ok(cursor.into_inner())
}

fn page_content(page: &Page) -> Content {
    let mut operations = Vec::new();

    for line in &page.lines {
        if line.text.is_empty() {
            continue;
        }
        let font = match line.face {
            Face::Regular => "F1",
            Face::Bold => "F2",
        };

        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec![font.into(), line.size.into()]));
        if line.link_colored {
            operations.push(Operation::new("rg", vec![0.into(), 0.into(), 1.into()]));
        }
        operations.push(Operation::new("Td", vec![line.x.into(), line.y.into()]));
        operations.push(Operation::new(
            "Tj",
            vec![Object::String(winansi(&line.text), StringFormat::Literal)],
        ));
        if line.link_colored {
            operations.push(Operation::new("rg", vec![0.into(), 0.into(), 0.into()]));
        }
        operations.push(Operation::new("ET", vec![]));
    }

    Content { operations }
}

/// Transcodes text to WinAnsi bytes for the built-in Type1 faces.
///
/// ASCII and the Latin-1 block map directly; the common typographic
/// punctuation Wikipedia uses gets its WinAnsi code point; everything else
/// degrades to `?`. Delimiter escaping inside the literal string is handled
/// by the lopdf writer.
fn winansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{0020}'..='\u{007e}' => c as u8,
            '\u{00a0}'..='\u{00ff}' => c as u8,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201c}' => 0x93,
            '\u{201d}' => 0x94,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2022}' => 0x95,
            '\u{2026}' => 0x85,
            _ => b'?',
        })
        .collect()
}
