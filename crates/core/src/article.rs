//! Wikipedia article fetching and structural parsing.
//!
//! The parser turns one article page into an [`Article`]: the page title, an
//! ordered sequence of heading and paragraph [`Block`]s, and a cleaned,
//! numbered reference list. Block collection stops at the first stop-list
//! heading ("See also", "References", "Further reading", "External links"),
//! which keeps the reference apparatus out of the body prose. Reference
//! extraction runs independently over the whole content region, so it is
//! unaffected by where the body was truncated.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use serde::Serialize;

use crate::Result;
use crate::fetch::{FetchConfig, fetch_url};

/// Placeholder title when the page has no designated heading element.
pub const UNTITLED: &str = "Untitled";

/// Section headings that end body collection, compared case-insensitively.
const STOP_HEADINGS: [&str; 4] = ["see also", "references", "further reading", "external links"];

/// Containers whose text never belongs in body prose.
const STRIPPED_CONTAINERS: [&str; 3] = ["table", "figure", "nav"];

/// Heading depth within an article body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingLevel {
    H2,
    H3,
}

impl HeadingLevel {
    /// Numeric depth, matching the source markup's heading element.
    pub fn depth(self) -> u8 {
        match self {
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
        }
    }
}

/// One block of article body content, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Block {
    Heading { level: HeadingLevel, text: String },
    Paragraph { text: String },
}

/// A parsed article: title, ordered body blocks, and numbered references.
///
/// Produced once per fetch and consumed by exactly one renderer call.
#[derive(Debug, Clone, Serialize)]
pub struct Article {
    pub title: String,
    pub blocks: Vec<Block>,
    pub references: Vec<String>,
}

static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("#firstHeading").unwrap());
static CONTENT_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("#mw-content-text").unwrap());
static FLOW_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h2, h3, p").unwrap());
static CITE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse(r#"li[id^="cite_note-"]"#).unwrap());

/// Single lowercase backlink letters ("a b c ") in front of a citation.
static BACKLINK_LABELS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:[a-z] )+").unwrap());

/// Fetches an article page and parses it into an [`Article`].
///
/// Transport errors and non-2xx statuses propagate as errors; the caller at
/// the HTTP boundary reports them as the "failed to fetch content" sentinel.
pub async fn fetch_article(url: &str, config: &FetchConfig) -> Result<Article> {
    let html = fetch_url(url, config).await?;
    Ok(parse_article(&html))
}

/// Parses one article page into its structured document model.
///
/// Never fails: a page without a title heading gets the
/// [`UNTITLED`] placeholder, and a page without the main content region
/// yields the title with empty blocks and references.
pub fn parse_article(html: &str) -> Article {
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|el| visible_text(el))
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());

    let Some(content) = document.select(&CONTENT_SELECTOR).next() else {
        tracing::debug!("article page has no content region");
        return Article { title, blocks: Vec::new(), references: Vec::new() };
    };

    let blocks = collect_blocks(content);
    let references = collect_references(content);

    Article { title, blocks, references }
}

/// Walks h2/h3/p elements in document order, stopping at the first stop-list
/// heading. Elements inside tables, figures, and navigation boxes are
/// skipped so captions and navbox text never leak into the body.
fn collect_blocks(content: ElementRef<'_>) -> Vec<Block> {
    let mut blocks = Vec::new();

    for el in content.select(&FLOW_SELECTOR) {
        if inside_stripped_container(el, content) {
            continue;
        }

        let text = visible_text(el);
        if el.value().name() == "p" {
            if !text.is_empty() {
                blocks.push(Block::Paragraph { text });
            }
            continue;
        }

        if text.is_empty() {
            continue;
        }
        if is_stop_heading(&text) {
            break;
        }

        let level = if el.value().name() == "h2" { HeadingLevel::H2 } else { HeadingLevel::H3 };
        blocks.push(Block::Heading { level, text });
    }

    blocks
}

/// Extracts citation list items in document order as "[n] text" strings.
///
/// Operates over the unfiltered content region, independent of where body
/// collection stopped. Items whose text is empty after cleanup are dropped
/// without leaving a gap in the numbering.
fn collect_references(content: ElementRef<'_>) -> Vec<String> {
    let mut references = Vec::new();

    for li in content.select(&CITE_SELECTOR) {
        let cleaned = clean_reference_text(&visible_text(li));
        if !cleaned.is_empty() {
            references.push(format!("[{}] {}", references.len() + 1, cleaned));
        }
    }

    references
}

/// Strips Wikipedia backlink cruft from a citation's text.
///
/// Removes a leading caret marker, then a leading run of single lowercase
/// backlink letters ("^ a b c Some Publisher" becomes "Some Publisher").
/// The heuristic is deliberately approximate: it can leave partial labels
/// behind and can eat a legitimate single-letter leading word, and that
/// behavior is part of the contract.
pub fn clean_reference_text(raw: &str) -> String {
    let mut text = raw.trim();
    if let Some(stripped) = text.strip_prefix('^') {
        text = stripped.trim_start();
    }
    BACKLINK_LABELS.replace(text, "").trim().to_string()
}

fn is_stop_heading(heading_text: &str) -> bool {
    let lower = heading_text.trim().to_lowercase();
    STOP_HEADINGS.contains(&lower.as_str())
}

fn inside_stripped_container(el: ElementRef<'_>, root: ElementRef<'_>) -> bool {
    for ancestor in el.ancestors() {
        if ancestor.id() == root.id() {
            break;
        }
        if let Some(parent) = ElementRef::wrap(ancestor)
            && STRIPPED_CONTAINERS.contains(&parent.value().name())
        {
            return true;
        }
    }
    false
}

/// Visible text of an element: text nodes joined by single spaces with
/// whitespace collapsed, skipping script and style subtrees.
fn visible_text(el: ElementRef<'_>) -> String {
    let mut parts: Vec<String> = Vec::new();
    push_text_parts(el, &mut parts);
    parts.join(" ")
}

fn push_text_parts(el: ElementRef<'_>, parts: &mut Vec<String>) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => {
                let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
                if !collapsed.is_empty() {
                    parts.push(collapsed);
                }
            }
            Node::Element(element) => {
                if matches!(element.name(), "script" | "style") {
                    continue;
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    push_text_parts(child_el, parts);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap_page(content: &str) -> String {
        format!(
            r#"<html><body><h1 id="firstHeading">Test Article</h1><div id="mw-content-text">{content}</div></body></html>"#
        )
    }

    #[test]
    fn test_parse_title_and_blocks() {
        let html = wrap_page("<h2>Intro</h2><p>Hello world.</p><h3>Details</h3><p>More text.</p>");
        let article = parse_article(&html);

        assert_eq!(article.title, "Test Article");
        assert_eq!(
            article.blocks,
            vec![
                Block::Heading { level: HeadingLevel::H2, text: "Intro".to_string() },
                Block::Paragraph { text: "Hello world.".to_string() },
                Block::Heading { level: HeadingLevel::H3, text: "Details".to_string() },
                Block::Paragraph { text: "More text.".to_string() },
            ]
        );
    }

    #[test]
    fn test_missing_title_uses_placeholder() {
        let html = r#"<html><body><div id="mw-content-text"><p>Body.</p></div></body></html>"#;
        let article = parse_article(html);
        assert_eq!(article.title, UNTITLED);
    }

    #[test]
    fn test_missing_content_region_is_partial_success() {
        let html = r#"<html><body><h1 id="firstHeading">Lonely Title</h1></body></html>"#;
        let article = parse_article(html);

        assert_eq!(article.title, "Lonely Title");
        assert!(article.blocks.is_empty());
        assert!(article.references.is_empty());
    }

    #[test]
    fn test_body_stops_at_stop_list_heading() {
        let html = wrap_page(
            "<h2>Intro</h2><p>Kept.</p><h2>See ALSO</h2><p>Dropped.</p><h2>Later</h2><p>Also dropped.</p>",
        );
        let article = parse_article(&html);

        assert_eq!(
            article.blocks,
            vec![
                Block::Heading { level: HeadingLevel::H2, text: "Intro".to_string() },
                Block::Paragraph { text: "Kept.".to_string() },
            ]
        );
    }

    #[test]
    fn test_empty_paragraphs_dropped() {
        let html = wrap_page("<p>Real.</p><p>   </p><p></p>");
        let article = parse_article(&html);
        assert_eq!(article.blocks, vec![Block::Paragraph { text: "Real.".to_string() }]);
    }

    #[test]
    fn test_table_and_figure_content_excluded() {
        let html = wrap_page(
            "<p>Prose.</p><table><tr><td><p>Cell caption.</p></td></tr></table>\
             <figure><p>Figure caption.</p></figure><nav><p>Navbox.</p></nav>",
        );
        let article = parse_article(&html);
        assert_eq!(article.blocks, vec![Block::Paragraph { text: "Prose.".to_string() }]);
    }

    #[test]
    fn test_inline_markup_collapsed_to_spaces() {
        let html = wrap_page("<p>An <b>atom</b> is\n  a <a href=\"/wiki/Matter\">unit</a> of matter.</p>");
        let article = parse_article(&html);
        assert_eq!(article.blocks, vec![Block::Paragraph { text: "An atom is a unit of matter.".to_string() }]);
    }

    #[test]
    fn test_script_text_never_leaks() {
        let html = wrap_page("<p>Visible.<script>var hidden = 1;</script></p>");
        let article = parse_article(&html);
        assert_eq!(article.blocks, vec![Block::Paragraph { text: "Visible.".to_string() }]);
    }

    #[test]
    fn test_clean_reference_text_backlinks() {
        assert_eq!(clean_reference_text("^ a b c Example Publisher, 2020"), "Example Publisher, 2020");
        assert_eq!(clean_reference_text("^ Smith, John (1999)."), "Smith, John (1999).");
        assert_eq!(clean_reference_text("  ^  "), "");
    }

    #[test]
    fn test_references_numbered_without_gaps() {
        let html = wrap_page(
            r#"<ul>
                <li id="cite_note-1">^ a b Source A</li>
                <li id="cite_note-2">^</li>
                <li id="cite_note-3">^ Source B</li>
            </ul>"#,
        );
        let article = parse_article(&html);
        assert_eq!(article.references, vec!["[1] Source A".to_string(), "[2] Source B".to_string()]);
    }

    #[test]
    fn test_references_survive_body_truncation() {
        // The reference list sits after the stop heading but must still be found.
        let html = wrap_page(
            r#"<h2>Intro</h2><p>Hello</p><h2>References</h2>
               <ul><li id="cite_note-1">^ a b Source A</li></ul>"#,
        );
        let article = parse_article(&html);

        assert_eq!(
            article.blocks,
            vec![
                Block::Heading { level: HeadingLevel::H2, text: "Intro".to_string() },
                Block::Paragraph { text: "Hello".to_string() },
            ]
        );
        assert_eq!(article.references, vec!["[1] Source A".to_string()]);
    }

    #[test]
    fn test_non_citation_list_items_ignored() {
        let html = wrap_page(r#"<ul><li id="toc-entry">Navigation</li><li>Plain item</li></ul>"#);
        let article = parse_article(&html);
        assert!(article.references.is_empty());
    }

    #[test]
    fn test_heading_depth() {
        assert_eq!(HeadingLevel::H2.depth(), 2);
        assert_eq!(HeadingLevel::H3.depth(), 3);
    }
}
