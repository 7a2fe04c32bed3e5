//! Plain-text serialization of an article.

use crate::article::{Article, Block};

/// Renders an article as flat plain text.
///
/// Emits the title, an `=` underline of the same length, a blank line, then
/// the body blocks in order. Headings get a blank line before and a newline
/// after for visual separation. A non-empty reference list is appended under
/// a "References" header, entries separated by blank lines.
///
/// Deterministic: identical input always yields the identical string.
pub fn render_text(article: &Article) -> String {
    let mut parts: Vec<String> = Vec::new();
    for block in &article.blocks {
        match block {
            Block::Heading { text, .. } => parts.push(format!("\n\n{text}\n")),
            Block::Paragraph { text } => parts.push(text.clone()),
        }
    }
    let body = parts.join("\n").trim().to_string();

    let underline = "=".repeat(article.title.chars().count());
    let mut sections = vec![article.title.clone(), underline, String::new(), body];

    if !article.references.is_empty() {
        sections.push(String::new());
        sections.push("References".to_string());
        sections.push(String::new());
        sections.push(article.references.join("\n\n"));
    }

    sections.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::HeadingLevel;

    fn sample_article() -> Article {
        Article {
            title: "Atom".to_string(),
            blocks: vec![
                Block::Paragraph { text: "An atom is a unit of matter.".to_string() },
                Block::Heading { level: HeadingLevel::H2, text: "History".to_string() },
                Block::Paragraph { text: "Early ideas about atoms.".to_string() },
            ],
            references: vec!["[1] Source A".to_string(), "[2] Source B".to_string()],
        }
    }

    #[test]
    fn test_title_underline_matches_title_length() {
        let text = render_text(&sample_article());
        let mut lines = text.lines();
        let title = lines.next().unwrap();
        let underline = lines.next().unwrap();

        assert_eq!(title, "Atom");
        assert_eq!(underline.chars().count(), title.chars().count());
        assert!(underline.chars().all(|c| c == '='));
    }

    #[test]
    fn test_underline_counts_characters_not_bytes() {
        let article = Article { title: "Königsberg".to_string(), blocks: Vec::new(), references: Vec::new() };
        let text = render_text(&article);
        let mut lines = text.lines();
        let title = lines.next().unwrap();
        let underline = lines.next().unwrap();
        assert_eq!(underline.chars().count(), title.chars().count());
    }

    #[test]
    fn test_body_layout() {
        let text = render_text(&sample_article());
        assert!(text.contains("An atom is a unit of matter.\n\n\nHistory\n\nEarly ideas about atoms."));
    }

    #[test]
    fn test_references_section() {
        let text = render_text(&sample_article());
        assert!(text.ends_with("\nReferences\n\n[1] Source A\n\n[2] Source B"));
    }

    #[test]
    fn test_no_references_section_when_empty() {
        let mut article = sample_article();
        article.references.clear();
        let text = render_text(&article);
        assert!(!text.contains("References"));
    }

    #[test]
    fn test_deterministic() {
        let article = sample_article();
        assert_eq!(render_text(&article), render_text(&article));
    }
}
