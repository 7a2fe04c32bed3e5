//! Library API integration tests against Wikipedia-shaped fixtures.
use vitalis_core::*;

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(get_fixture_path(name)).unwrap()
}

#[test]
fn test_listing_scrape_yields_only_article_links() {
    let html = load_fixture("vital_listing.html");
    let links = scrape_article_links(&html);

    assert_eq!(
        links,
        vec![
            "/wiki/Atom",
            "/wiki/Molecule",
            "/wiki/Energy",
            "/wiki/Entropy",
            "/wiki/Classical_mechanics",
            "/wiki/Quantum_mechanics",
        ]
    );
    for link in &links {
        assert!(link.starts_with(ARTICLE_PATH_PREFIX));
        assert!(!link.contains(':'));
        assert!(!link.contains("Main_Page"));
    }
}

#[test]
fn test_parse_article_fixture() {
    let html = load_fixture("wikipedia_article.html");
    let article = parse_article(&html);

    assert_eq!(article.title, "Atom");

    let headings: Vec<(u8, &str)> = article
        .blocks
        .iter()
        .filter_map(|b| match b {
            Block::Heading { level, text } => Some((level.depth(), text.as_str())),
            Block::Paragraph { .. } => None,
        })
        .collect();
    assert_eq!(
        headings,
        vec![
            (2, "History of atomic theory"),
            (3, "Dalton's law of multiple proportions"),
            (3, "Discovery of the electron"),
            (2, "Structure"),
        ]
    );

    // Body stops before "See also"; nothing from the reference apparatus or
    // the trailing "Further reading" section leaks in.
    for block in &article.blocks {
        let text = match block {
            Block::Heading { text, .. } | Block::Paragraph { text } => text,
        };
        assert!(!text.contains("See also"));
        assert!(!text.contains("Periodic table"));
        assert!(!text.contains("never appear in the body"));
        assert!(!text.contains("Smallest recognized division"));
        assert!(!text.contains("Dalton's work"));
        assert!(!text.contains("Portals"));
    }

    // References: the empty citation is dropped without a numbering gap.
    assert_eq!(article.references.len(), 3);
    assert!(article.references[0].starts_with("[1] Pullman, Bernard (1998)."));
    assert!(article.references[1].starts_with("[2] Dalton, John (1808)."));
    assert!(article.references[2].starts_with("[3] Thomson, J. J. (1897)."));
}

#[test]
fn test_parse_scenario_with_out_of_body_references() {
    let html = r#"<html><body><h1 id="firstHeading">Sample</h1>
        <div id="mw-content-text">
            <h2>Intro</h2><p>Hello</p><h2>References</h2>
            <li id="cite_note-1">^ a b Source A</li>
        </div></body></html>"#;
    let article = parse_article(html);

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
fn test_text_rendering_round_trip() {
    let html = load_fixture("wikipedia_article.html");
    let article = parse_article(&html);
    let text = render_text(&article);

    let mut lines = text.lines();
    let title = lines.next().unwrap();
    let underline = lines.next().unwrap();
    assert_eq!(title, article.title);
    assert_eq!(underline.chars().count(), title.chars().count());

    assert!(text.contains("History of atomic theory"));
    assert!(text.contains("\nReferences\n"));
    assert!(text.contains("[1] Pullman"));
}

#[test]
fn test_pdf_rendering_from_fixture() {
    let html = load_fixture("wikipedia_article.html");
    let article = parse_article(&html);
    let bytes = render_pdf(&article).unwrap();

    assert!(bytes.starts_with(b"%PDF-"));
    let haystack = String::from_utf8_lossy(&bytes);
    assert!(haystack.contains("/Annots"));
    assert!(haystack.contains("Helvetica"));
}

#[test]
fn test_download_name_from_title() {
    let html = load_fixture("wikipedia_article.html");
    let article = parse_article(&html);
    assert_eq!(safe_filename(&article.title), "Atom");
    assert_eq!(safe_filename("C++: A History?"), "C___ A History_");
}
