use std::fs;

use crate::extractor::{
    PageDocument, UNWANTED_TAGS, clean_to_markdown, strip_inline_styles, strip_tags, to_markdown,
};

fn fixture() -> String {
    fs::read_to_string("src/extractor/tests/fixtures/facebook_event.html")
        .expect("Failed to read test fixture")
}

#[test]
fn test_clean_event_page_has_no_unwanted_fragments() {
    let markdown = clean_to_markdown(&fixture()).unwrap();

    for fragment in ["<script", "<style", "<img", "<header", "<footer", "<iframe", "style=\""] {
        assert!(!markdown.contains(fragment), "found {} in markdown", fragment);
    }
    assert!(!markdown.contains("window.__bootstrap"));
    assert!(!markdown.contains("requireLazy"));
    assert!(!markdown.contains("font-family"));
    assert!(!markdown.contains("Meta © 2024"));
}

#[test]
fn test_clean_event_page_keeps_event_content() {
    let markdown = clean_to_markdown(&fixture()).unwrap();

    assert!(markdown.contains("Soirée Jazz Manouche au Café des Arts"));
    assert!(markdown.contains("12 rue de la République, 69001 Lyon, France"));
    assert!(markdown.contains("**Les Doigts de Django**"));
    assert!(markdown.contains("Entrée libre"));
    assert!(markdown.contains("Petite restauration sur place"));
}

#[test]
fn test_clean_event_page_is_deterministic() {
    let html = fixture();
    assert_eq!(
        clean_to_markdown(&html).unwrap(),
        clean_to_markdown(&html).unwrap()
    );
}

#[test]
fn test_sanitized_document_converts_identically_twice() {
    let mut doc = PageDocument::parse(&fixture());
    strip_tags(&mut doc, UNWANTED_TAGS);
    strip_inline_styles(&mut doc);

    let first = to_markdown(&doc).unwrap();
    let second = to_markdown(&doc).unwrap();
    assert_eq!(first.as_bytes(), second.as_bytes());
}

#[test]
fn test_sanitized_document_has_no_styles_or_denylisted_tags() {
    let mut doc = PageDocument::parse(&fixture());
    strip_tags(&mut doc, UNWANTED_TAGS);
    strip_inline_styles(&mut doc);

    let html = doc.to_html();
    assert!(!html.contains("style="));
    for tag in UNWANTED_TAGS {
        assert_eq!(doc.count_elements(tag), 0);
    }

    // Cross-check with an independent parser.
    let parsed = scraper::Html::parse_document(&html);
    let selector =
        scraper::Selector::parse("[style], script, style, img, iframe, header, footer").unwrap();
    assert_eq!(parsed.select(&selector).count(), 0);
}

#[test]
fn test_empty_page() {
    let markdown = clean_to_markdown("").unwrap();
    assert!(markdown.is_empty());
}

#[test]
fn test_malformed_html() {
    let markdown =
        clean_to_markdown("<html><head><title>Broken</title><body><p>Unclosed tags<div>More content")
            .unwrap();

    assert!(markdown.contains("Unclosed tags"));
    assert!(markdown.contains("More content"));
    assert!(!markdown.contains("Broken"));
}

#[cfg(feature = "fuzz")]
mod fuzz {
    use super::*;
    use proptest::prelude::*;

    fn nested(depth: usize, tag: &str) -> String {
        let mut html = String::from("<p>kept</p>");
        for i in 0..depth {
            let inner = if i % 2 == 0 {
                format!("<{tag}>x</{tag}>")
            } else {
                String::new()
            };
            html = format!("<div style=\"d{i}\">{inner}{html}</div>");
        }
        html
    }

    proptest! {
        #[test]
        fn test_clean_never_panics(html in ".*") {
            let _ = clean_to_markdown(&html);
        }

        #[test]
        fn test_nested_denylisted_elements_all_removed(depth in 1usize..40, tag_index in 0usize..3) {
            let tag = ["script", "style", "iframe"][tag_index];
            let mut doc = PageDocument::parse(&format!("<body>{}</body>", nested(depth, tag)));
            let expected = (depth + 1) / 2;

            prop_assert_eq!(strip_tags(&mut doc, &[tag]), expected);
            prop_assert_eq!(doc.count_elements(tag), 0);
            prop_assert_eq!(doc.count_elements("div"), depth);
            prop_assert_eq!(strip_inline_styles(&mut doc), depth);
            prop_assert_eq!(strip_inline_styles(&mut doc), 0);
            prop_assert!(doc.to_html().contains("<p>kept</p>"));
        }
    }
}
