use regex::Regex;
use std::sync::LazyLock;

use crate::extractor::{ExtractError, reader::PageDocument};

static BLANK_RUN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*(?:\n[ \t]*){2,}").unwrap());

/// Serialize the document and convert it to Markdown.
pub fn to_markdown(doc: &PageDocument) -> Result<String, ExtractError> {
    let html = doc.to_html();
    let markdown = htmd::convert(&html).map_err(|e| ExtractError::Markdown(e.to_string()))?;
    Ok(collapse_blank_lines(&markdown))
}

/// Trim and squeeze runs of blank lines down to a single blank line.
pub fn collapse_blank_lines(markdown: &str) -> String {
    BLANK_RUN_REGEX
        .replace_all(markdown.trim(), "\n\n")
        .into_owned()
}
