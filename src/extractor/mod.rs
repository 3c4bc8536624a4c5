pub mod cleaner;
pub mod language;
pub mod markdown;
pub mod model;
pub mod reader;

#[cfg(test)]
mod tests;

pub use cleaner::{UNWANTED_TAGS, strip_inline_styles, strip_tags};
pub use markdown::to_markdown;
pub use model::{EventDate, EventDetails};
pub use reader::PageDocument;

use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("markdown conversion failed: {0}")]
    Markdown(String),
}

/// Reduce rendered HTML to Markdown: parse, strip unwanted tags, strip inline
/// styles, convert.
pub fn clean_to_markdown(html: &str) -> Result<String, ExtractError> {
    // 1. Parse into a mutable DOM
    let mut doc = PageDocument::parse(html);

    // 2. Drop noise elements, then presentation attributes
    let removed_tags = strip_tags(&mut doc, UNWANTED_TAGS);
    let removed_styles = strip_inline_styles(&mut doc);
    debug!(removed_tags, removed_styles, "Sanitized page document");

    // 3. Convert what is left
    let markdown = to_markdown(&doc)?;
    debug!(
        html_bytes = html.len(),
        markdown_bytes = markdown.len(),
        "Converted page to markdown"
    );
    Ok(markdown)
}
