use kuchiki::iter::NodeIterator;
use std::collections::HashSet;

use crate::extractor::reader::PageDocument;

/// Tags removed, with their whole subtree, before conversion.
pub const UNWANTED_TAGS: &[&str] = &["script", "head", "style", "header", "footer", "iframe", "img"];

/// Remove every element whose tag is in `tags`, descendants included.
///
/// Returns how many matching elements were in the tree. Running it again on
/// the result removes nothing.
pub fn strip_tags(doc: &mut PageDocument, tags: &[&str]) -> usize {
    let tags: HashSet<String> = tags.iter().map(|tag| tag.to_ascii_lowercase()).collect();

    let doomed: Vec<_> = doc
        .root()
        .descendants()
        .elements()
        .filter(|el| tags.contains(&(*el.name.local).to_ascii_lowercase()))
        .collect();

    for el in &doomed {
        el.as_node().detach();
    }
    doomed.len()
}

/// Remove the `style` attribute from every element. Returns how many
/// attributes were dropped.
pub fn strip_inline_styles(doc: &mut PageDocument) -> usize {
    doc.root()
        .descendants()
        .elements()
        .filter(|el| el.attributes.borrow_mut().remove("style").is_some())
        .count()
}
