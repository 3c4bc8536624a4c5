use kuchiki::NodeRef;
use kuchiki::iter::NodeIterator;
use kuchiki::traits::TendrilSink;

/// Mutable DOM of a fetched page.
///
/// Lives only between fetch and Markdown conversion: the cleaner edits it in
/// place, the converter serializes it.
pub struct PageDocument {
    root: NodeRef,
}

impl PageDocument {
    /// Parse HTML with html5ever error recovery; never fails.
    pub fn parse(html: &str) -> Self {
        Self {
            root: kuchiki::parse_html().one(html),
        }
    }

    pub(crate) fn root(&self) -> &NodeRef {
        &self.root
    }

    /// Serialize the current state of the tree back to HTML.
    pub fn to_html(&self) -> String {
        self.root.to_string()
    }

    /// Number of elements named `tag` currently in the tree.
    pub fn count_elements(&self, tag: &str) -> usize {
        self.root
            .descendants()
            .elements()
            .filter(|el| (*el.name.local).eq_ignore_ascii_case(tag))
            .count()
    }
}
