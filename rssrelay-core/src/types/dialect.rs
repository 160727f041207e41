//! Syndication dialects.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The syndication format a feed document is written in.
///
/// Dialects differ in where an item keeps its publish date, so the
/// normalizer picks the date field per dialect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedDialect {
    /// RSS 0.9x / 2.0 (`<rss>` root), dated by `pubDate`
    Rss,
    /// RSS 1.0 (`<rdf:RDF>` root), dated by Dublin Core `dc:date`
    Rdf,
    /// Atom 1.0 (`<feed>` root), dated by `published`
    Atom,
}

impl FeedDialect {
    /// Detects the dialect from the local name of the document root.
    pub fn from_root(local_name: &str) -> Option<Self> {
        match local_name {
            "rss" => Some(FeedDialect::Rss),
            "RDF" => Some(FeedDialect::Rdf),
            "feed" => Some(FeedDialect::Atom),
            _ => None,
        }
    }

    /// Local name of the element that wraps one item.
    pub fn item_element(self) -> &'static str {
        match self {
            FeedDialect::Rss | FeedDialect::Rdf => "item",
            FeedDialect::Atom => "entry",
        }
    }

    /// Short lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            FeedDialect::Rss => "rss",
            FeedDialect::Rdf => "rdf",
            FeedDialect::Atom => "atom",
        }
    }
}

impl fmt::Display for FeedDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_root() {
        assert_eq!(FeedDialect::from_root("rss"), Some(FeedDialect::Rss));
        assert_eq!(FeedDialect::from_root("RDF"), Some(FeedDialect::Rdf));
        assert_eq!(FeedDialect::from_root("feed"), Some(FeedDialect::Atom));
        assert_eq!(FeedDialect::from_root("html"), None);
    }

    #[test]
    fn test_item_element() {
        assert_eq!(FeedDialect::Rdf.item_element(), "item");
        assert_eq!(FeedDialect::Atom.item_element(), "entry");
    }
}
