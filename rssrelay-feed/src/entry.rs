//! Per-item capture and the dialect date table.

use rssrelay_core::types::{FeedDialect, FeedItem};

/// Everything captured from one `<item>`/`<entry>` before the dialect's
/// rules are applied.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawEntry {
    /// `<title>` text
    pub title: Option<String>,
    /// `<link>` text (RSS/RDF) or `href` (Atom)
    pub link: Option<String>,
    /// RSS `<pubDate>`
    pub pub_date: Option<String>,
    /// Dublin Core `<dc:date>`
    pub dc_date: Option<String>,
    /// Atom `<published>`
    pub published: Option<String>,
    /// Atom `<updated>`
    pub updated: Option<String>,
}

/// Picks the publish date out of a captured entry.
pub type DateAccessor = fn(&RawEntry) -> Option<&str>;

fn rss_pub_date(entry: &RawEntry) -> Option<&str> {
    entry.pub_date.as_deref()
}

fn dublin_core_date(entry: &RawEntry) -> Option<&str> {
    entry.dc_date.as_deref()
}

fn atom_date(entry: &RawEntry) -> Option<&str> {
    entry.published.as_deref().or(entry.updated.as_deref())
}

/// Returns the date accessor for a dialect.
///
/// RDF feeds date items with `dc:date`; RSS with `pubDate`; Atom with
/// `published`, or `updated` when an entry was never separately published.
/// Only the dialect's own field is consulted: an RSS item carrying only
/// `dc:date` has no publish date.
pub fn date_accessor(dialect: FeedDialect) -> DateAccessor {
    match dialect {
        FeedDialect::Rss => rss_pub_date,
        FeedDialect::Rdf => dublin_core_date,
        FeedDialect::Atom => atom_date,
    }
}

/// Element of an entry whose text is captured.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Field {
    Title,
    Link,
    PubDate,
    DcDate,
    Published,
    Updated,
}

impl Field {
    /// Maps a qualified element name to the field it fills.
    pub(crate) fn from_qname(qname: &[u8]) -> Option<Self> {
        match qname {
            b"title" => Some(Field::Title),
            b"link" => Some(Field::Link),
            b"pubDate" => Some(Field::PubDate),
            b"dc:date" => Some(Field::DcDate),
            b"published" => Some(Field::Published),
            b"updated" => Some(Field::Updated),
            _ => None,
        }
    }
}

impl RawEntry {
    /// Stores a field value. The first non-empty occurrence wins.
    pub(crate) fn set(&mut self, field: Field, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::PubDate => &mut self.pub_date,
            Field::DcDate => &mut self.dc_date,
            Field::Published => &mut self.published,
            Field::Updated => &mut self.updated,
        };
        if slot.is_none() {
            *slot = Some(value.to_string());
        }
    }

    /// Applies the dialect's rules and produces the item.
    pub fn into_item(self, dialect: FeedDialect) -> FeedItem {
        let published = date_accessor(dialect)(&self).map(str::to_string);
        FeedItem {
            title: self.title.unwrap_or_default(),
            link: self.link.unwrap_or_default(),
            published,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_with_all_dates() -> RawEntry {
        RawEntry {
            title: Some("t".into()),
            link: Some("l".into()),
            pub_date: Some("pub".into()),
            dc_date: Some("dc".into()),
            published: Some("published".into()),
            updated: Some("updated".into()),
        }
    }

    #[test]
    fn test_each_dialect_reads_its_own_field() {
        let entry = entry_with_all_dates();
        assert_eq!(date_accessor(FeedDialect::Rss)(&entry), Some("pub"));
        assert_eq!(date_accessor(FeedDialect::Rdf)(&entry), Some("dc"));
        assert_eq!(date_accessor(FeedDialect::Atom)(&entry), Some("published"));
    }

    #[test]
    fn test_atom_falls_back_to_updated() {
        let entry = RawEntry {
            updated: Some("2024-02-02T00:00:00Z".into()),
            ..Default::default()
        };
        assert_eq!(date_accessor(FeedDialect::Atom)(&entry), Some("2024-02-02T00:00:00Z"));
    }

    #[test]
    fn test_wrong_dialect_degrades_to_none() {
        let entry = RawEntry {
            dc_date: Some("2024-01-01T00:00:00Z".into()),
            ..Default::default()
        };
        assert_eq!(entry.clone().into_item(FeedDialect::Rss).published, None);
        assert_eq!(
            entry.into_item(FeedDialect::Rdf).published.as_deref(),
            Some("2024-01-01T00:00:00Z")
        );
    }

    #[test]
    fn test_set_keeps_first_non_empty() {
        let mut entry = RawEntry::default();
        entry.set(Field::Title, "   ");
        entry.set(Field::Title, " first ");
        entry.set(Field::Title, "second");
        assert_eq!(entry.title.as_deref(), Some("first"));
    }

    #[test]
    fn test_missing_title_and_link_are_empty() {
        let item = RawEntry::default().into_item(FeedDialect::Rss);
        assert_eq!(item.title, "");
        assert_eq!(item.link, "");
        assert_eq!(item.published, None);
    }

    #[test]
    fn test_field_names() {
        assert_eq!(Field::from_qname(b"dc:date"), Some(Field::DcDate));
        assert_eq!(Field::from_qname(b"pubDate"), Some(Field::PubDate));
        assert_eq!(Field::from_qname(b"atom:link"), None);
        assert_eq!(Field::from_qname(b"media:title"), None);
    }
}
