//! Streaming XML normalizer.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE};
use quick_xml::events::{BytesStart, Event};
use quick_xml::encoding::Decoder;
use quick_xml::reader::Reader;
use tracing::{debug, instrument};

use rssrelay_core::error::ParseError;
use rssrelay_core::traits::FeedNormalizer;
use rssrelay_core::types::{FeedDialect, FeedItem};

use crate::entry::{Field, RawEntry};

/// A parsed feed: its dialect and its items in document order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedFeed {
    /// Dialect detected from the document root
    pub dialect: FeedDialect,
    /// Items in the order the document lists them
    pub items: Vec<FeedItem>,
}

/// Normalizer for RSS 0.9x/2.0, RSS 1.0 (RDF) and Atom documents.
#[derive(Clone, Copy, Debug, Default)]
pub struct XmlFeedNormalizer;

/// The entry being read and the element depth it opened at.
struct OpenEntry {
    raw: RawEntry,
    depth: usize,
}

impl XmlFeedNormalizer {
    /// Creates a normalizer.
    pub fn new() -> Self {
        Self
    }

    /// Parses a document, reporting the detected dialect along with the items.
    ///
    /// ASCII-compatible charsets are decoded as the XML declaration names
    /// them. UTF-16 documents are recognised by their first bytes and
    /// transcoded before parsing.
    #[instrument(skip_all, fields(bytes = raw.len()))]
    pub fn parse(&self, raw: &[u8]) -> Result<ParsedFeed, ParseError> {
        match utf16_encoding(raw) {
            Some(encoding) => {
                let (text, had_errors) = encoding.decode_with_bom_removal(raw);
                if had_errors {
                    debug!(encoding = encoding.name(), "Replaced undecodable bytes");
                }
                // The declaration still names UTF-16; `from_str` pins UTF-8.
                read_feed(Reader::from_str(&text))
            }
            None => read_feed(Reader::from_reader(raw)),
        }
    }
}

/// Runs the event loop over a prepared reader.
fn read_feed(mut reader: Reader<&[u8]>) -> Result<ParsedFeed, ParseError> {
    let mut buf = Vec::new();
    let mut dialect: Option<FeedDialect> = None;
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut entry: Option<OpenEntry> = None;
    let mut field: Option<Field> = None;
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                depth += 1;
                if depth == 1 {
                    dialect = Some(detect(&e)?);
                } else if let Some(d) = dialect {
                    if let Some(open) = entry.as_mut() {
                        if depth == open.depth + 1 {
                            field = Field::from_qname(e.name().as_ref());
                            text.clear();
                            if field == Some(Field::Link) && d == FeedDialect::Atom {
                                if let Some(href) = atom_href(&e, reader.decoder()) {
                                    open.raw.set(Field::Link, &href);
                                }
                                field = None;
                            }
                        }
                    } else if is_entry(&e, d) {
                        entry = Some(OpenEntry {
                            raw: RawEntry::default(),
                            depth,
                        });
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                if depth == 0 {
                    // `<rss/>` and friends: a feed with nothing in it.
                    dialect = Some(detect(&e)?);
                    break;
                }
                if let Some(d) = dialect {
                    match entry.as_mut() {
                        Some(open) => {
                            if d == FeedDialect::Atom
                                && depth == open.depth
                                && e.name().as_ref() == b"link"
                            {
                                if let Some(href) = atom_href(&e, reader.decoder()) {
                                    open.raw.set(Field::Link, &href);
                                }
                            }
                        }
                        None if is_entry(&e, d) => items.push(RawEntry::default().into_item(d)),
                        None => {}
                    }
                }
            }
            Ok(Event::End(_)) => {
                let closes_entry = entry.as_ref().map_or(false, |open| open.depth == depth);
                if closes_entry {
                    if let (Some(done), Some(d)) = (entry.take(), dialect) {
                        items.push(done.raw.into_item(d));
                    }
                } else if let Some(open) = entry.as_mut() {
                    if depth == open.depth + 1 {
                        if let Some(f) = field.take() {
                            open.raw.set(f, &text);
                        }
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Text(e)) => {
                if field.is_some() {
                    match e.unescape() {
                        Ok(value) => text.push_str(&value),
                        Err(_) => text.push_str(&decode_lossy(&reader, &e)),
                    }
                }
            }
            Ok(Event::CData(e)) => {
                if field.is_some() {
                    text.push_str(&decode_lossy(&reader, &e));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ParseError::MalformedFeed(format!(
                    "XML error at byte {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    let dialect = dialect
        .ok_or_else(|| ParseError::MalformedFeed("document has no root element".into()))?;
    if depth > 0 {
        return Err(ParseError::MalformedFeed(
            "document ended before its root element was closed".into(),
        ));
    }

    debug!(%dialect, items = items.len(), "Normalized feed");
    Ok(ParsedFeed { dialect, items })
}

impl FeedNormalizer for XmlFeedNormalizer {
    fn normalize(&self, raw: &[u8]) -> Result<Vec<FeedItem>, ParseError> {
        self.parse(raw).map(|feed| feed.items)
    }
}

/// Recognises UTF-16 from a byte order mark or a leading `<` code unit.
fn utf16_encoding(raw: &[u8]) -> Option<&'static Encoding> {
    match raw {
        [0xFF, 0xFE, ..] | [b'<', 0, ..] => Some(UTF_16LE),
        [0xFE, 0xFF, ..] | [0, b'<', ..] => Some(UTF_16BE),
        _ => None,
    }
}

/// Decodes raw text in the document's charset, replacing what cannot be decoded.
fn decode_lossy(reader: &Reader<&[u8]>, bytes: &[u8]) -> String {
    match reader.decoder().decode(bytes) {
        Ok(text) => text.into_owned(),
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn is_entry(element: &BytesStart<'_>, dialect: FeedDialect) -> bool {
    element.local_name().as_ref() == dialect.item_element().as_bytes()
}

/// Detects the dialect from the root element.
fn detect(root: &BytesStart<'_>) -> Result<FeedDialect, ParseError> {
    let local = root.local_name();
    let name = String::from_utf8_lossy(local.as_ref());
    FeedDialect::from_root(&name)
        .ok_or_else(|| ParseError::MalformedFeed(format!("unsupported root element <{}>", name)))
}

/// Returns the `href` of an Atom link if it points at the entry itself.
fn atom_href(link: &BytesStart<'_>, decoder: Decoder) -> Option<String> {
    let mut href = None;
    let mut rel = None;
    for attr in link.attributes().flatten() {
        match attr.key.as_ref() {
            b"href" => href = attr.decode_and_unescape_value(decoder).ok().map(Cow::into_owned),
            b"rel" => rel = attr.decode_and_unescape_value(decoder).ok().map(Cow::into_owned),
            _ => {}
        }
    }
    match rel.as_deref() {
        None | Some("alternate") => href,
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const RSS2: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:atom="http://www.w3.org/2005/Atom">
  <channel>
    <title>Channel title</title>
    <link>https://example.com/</link>
    <atom:link href="https://example.com/feed.xml" rel="self"/>
    <item>
      <title>First post</title>
      <link>https://example.com/1</link>
      <pubDate>Mon, 01 Jan 2024 10:00:00 GMT</pubDate>
      <dc:date>2023-12-31T00:00:00Z</dc:date>
    </item>
    <item>
      <title><![CDATA[Second & <b>bold</b>]]></title>
      <link>https://example.com/2?a=1&amp;b=2</link>
      <pubDate>Tue, 02 Jan 2024 10:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Third</title>
      <link>https://example.com/3</link>
    </item>
  </channel>
</rss>"#;

    const RDF: &str = r#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns="http://purl.org/rss/1.0/"
         xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel rdf:about="https://example.org/">
    <title>RDF channel</title>
    <link>https://example.org/</link>
  </channel>
  <item rdf:about="https://example.org/a">
    <title>Alpha</title>
    <link>https://example.org/a</link>
    <dc:date>2024-03-01T08:30:00+09:00</dc:date>
  </item>
  <item rdf:about="https://example.org/b">
    <title>Beta</title>
    <link>https://example.org/b</link>
    <pubDate>Fri, 01 Mar 2024 00:00:00 GMT</pubDate>
  </item>
</rdf:RDF>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom feed</title>
  <link href="https://example.net/"/>
  <updated>2024-04-02T00:00:00Z</updated>
  <entry>
    <title>Published entry</title>
    <link rel="self" href="https://example.net/api/1"/>
    <link rel="alternate" href="https://example.net/1"/>
    <published>2024-04-01T12:00:00Z</published>
    <updated>2024-04-02T12:00:00Z</updated>
    <author><name>Someone</name></author>
  </entry>
  <entry>
    <title type="html">Updated only</title>
    <link href="https://example.net/2"/>
    <updated>2024-04-03T00:00:00Z</updated>
  </entry>
</feed>"#;

    fn parse(xml: &str) -> ParsedFeed {
        XmlFeedNormalizer::new().parse(xml.as_bytes()).unwrap()
    }

    #[test]
    fn test_rss2_items() {
        let feed = parse(RSS2);
        assert_eq!(feed.dialect, FeedDialect::Rss);
        assert_eq!(feed.items.len(), 3);

        assert_eq!(feed.items[0].title, "First post");
        assert_eq!(feed.items[0].link, "https://example.com/1");
        assert_eq!(
            feed.items[0].published.as_deref(),
            Some("Mon, 01 Jan 2024 10:00:00 GMT")
        );

        assert_eq!(feed.items[1].title, "Second & <b>bold</b>");
        assert_eq!(feed.items[1].link, "https://example.com/2?a=1&b=2");

        assert_eq!(feed.items[2].published, None);
    }

    #[test]
    fn test_rdf_items_use_dublin_core_date() {
        let feed = parse(RDF);
        assert_eq!(feed.dialect, FeedDialect::Rdf);
        assert_eq!(feed.items.len(), 2);
        assert_eq!(feed.items[0].title, "Alpha");
        assert_eq!(
            feed.items[0].published.as_deref(),
            Some("2024-03-01T08:30:00+09:00")
        );
        // pubDate is not an RDF date field.
        assert_eq!(feed.items[1].published, None);
    }

    #[test]
    fn test_atom_entries() {
        let feed = parse(ATOM);
        assert_eq!(feed.dialect, FeedDialect::Atom);
        assert_eq!(feed.items.len(), 2);

        assert_eq!(feed.items[0].title, "Published entry");
        assert_eq!(feed.items[0].link, "https://example.net/1");
        assert_eq!(feed.items[0].published.as_deref(), Some("2024-04-01T12:00:00Z"));

        assert_eq!(feed.items[1].link, "https://example.net/2");
        assert_eq!(feed.items[1].published.as_deref(), Some("2024-04-03T00:00:00Z"));
    }

    #[test]
    fn test_channel_fields_are_not_items() {
        let feed = parse(RSS2);
        assert!(feed.items.iter().all(|i| i.title != "Channel title"));
    }

    #[test]
    fn test_preserves_document_order() {
        let titles: Vec<_> = parse(RSS2).items.into_iter().map(|i| i.title).collect();
        assert_eq!(titles, vec!["First post", "Second & <b>bold</b>", "Third"]);
    }

    #[test]
    fn test_nested_title_is_ignored() {
        let xml = r#"<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/"><channel>
            <item>
              <media:group><media:title>Nested</media:title></media:group>
              <source url="https://x"><title>Source title</title></source>
              <title>Real title</title>
              <link>https://x/1</link>
            </item>
        </channel></rss>"#;
        let feed = parse(xml);
        assert_eq!(feed.items[0].title, "Real title");
    }

    #[test]
    fn test_text_around_cdata_keeps_its_spacing() {
        let xml = r#"<rss version="2.0"><channel><item>
            <title>Breaking: <![CDATA[Big]]> news</title>
            <link>https://x/1</link>
        </item></channel></rss>"#;
        assert_eq!(parse(xml).items[0].title, "Breaking: Big news");
    }

    #[test]
    fn test_latin1_feed_is_decoded() {
        let raw: &[u8] = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\
            <rss version=\"2.0\"><channel><item>\
            <title>Caf\xE9 &amp; Cr\xE8me</title><link>https://x/1</link>\
            </item></channel></rss>";
        let feed = XmlFeedNormalizer::new().parse(raw).unwrap();
        assert_eq!(feed.items[0].title, "Caf\u{e9} & Cr\u{e8}me");
    }

    #[test]
    fn test_utf16_feed_is_transcoded() {
        let xml = "<?xml version=\"1.0\" encoding=\"UTF-16\"?>\
            <rss version=\"2.0\"><channel><item>\
            <title>\u{65e5}\u{672c} <![CDATA[news]]></title><link>https://x/1</link>\
            </item></channel></rss>";
        let mut le = vec![0xFF, 0xFE];
        le.extend(xml.encode_utf16().flat_map(u16::to_le_bytes));
        let be: Vec<u8> = xml.encode_utf16().flat_map(u16::to_be_bytes).collect();

        for raw in [le, be] {
            let feed = XmlFeedNormalizer::new().parse(&raw).unwrap();
            assert_eq!(feed.dialect, FeedDialect::Rss);
            assert_eq!(feed.items[0].title, "\u{65e5}\u{672c} news");
            assert_eq!(feed.items[0].link, "https://x/1");
        }
    }

    #[test_case(r#"<rss version="2.0"><channel><title>t</title></channel></rss>"#, FeedDialect::Rss ; "rss")]
    #[test_case(r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"><channel/></rdf:RDF>"#, FeedDialect::Rdf ; "rdf")]
    #[test_case(r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>t</title></feed>"#, FeedDialect::Atom ; "atom")]
    #[test_case(r#"<rss version="2.0"/>"#, FeedDialect::Rss ; "self closing root")]
    fn test_empty_feed_yields_no_items(xml: &str, dialect: FeedDialect) {
        let feed = parse(xml);
        assert_eq!(feed.dialect, dialect);
        assert!(feed.items.is_empty());
    }

    #[test_case("" ; "empty document")]
    #[test_case("not xml at all" ; "plain text")]
    #[test_case("<html><body>Not a feed</body></html>" ; "html page")]
    #[test_case("<rss><channel><item><title>x</title></channel></rss>" ; "mismatched tags")]
    #[test_case("<rss><channel><item><title>cut" ; "truncated")]
    fn test_malformed_documents(xml: &str) {
        let err = XmlFeedNormalizer::new().parse(xml.as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::MalformedFeed(_)));
    }

    #[test]
    fn test_normalize_trait_returns_items() {
        let normalizer: &dyn FeedNormalizer = &XmlFeedNormalizer::new();
        let items = normalizer.normalize(ATOM.as_bytes()).unwrap();
        assert_eq!(items.len(), 2);
    }
}
