// pressline-providers/src/feed.rs
// ============================================================================
// Module: Feed readers
// Description: HTTP (RSS/Atom) and deterministic-static `FeedReader`
//              implementations.
// Purpose: Supply the Scout loop with raw candidate entries (spec §4.7
//          "Scout", §6 "Feed Reader").
// Dependencies: pressline-core, reqwest, quick-xml, time
// ============================================================================

//! ## Overview
//! [`HttpFeedReader`] tolerates both RSS 2.0 (`<item>`/`<title>`/
//! `<description>`/`<link>`/`<pubDate>`) and Atom (`<entry>`/`<title>`/
//! `<summary>`/`<link href="...">`/`<updated>`) bodies with one pass over
//! the same event stream, since feed sources in the wild mix both formats
//! and the prototype's ingestion step did not distinguish them either.

use std::collections::HashMap;
use std::time::Duration as StdDuration;

use pressline_core::core::Timestamp;
use pressline_core::interfaces::FeedEntry;
use pressline_core::interfaces::FeedError;
use pressline_core::interfaces::FeedReader;
use quick_xml::Reader;
use quick_xml::events::Event;

#[derive(Default)]
struct PartialEntry {
    title: Option<String>,
    summary: Option<String>,
    link: Option<String>,
    published_at: Option<String>,
}

impl PartialEntry {
    fn finish(self) -> FeedEntry {
        FeedEntry {
            title: self.title,
            summary: self.summary,
            link: self.link,
            published_at: self.published_at.and_then(|raw| Timestamp::parse_loose(&raw)),
        }
    }
}

/// Parses an RSS or Atom document body into entries. Unrecognized elements
/// are ignored rather than rejected, matching a tolerant feed consumer.
///
/// # Errors
/// Returns [`FeedError::Parse`] if the document is not well-formed XML.
pub fn parse_feed(url: &str, body: &str) -> Result<Vec<FeedEntry>, FeedError> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut current: Option<PartialEntry> = None;
    let mut field_stack: Vec<String> = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(tag)) => {
                let name = local_name(tag.name().as_ref());
                if name == "item" || name == "entry" {
                    current = Some(PartialEntry::default());
                } else if current.is_some() {
                    if name == "link" {
                        if let Some(href) = tag.attributes().flatten().find(|a| a.key.as_ref() == b"href") {
                            if let Ok(value) = href.unescape_value() {
                                if let Some(entry) = current.as_mut() {
                                    entry.link = Some(value.into_owned());
                                }
                            }
                        }
                    }
                    field_stack.push(name);
                }
            }
            Ok(Event::Text(text)) => {
                if let (Some(entry), Some(field)) = (current.as_mut(), field_stack.last()) {
                    let Ok(value) = text.unescape() else { continue };
                    let value = value.into_owned();
                    match field.as_str() {
                        "title" => entry.title = Some(value),
                        "description" | "summary" => entry.summary = Some(value),
                        "link" if entry.link.is_none() => entry.link = Some(value),
                        "pubdate" | "updated" | "published" => entry.published_at = Some(value),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(tag)) => {
                let name = local_name(tag.name().as_ref());
                if name == "item" || name == "entry" {
                    if let Some(entry) = current.take() {
                        entries.push(entry.finish());
                    }
                } else {
                    field_stack.pop();
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(FeedError::Parse { url: url.to_owned(), reason: err.to_string() }),
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

fn local_name(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    text.rsplit(':').next().unwrap_or(&text).to_lowercase()
}

/// Fetches a feed over HTTP and parses it as RSS or Atom (spec §6 "Feed
/// Reader").
pub struct HttpFeedReader {
    client: reqwest::blocking::Client,
}

impl HttpFeedReader {
    /// Builds a reader with a bounded request timeout.
    ///
    /// # Errors
    /// Returns [`FeedError::Fetch`] if the underlying HTTP client cannot be
    /// constructed.
    pub fn new() -> Result<Self, FeedError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(StdDuration::from_secs(30))
            .build()
            .map_err(|err| FeedError::Fetch { url: String::new(), reason: err.to_string() })?;
        Ok(Self { client })
    }
}

impl FeedReader for HttpFeedReader {
    fn fetch(&self, feed_url: &str) -> Result<Vec<FeedEntry>, FeedError> {
        let response = self
            .client
            .get(feed_url)
            .send()
            .map_err(|err| FeedError::Fetch { url: feed_url.to_owned(), reason: err.to_string() })?
            .error_for_status()
            .map_err(|err| FeedError::Fetch { url: feed_url.to_owned(), reason: err.to_string() })?;
        let body = response.text().map_err(|err| FeedError::Fetch { url: feed_url.to_owned(), reason: err.to_string() })?;
        parse_feed(feed_url, &body)
    }
}

/// A deterministic, network-free feed reader for tests and the demo CLI
/// profile: returns a fixed set of entries per URL.
#[derive(Default)]
pub struct StaticFeedReader {
    entries_by_url: HashMap<String, Vec<FeedEntry>>,
}

impl StaticFeedReader {
    /// Builds an empty reader; use [`Self::with_feed`] to seed it.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `entries` to be returned for `url`.
    #[must_use]
    pub fn with_feed(mut self, url: impl Into<String>, entries: Vec<FeedEntry>) -> Self {
        self.entries_by_url.insert(url.into(), entries);
        self
    }
}

impl FeedReader for StaticFeedReader {
    fn fetch(&self, feed_url: &str) -> Result<Vec<FeedEntry>, FeedError> {
        Ok(self.entries_by_url.get(feed_url).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Test-only fixture assertions.")]
mod tests {
    use super::parse_feed;

    #[test]
    fn parses_rss_items() {
        let body = r#"<?xml version="1.0"?>
<rss><channel>
<item>
  <title>First story</title>
  <description>A summary longer than nothing at all.</description>
  <link>https://example.com/a</link>
  <pubDate>Tue, 28 Jul 2026 10:00:00 GMT</pubDate>
</item>
</channel></rss>"#;
        let entries = parse_feed("https://example.com/feed", body).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title.as_deref(), Some("First story"));
        assert_eq!(entries[0].link.as_deref(), Some("https://example.com/a"));
    }

    #[test]
    fn parses_atom_entries() {
        let body = r#"<?xml version="1.0"?>
<feed>
<entry>
  <title>Atom story</title>
  <summary>Atom summary text</summary>
  <link href="https://example.com/b"/>
  <updated>2026-07-28T10:00:00Z</updated>
</entry>
</feed>"#;
        let entries = parse_feed("https://example.com/feed", body).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title.as_deref(), Some("Atom story"));
        assert_eq!(entries[0].link.as_deref(), Some("https://example.com/b"));
    }

    #[test]
    fn malformed_xml_is_a_parse_error() {
        let err = parse_feed("https://example.com/feed", "<rss><channel><item>").unwrap_err();
        assert!(matches!(err, pressline_core::interfaces::FeedError::Parse { .. }));
    }
}
