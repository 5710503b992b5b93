//! Support for rendering the Atom and JSON feeds from the corpus. Both are
//! serialized once at load time and served as immutable bytes.

use atom_syndication::{Content, Entry, Error as AtomError, Feed, Link, Person, Text};
use bytes::Bytes;
use chrono::{DateTime, ParseError};
use serde::Serialize;
use thiserror::Error;

use crate::document::{Document, Time};

/// The feed `updated` time of an empty corpus.
const ZERO_TIME: &str = "0001-01-01T00:00:00Z";

/// Bundled configuration for creating the feeds.
pub struct FeedConfig<'a> {
    pub title: &'a str,

    /// The host name used in the feed's tag URI.
    pub hostname: &'a str,

    /// The site's absolute base URL, without a trailing slash.
    pub base_url: &'a str,

    /// The maximum number of documents in either feed.
    pub max_items: usize,
}

impl FeedConfig<'_> {
    /// The feed identifier, a tag URI (RFC 4151) on the host name.
    pub fn id(&self) -> String {
        format!("tag:{0},2013:{0}", self.hostname)
    }
}

/// The serialized feed payloads.
#[derive(Clone, Debug)]
pub struct Feeds {
    pub atom: Bytes,
    pub json: Bytes,
}

impl Feeds {
    /// Serializes both feeds over the first `config.max_items` of
    /// `documents`, which must already be in corpus order.
    pub fn render(config: &FeedConfig, documents: &[Document]) -> Result<Feeds> {
        let documents = &documents[..config.max_items.min(documents.len())];
        Ok(Feeds {
            atom: Bytes::from(atom_feed(config, documents)?.write_to(Vec::new())?),
            json: Bytes::from(serde_json::to_vec(&json_feed(documents))?),
        })
    }
}

fn atom_feed(config: &FeedConfig, documents: &[Document]) -> Result<Feed> {
    let id = config.id();
    let updated = match documents.first() {
        Some(newest) => newest.time,
        None => DateTime::parse_from_rfc3339(ZERO_TIME)?,
    };
    Ok(Feed {
        entries: documents.iter().map(|d| atom_entry(&id, d)).collect(),
        title: Text::plain(config.title),
        updated,
        links: vec![Link {
            href: format!("{}/feed.atom", config.base_url),
            rel: "self".to_owned(),
            ..Link::default()
        }],
        id,
        ..Feed::default()
    })
}

fn atom_entry(feed_id: &str, document: &Document) -> Entry {
    let byline = document.byline();
    Entry {
        id: format!("{}{}", feed_id, document.path),
        title: Text::plain(document.title.as_str()),
        updated: document.time,
        published: Some(document.time),
        // Atom requires an author on every entry, so an anonymous document
        // still gets one with an empty name.
        authors: vec![Person {
            name: byline,
            ..Person::default()
        }],
        links: vec![Link {
            href: document.permalink.clone(),
            rel: "alternate".to_owned(),
            ..Link::default()
        }],
        summary: Some(Text::html(document.summary.as_str())),
        content: Some(Content {
            value: Some(document.html.clone()),
            content_type: Some("html".to_owned()),
            ..Content::default()
        }),
        ..Entry::default()
    }
}

/// One item of the JSON feed. Field names are part of the wire format.
#[derive(Serialize)]
struct JsonItem<'a> {
    #[serde(rename = "Title")]
    title: &'a str,

    #[serde(rename = "Link")]
    link: &'a str,

    #[serde(rename = "Time")]
    time: Time,

    #[serde(rename = "Summary")]
    summary: &'a str,

    #[serde(rename = "Content")]
    content: &'a str,

    #[serde(rename = "Author")]
    author: String,
}

fn json_feed(documents: &[Document]) -> Vec<JsonItem<'_>> {
    documents
        .iter()
        .map(|d| JsonItem {
            title: &d.title,
            link: &d.permalink,
            time: d.time,
            summary: &d.summary,
            content: &d.html,
            author: d.byline(),
        })
        .collect()
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a feed.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when the Atom feed can't be serialized.
    #[error("writing atom feed: {0}")]
    Atom(#[from] AtomError),

    /// Returned when the JSON feed can't be serialized.
    #[error("writing json feed: {0}")]
    Json(#[from] serde_json::Error),

    /// Returned when a feed timestamp can't be parsed.
    #[error(transparent)]
    DateTimeParse(#[from] ParseError),
}
