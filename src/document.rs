//! Defines the [`Document`] type, which represents a single article, and the
//! pieces a document body is made of ([`Section`], [`Element`]). Documents are
//! produced by [`crate::parser::Parser`] with their derived fields empty; the
//! derived fields (`newer`, `older`, `related`) are filled in exactly once by
//! [`crate::corpus::Corpus::build`].

use chrono::{DateTime, FixedOffset};

/// The publish time of a [`Document`].
pub type Time = DateTime<FixedOffset>;

/// The position of a [`Document`] in its [`crate::corpus::Corpus`]. Derived
/// links between documents are stored as positions rather than references;
/// resolve them with [`crate::corpus::Corpus::get`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocId(pub usize);

/// A parsed article.
#[derive(Clone, Debug)]
pub struct Document {
    /// The title of the document.
    pub title: String,

    /// The publish time of the document.
    pub time: Time,

    /// The document's tags in source order.
    pub tags: Vec<String>,

    /// The document's authors in source order.
    pub authors: Vec<Author>,

    /// The document body split into sections.
    pub sections: Vec<Section>,

    /// The rendered HTML body.
    pub html: String,

    /// The summary used by the feeds: the first plain paragraph of the first
    /// section, styled as inline HTML.
    pub summary: String,

    /// The path of the document relative to the server root, including the
    /// configured base path (e.g., `/blog/2021/hello`).
    pub path: String,

    /// The canonical absolute URL of the document.
    pub permalink: String,

    /// The next newer document, if any.
    pub newer: Option<DocId>,

    /// The next older document, if any.
    pub older: Option<DocId>,

    /// Other documents sharing at least one tag, newest first.
    pub related: Vec<DocId>,
}

impl Document {
    /// Returns true if the body has more than one section.
    pub fn sectioned(&self) -> bool {
        self.sections.len() > 1
    }

    /// Returns the display string for the document's authors. See [`authors`].
    pub fn byline(&self) -> String {
        authors(&self.authors)
    }
}

/// An author entry. The first line is the author's name; the remaining lines
/// are free-form details (an email address, a homepage, etc.).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Author {
    pub lines: Vec<String>,
}

impl Author {
    /// Returns the author's name, or the empty string if the entry is empty.
    pub fn name(&self) -> &str {
        self.lines.first().map(String::as_str).unwrap_or_default()
    }
}

impl From<&str> for Author {
    fn from(text: &str) -> Author {
        Author {
            lines: text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_owned)
                .collect(),
        }
    }
}

/// Joins author names for display: `", "` between all but the last two and
/// `" and "` before the last (`Ann, Bo and Cy`).
pub fn authors(authors: &[Author]) -> String {
    let mut out = String::new();
    let last = authors.len().saturating_sub(1);
    for (i, author) in authors.iter().enumerate() {
        if i > 0 {
            out.push_str(if i == last { " and " } else { ", " });
        }
        out.push_str(author.name());
    }
    out
}

/// A titled run of [`Element`]s. The section preceding the first heading has
/// no title.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Section {
    pub title: Option<String>,
    pub elements: Vec<Element>,
}

/// A top-level block of a [`Section`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Element {
    /// A paragraph of markdown text, or a preformatted block.
    Text(Text),

    /// A fenced code block.
    Code(Code),

    /// A paragraph holding nothing but an image.
    Image(Image),

    /// Any other block, already rendered to HTML.
    Html(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Text {
    /// The source lines. For regular paragraphs these are markdown; for
    /// preformatted blocks they are literal.
    pub lines: Vec<String>,

    /// The rendered paragraph, links converted. Empty for preformatted
    /// blocks.
    pub html: String,

    /// Whether the text is preformatted.
    pub pre: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Code {
    /// The language from the fence info string; empty if none was given.
    pub lang: String,
    pub source: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Image {
    pub url: String,
    pub alt: String,
    pub title: String,
}
