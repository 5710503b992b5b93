//! Defines the [`Parser`] and [`Error`] types: the logic for reading document
//! source files from the content root into [`Document`]s. Each document's
//! body is split into sections and rendered to HTML here, once, at load time.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveTime};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;
use walkdir::WalkDir;

use crate::document::{Author, Document, Time};
use crate::markdown;
use crate::url::Converter as LinkConverter;

/// The extension of document source files.
pub const MARKDOWN_EXTENSION: &str = "md";

/// Parses [`Document`] objects from source files.
pub struct Parser<'a> {
    /// `base_url` is the absolute URL documents are served under, without a
    /// trailing slash. A document's permalink is `{base_url}{path}`.
    base_url: &'a str,

    /// `base_path` is the server path prefix, without a trailing slash. A
    /// document's `path` field is `{base_path}{path}`.
    base_path: &'a str,

    /// `site_root` is `base_url` as a directory URL; relative links in
    /// document bodies are resolved against it.
    site_root: Url,
}

impl<'a> Parser<'a> {
    /// Constructs a new parser. See fields on [`Parser`] for argument
    /// descriptions.
    pub fn new(base_url: &'a str, base_path: &'a str) -> Result<Parser<'a>> {
        Ok(Parser {
            base_url,
            base_path,
            site_root: Url::parse(&format!("{}/", base_url))?,
        })
    }

    /// Parses a single [`Document`] from the source file at `relative_path`
    /// (relative to `content_root`). Errors are annotated with the path.
    pub fn parse_document(
        &self,
        content_root: &Path,
        relative_path: &Path,
    ) -> Result<Document> {
        match self._parse_document(content_root, relative_path) {
            Ok(d) => Ok(d),
            Err(e) => Err(Error::Annotated(
                format!("parsing document `{}`", relative_path.display()),
                Box::new(e),
            )),
        }
    }

    fn _parse_document(
        &self,
        content_root: &Path,
        relative_path: &Path,
    ) -> Result<Document> {
        let contents = std::fs::read_to_string(content_root.join(relative_path))?;
        let (frontmatter, body) = split_frontmatter(&contents)?;
        let frontmatter: Frontmatter = serde_yaml::from_str(frontmatter)?;

        let path = document_path(relative_path)?;
        let link_converter = LinkConverter::new(&self.site_root, &path)?;
        let sections = markdown::parse_sections(body, &link_converter)?;
        let mut html = String::new();
        markdown::render_sections(&mut html, &sections)?;
        let summary = markdown::summary(&sections);

        Ok(Document {
            title: frontmatter.title,
            time: parse_time(&frontmatter.date)?,
            tags: frontmatter.tags,
            authors: frontmatter
                .authors
                .iter()
                .map(|a| Author::from(a.as_str()))
                .collect(),
            sections,
            html,
            summary,
            path: format!("{}{}", self.base_path, path),
            permalink: format!("{}{}", self.base_url, path),
            newer: None,
            older: None,
            related: Vec::new(),
        })
    }

    /// Walks `content_root` recursively for document files (extension =
    /// `.md`) and returns them in discovery order, which is sorted by file
    /// name at every directory level. The first failure aborts the walk.
    /// Each document file must be structured as follows:
    ///
    /// 1. Initial frontmatter fence (`---`)
    /// 2. YAML frontmatter with fields `Title`, `Date`, and optionally `Tags`
    ///    and `Authors`
    /// 3. Terminal frontmatter fence (`---`)
    /// 4. Markdown body
    ///
    /// For example:
    ///
    /// ```md
    /// ---
    /// Title: Hello, world!
    /// Date: 2021-04-16
    /// Tags: [greet]
    /// Authors:
    ///   - |
    ///     Ann Smith
    ///     ann@example.org
    /// ---
    /// Hello
    ///
    /// ## World
    ///
    /// Goodbye.
    /// ```
    pub fn parse_documents(&self, content_root: &Path) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        for result in WalkDir::new(content_root).sort_by_file_name() {
            let entry = result?;
            if !entry.file_type().is_file() || !is_document(entry.path()) {
                continue;
            }
            let relative_path = entry
                .path()
                .strip_prefix(content_root)
                .map_err(|_| InvalidFileNameError(entry.path().to_owned()))?;
            let document = self.parse_document(content_root, relative_path)?;
            debug!(path = %document.path, time = %document.time, "parsed document");
            documents.push(document);
        }
        Ok(documents)
    }
}

fn is_document(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(MARKDOWN_EXTENSION)
}

/// Splits a source file into its YAML frontmatter and its body.
fn split_frontmatter(input: &str) -> Result<(&str, &str)> {
    const FENCE: &str = "---";
    if !input.starts_with(FENCE) {
        return Err(Error::FrontmatterMissingStartFence);
    }

    // The end fence is a line of its own; `---` inside a value doesn't count.
    let rest = &input[FENCE.len()..];
    let mut offset = 0;
    while let Some(i) = rest[offset..].find("\n---") {
        let start = offset + i + 1;
        let after = &rest[start + FENCE.len()..];
        if after.is_empty() || after.starts_with('\n') || after.starts_with("\r\n") {
            return Ok((&rest[..start], after));
        }
        offset = start;
    }
    Err(Error::FrontmatterMissingEndFence)
}

/// Converts a source file path relative to the content root into a document
/// path: extension dropped, `/`-separated, with a leading `/`
/// (`2021/hello.md` becomes `/2021/hello`).
fn document_path(relative_path: &Path) -> Result<String> {
    let mut path = String::new();
    for component in relative_path.with_extension("").components() {
        let part = component
            .as_os_str()
            .to_str()
            .ok_or_else(|| InvalidFileNameError(relative_path.to_owned()))?;
        path.push('/');
        path.push_str(part);
    }
    Ok(path)
}

/// Parses a frontmatter `Date`: either an RFC 3339 timestamp or a plain
/// `YYYY-MM-DD` date, which is taken as midnight UTC.
fn parse_time(date: &str) -> Result<Time> {
    let date = date.trim();
    if let Ok(time) = DateTime::parse_from_rfc3339(date) {
        return Ok(time);
    }
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")?;
    Ok(day.and_time(NaiveTime::MIN).and_utc().fixed_offset())
}

#[derive(Deserialize, Clone)]
struct Frontmatter {
    /// The title of the document.
    #[serde(rename = "Title")]
    pub title: String,

    /// The publish date of the document.
    #[serde(rename = "Date")]
    pub date: String,

    /// The tags associated with the document.
    #[serde(default, rename = "Tags")]
    pub tags: Vec<String>,

    /// The authors of the document, one multi-line entry each.
    #[serde(default, rename = "Authors")]
    pub authors: Vec<String>,
}

#[derive(Debug, Error)]
#[error("invalid file name: {0:?}")]
pub struct InvalidFileNameError(PathBuf);

/// Represents the result of a [`Document`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`Document`] object.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when a document source file is missing its starting
    /// frontmatter fence (`---`).
    #[error("Document must begin with `---`")]
    FrontmatterMissingStartFence,

    /// Returned when a document source file is missing its terminal
    /// frontmatter fence (`---` i.e., the starting fence was found but the
    /// ending one was missing).
    #[error("Missing closing `---`")]
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the frontmatter as YAML.
    #[error(transparent)]
    DeserializeYaml(#[from] serde_yaml::Error),

    /// Returned when the frontmatter `Date` is neither RFC 3339 nor
    /// `YYYY-MM-DD`.
    #[error("invalid date: {0}")]
    DateTimeParse(#[from] chrono::ParseError),

    /// Returned when there is a problem parsing URLs.
    #[error(transparent)]
    UrlParse(#[from] url::ParseError),

    /// Returned for other I/O errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Returned for WalkDir I/O errors.
    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),

    /// Returned when a source file name isn't valid UTF-8.
    #[error(transparent)]
    InvalidFileName(#[from] InvalidFileNameError),

    /// An error with an annotation.
    #[error("{0}: {1}")]
    Annotated(String, #[source] Box<Error>),
}

impl From<markdown::Error> for Error {
    fn from(err: markdown::Error) -> Error {
        match err {
            markdown::Error::Io(e) => Error::Io(e),
            markdown::Error::UrlParse(e) => Error::UrlParse(e),
        }
    }
}
