//! Conversions from corpus types into [`Value`]s for template rendering.
//! Field names are `PascalCase` so templates read `{{.Doc.Title}}`.

use std::collections::HashMap;

use gtmpl_value::Value;

use crate::corpus::Corpus;
use crate::document::{Document, Time};
use crate::template::RootData;

/// The display format of the `Date` fields (`2 January 2006`).
const DATE_FORMAT: &str = "%-d %B %Y";

impl From<&RootData<'_>> for Value {
    fn from(root: &RootData<'_>) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert(
            "Doc".to_owned(),
            match root.doc {
                Some(doc) => document(root.corpus, doc),
                None => Value::Nil,
            },
        );
        m.insert("BasePath".to_owned(), string(root.base_path));
        m.insert(
            "Data".to_owned(),
            match root.data {
                Some(docs) => Value::Array(docs.iter().map(|d| document(root.corpus, d)).collect()),
                None => Value::Nil,
            },
        );
        m.insert("Tags".to_owned(), strings(root.corpus.tags()));
        Value::Object(m)
    }
}

/// The full template value of a document, with its derived links resolved
/// through `corpus`.
pub fn document(corpus: &Corpus, doc: &Document) -> Value {
    let mut m = link_fields(doc);
    m.insert("Tags".to_owned(), strings(&doc.tags));
    m.insert(
        "Authors".to_owned(),
        Value::Array(doc.authors.iter().map(|a| string(a.name())).collect()),
    );
    m.insert("Byline".to_owned(), Value::String(doc.byline()));
    m.insert("Summary".to_owned(), string(&doc.summary));
    m.insert("HTML".to_owned(), string(&doc.html));
    m.insert("Sectioned".to_owned(), Value::Bool(doc.sectioned()));
    m.insert("Newer".to_owned(), optional_link(corpus.newer(doc)));
    m.insert("Older".to_owned(), optional_link(corpus.older(doc)));
    m.insert(
        "Related".to_owned(),
        Value::Array(corpus.related(doc).map(link).collect()),
    );
    Value::Object(m)
}

/// The short template value used for links between documents.
pub fn link(doc: &Document) -> Value {
    Value::Object(link_fields(doc))
}

fn optional_link(doc: Option<&Document>) -> Value {
    match doc {
        Some(doc) => link(doc),
        None => Value::Nil,
    }
}

fn link_fields(doc: &Document) -> HashMap<String, Value> {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("Title".to_owned(), string(&doc.title));
    m.insert("Path".to_owned(), string(&doc.path));
    m.insert("Permalink".to_owned(), string(&doc.permalink));
    m.insert("Time".to_owned(), Value::String(doc.time.to_rfc3339()));
    m.insert("Date".to_owned(), Value::String(date(&doc.time)));
    m
}

fn date(time: &Time) -> String {
    time.format(DATE_FORMAT).to_string()
}

fn string(s: &str) -> Value {
    Value::String(s.to_owned())
}

fn strings(items: &[String]) -> Value {
    Value::Array(items.iter().map(|s| string(s)).collect())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::document::Author;
    use chrono::DateTime;

    fn doc(path: &str, time: &str, tags: &[&str]) -> Result<Document, chrono::ParseError> {
        Ok(Document {
            title: format!("Title of {}", path),
            time: DateTime::parse_from_rfc3339(time)?,
            tags: tags.iter().map(|&t| t.to_owned()).collect(),
            authors: vec![Author::from("Ann\nann@example.org"), Author::from("Bo")],
            sections: Vec::new(),
            html: "<p>Body</p>\n".to_owned(),
            summary: "Body\n".to_owned(),
            path: path.to_owned(),
            permalink: format!("https://example.org{}", path),
            newer: None,
            older: None,
            related: Vec::new(),
        })
    }

    fn field<'v>(value: &'v Value, key: &str) -> Option<&'v Value> {
        match value {
            Value::Object(m) => m.get(key),
            _ => None,
        }
    }

    fn text<'v>(value: &'v Value, key: &str) -> Option<&'v str> {
        match field(value, key) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    fn texts(value: Option<&Value>, key: &str) -> Vec<String> {
        match value {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    other => text(other, key).map(str::to_owned),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn corpus() -> Result<Corpus, chrono::ParseError> {
        Ok(Corpus::build(
            vec![
                doc("/a", "2021-04-16T09:30:00Z", &["x", "y"])?,
                doc("/b", "2021-03-01T00:00:00Z", &["y"])?,
                doc("/c", "2021-02-01T00:00:00Z", &[])?,
            ],
            "",
        ))
    }

    #[test]
    fn test_document_value() -> Result<(), chrono::ParseError> {
        let corpus = corpus()?;
        let value = document(&corpus, &corpus.documents()[0]);

        assert_eq!(Some("Title of /a"), text(&value, "Title"));
        assert_eq!(Some("/a"), text(&value, "Path"));
        assert_eq!(Some("https://example.org/a"), text(&value, "Permalink"));
        assert_eq!(Some("2021-04-16T09:30:00+00:00"), text(&value, "Time"));
        assert_eq!(Some("16 April 2021"), text(&value, "Date"));
        assert_eq!(Some("Ann and Bo"), text(&value, "Byline"));
        assert_eq!(Some("<p>Body</p>\n"), text(&value, "HTML"));
        assert_eq!(vec!["x", "y"], texts(field(&value, "Tags"), ""));
        assert_eq!(vec!["Ann", "Bo"], texts(field(&value, "Authors"), ""));
        assert!(matches!(field(&value, "Sectioned"), Some(Value::Bool(false))));
        assert!(matches!(field(&value, "Newer"), Some(Value::Nil)));
        assert_eq!(
            Some("/b"),
            field(&value, "Older").and_then(|older| text(older, "Path"))
        );
        assert_eq!(vec!["/b"], texts(field(&value, "Related"), "Path"));
        Ok(())
    }

    #[test]
    fn test_link_value_has_no_body() -> Result<(), chrono::ParseError> {
        let value = link(&doc("/a", "2021-04-16T00:00:00Z", &[])?);
        assert_eq!(Some("Title of /a"), text(&value, "Title"));
        assert!(field(&value, "HTML").is_none());
        assert!(field(&value, "Related").is_none());
        Ok(())
    }

    #[test]
    fn test_root_value() -> Result<(), chrono::ParseError> {
        let corpus = corpus()?;
        let root = RootData {
            corpus: &corpus,
            base_path: "/blog",
            doc: None,
            data: Some(corpus.home(2)),
        };
        let value = Value::from(&root);

        assert!(matches!(field(&value, "Doc"), Some(Value::Nil)));
        assert_eq!(Some("/blog"), text(&value, "BasePath"));
        assert_eq!(vec!["/a", "/b"], texts(field(&value, "Data"), "Path"));
        assert_eq!(vec!["x", "y"], texts(field(&value, "Tags"), ""));
        Ok(())
    }
}
