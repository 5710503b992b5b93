//! Defines the [`Corpus`], the ordered and cross-linked collection of all
//! documents. [`Corpus::build`] is the only place derived document fields are
//! computed; afterwards the corpus is read-only.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use crate::document::{DocId, Document};

/// The complete document collection plus its lookup structures.
#[derive(Debug, Default)]
pub struct Corpus {
    /// Documents sorted newest first.
    documents: Vec<Document>,

    /// Document positions keyed by path with the base path stripped.
    paths: HashMap<String, DocId>,

    /// Document positions per tag, in corpus order.
    tags: HashMap<String, Vec<DocId>>,

    /// The distinct tags, sorted.
    tag_names: Vec<String>,
}

impl Corpus {
    /// Orders `documents` newest first (ties keep their input order), indexes
    /// them by path and by tag, and fills in each document's `newer`, `older`
    /// and `related` fields. `base_path` is stripped from document paths to
    /// form the lookup keys used by [`Corpus::lookup`].
    pub fn build(documents: Vec<Document>, base_path: &str) -> Corpus {
        let mut documents: Vec<(usize, Document)> =
            documents.into_iter().enumerate().collect();
        documents.sort_by_key(|(index, document)| (Reverse(document.time), *index));
        let mut documents: Vec<Document> =
            documents.into_iter().map(|(_, document)| document).collect();

        // Later documents win on duplicate paths.
        let paths: HashMap<String, DocId> = documents
            .iter()
            .enumerate()
            .map(|(i, document)| (lookup_key(&document.path, base_path).to_owned(), DocId(i)))
            .collect();

        let mut tags: HashMap<String, Vec<DocId>> = HashMap::new();
        for (i, document) in documents.iter().enumerate() {
            let mut seen = HashSet::new();
            for tag in &document.tags {
                if seen.insert(tag.as_str()) {
                    tags.entry(tag.clone()).or_default().push(DocId(i));
                }
            }
        }

        let mut tag_names: Vec<String> = tags.keys().cloned().collect();
        tag_names.sort();

        let last = documents.len().saturating_sub(1);
        for i in 0..documents.len() {
            let related = related(&tags, &documents[i], DocId(i));
            let document = &mut documents[i];
            document.newer = if i > 0 { Some(DocId(i - 1)) } else { None };
            document.older = if i < last { Some(DocId(i + 1)) } else { None };
            document.related = related;
        }

        Corpus {
            documents,
            paths,
            tags,
            tag_names,
        }
    }

    /// All documents, newest first.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Resolves a [`DocId`] taken from this corpus.
    pub fn get(&self, id: DocId) -> Option<&Document> {
        self.documents.get(id.0)
    }

    /// Finds the document served at `path`, given relative to the base path
    /// (e.g. `/2021/hello`).
    pub fn lookup(&self, path: &str) -> Option<&Document> {
        self.paths.get(path).and_then(|&id| self.get(id))
    }

    /// The documents carrying `tag`, newest first.
    pub fn tagged(&self, tag: &str) -> impl Iterator<Item = &Document> {
        self.tags
            .get(tag)
            .into_iter()
            .flatten()
            .filter_map(|&id| self.get(id))
    }

    /// The distinct tags across all documents, sorted.
    pub fn tags(&self) -> &[String] {
        &self.tag_names
    }

    pub fn newer(&self, document: &Document) -> Option<&Document> {
        document.newer.and_then(|id| self.get(id))
    }

    pub fn older(&self, document: &Document) -> Option<&Document> {
        document.older.and_then(|id| self.get(id))
    }

    pub fn related<'a>(&'a self, document: &'a Document) -> impl Iterator<Item = &'a Document> {
        document.related.iter().filter_map(|&id| self.get(id))
    }

    /// The first `n` documents, or all of them if there are fewer.
    pub fn home(&self, n: usize) -> &[Document] {
        &self.documents[..n.min(self.documents.len())]
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Strips `base_path` from `path` if it is a prefix; otherwise `path` is
/// returned unchanged.
pub fn lookup_key<'p>(path: &'p str, base_path: &str) -> &'p str {
    path.strip_prefix(base_path).unwrap_or(path)
}

// Positions are already in descending time order, so sorting the positions
// sorts by time and keeps corpus order on ties.
fn related(tags: &HashMap<String, Vec<DocId>>, document: &Document, id: DocId) -> Vec<DocId> {
    let mut related: Vec<DocId> = document
        .tags
        .iter()
        .filter_map(|tag| tags.get(tag))
        .flatten()
        .copied()
        .filter(|&other| other != id)
        .collect();
    related.sort();
    related.dedup();
    related
}
