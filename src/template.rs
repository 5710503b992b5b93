//! Loads the page templates and renders the page views. Each view is parsed
//! from `root.tmpl` followed by `<view>.tmpl`, so the view file supplies the
//! `{{define}}` blocks the root template invokes.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use gtmpl::{Context, Template};
use gtmpl_value::Value;
use thiserror::Error;

use crate::corpus::Corpus;
use crate::document::Document;

/// The template file every view is layered on.
pub const ROOT_TEMPLATE: &str = "root.tmpl";

/// A page view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    /// The front page: the newest documents.
    Home,

    /// Every document.
    Index,

    /// A single document.
    Article,

    /// A single document without the article chrome.
    Page,
}

impl View {
    pub fn name(self) -> &'static str {
        match self {
            View::Home => "home",
            View::Index => "index",
            View::Article => "article",
            View::Page => "page",
        }
    }

    fn file_name(self) -> String {
        format!("{}.tmpl", self.name())
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The payload every view is rendered with. See [`crate::value`] for the
/// fields templates see.
pub struct RootData<'a> {
    pub corpus: &'a Corpus,
    pub base_path: &'a str,

    /// The document of an article or page view.
    pub doc: Option<&'a Document>,

    /// The documents of a home or index view.
    pub data: Option<&'a [Document]>,
}

/// The parsed templates of all views.
pub struct Templates {
    home: Template,
    index: Template,
    article: Template,
    page: Template,
}

impl Templates {
    /// Reads and parses every view from `directory`. A missing or invalid
    /// template file is an error.
    pub fn load(directory: &Path) -> Result<Templates> {
        let root = directory.join(ROOT_TEMPLATE);
        let parse = |view: View| parse_template([&root, &directory.join(view.file_name())]);
        Ok(Templates {
            home: parse(View::Home)?,
            index: parse(View::Index)?,
            article: parse(View::Article)?,
            page: parse(View::Page)?,
        })
    }

    fn get(&self, view: View) -> &Template {
        match view {
            View::Home => &self.home,
            View::Index => &self.index,
            View::Article => &self.article,
            View::Page => &self.page,
        }
    }

    /// Renders `view` into `w`. On error, `w` keeps whatever was written
    /// before the failure.
    pub fn render(&self, view: View, data: &RootData, w: &mut Vec<u8>) -> Result<()> {
        let context = Context::from(Value::from(data)).map_err(|err| Error::Execute {
            view,
            err: err.to_string(),
        })?;
        self.get(view)
            .execute(w, &context)
            .map_err(|err| Error::Execute {
                view,
                err: err.to_string(),
            })
    }
}

// Loads the template file contents, concatenates them as they are, and parses
// the result into a template. Text outside `{{define}}` blocks in any file is
// part of the page output.
fn parse_template<P: AsRef<Path>>(template_files: impl IntoIterator<Item = P>) -> Result<Template> {
    let mut contents = String::new();
    let mut last = PathBuf::new();
    for template_file in template_files {
        let template_file = template_file.as_ref();
        File::open(template_file)
            .map_err(|err| Error::OpenTemplateFile {
                path: template_file.to_owned(),
                err,
            })?
            .read_to_string(&mut contents)
            .map_err(|err| Error::OpenTemplateFile {
                path: template_file.to_owned(),
                err,
            })?;
        last = template_file.to_owned();
    }

    let mut template = Template::default();
    template
        .parse(&contents)
        .map_err(|err| Error::ParseTemplate {
            path: last,
            err: err.to_string(),
        })?;
    Ok(template)
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for loading and rendering templates.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned for I/O problems while reading template files.
    #[error("Opening template file '{}': {err}", path.display())]
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned when a view doesn't parse. `path` is the view file.
    #[error("Parsing template '{}': {err}", path.display())]
    ParseTemplate { path: PathBuf, err: String },

    /// Returned when rendering a view fails.
    #[error("Rendering {view} view: {err}")]
    Execute { view: View, err: String },
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::DateTime;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

    const ROOT: &str = r#"<title>{{template "title" .}}</title>{{template "body" .}}"#;

    fn write_templates(dir: &Path, views: &[(View, &str)]) -> std::io::Result<()> {
        fs::write(dir.join(ROOT_TEMPLATE), ROOT)?;
        for (view, body) in views {
            fs::write(dir.join(view.file_name()), body)?;
        }
        Ok(())
    }

    fn standard(dir: &Path) -> std::io::Result<()> {
        write_templates(
            dir,
            &[
                (
                    View::Home,
                    r#"{{define "title"}}Home{{end}}{{define "body"}}{{range .Data}}[{{.Title}}]{{end}}{{end}}"#,
                ),
                (
                    View::Index,
                    r#"{{define "title"}}Index{{end}}{{define "body"}}{{range .Data}}<{{.Path}}>{{end}}{{end}}"#,
                ),
                (
                    View::Article,
                    r#"{{define "title"}}{{.Doc.Title}}{{end}}{{define "body"}}{{.Doc.HTML}}{{with .Doc.Older}}older:{{.Path}}{{end}}{{end}}"#,
                ),
                (
                    View::Page,
                    r#"{{define "title"}}{{.Doc.Title}}{{end}}{{define "body"}}{{.Doc.HTML}}{{end}}"#,
                ),
            ],
        )
    }

    fn doc(path: &str, time: &str) -> std::result::Result<Document, chrono::ParseError> {
        Ok(Document {
            title: format!("T{}", path.trim_start_matches('/')),
            time: DateTime::parse_from_rfc3339(time)?,
            tags: Vec::new(),
            authors: Vec::new(),
            sections: Vec::new(),
            html: "body".to_owned(),
            summary: String::new(),
            path: path.to_owned(),
            permalink: format!("https://example.org{}", path),
            newer: None,
            older: None,
            related: Vec::new(),
        })
    }

    fn corpus() -> std::result::Result<Corpus, chrono::ParseError> {
        Ok(Corpus::build(
            vec![
                doc("/1", "2021-01-01T00:00:00Z")?,
                doc("/2", "2020-01-01T00:00:00Z")?,
            ],
            "",
        ))
    }

    fn list<'a>(corpus: &'a Corpus, data: &'a [Document]) -> RootData<'a> {
        RootData {
            corpus,
            base_path: "",
            doc: None,
            data: Some(data),
        }
    }

    fn single<'a>(corpus: &'a Corpus, doc: &'a Document) -> RootData<'a> {
        RootData {
            corpus,
            base_path: "",
            doc: Some(doc),
            data: None,
        }
    }

    fn render(templates: &Templates, view: View, data: &RootData) -> std::result::Result<String, Box<dyn std::error::Error>> {
        let mut buf = Vec::new();
        templates.render(view, data, &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    #[test]
    fn test_render_views() -> TestResult {
        let dir = TempDir::new()?;
        standard(dir.path())?;
        let templates = Templates::load(dir.path())?;
        let corpus = corpus()?;

        assert_eq!(
            "<title>Home</title>[T1]",
            render(&templates, View::Home, &list(&corpus, corpus.home(1)))?
        );
        assert_eq!(
            "<title>Index</title></1></2>",
            render(&templates, View::Index, &list(&corpus, corpus.documents()))?
        );
        assert_eq!(
            "<title>T1</title>bodyolder:/2",
            render(&templates, View::Article, &single(&corpus, &corpus.documents()[0]))?
        );
        assert_eq!(
            "<title>T2</title>body",
            render(&templates, View::Page, &single(&corpus, &corpus.documents()[1]))?
        );
        Ok(())
    }

    #[test]
    fn test_missing_view_file() -> TestResult {
        let dir = TempDir::new()?;
        write_templates(dir.path(), &[(View::Home, r#"{{define "body"}}{{end}}"#)])?;
        match Templates::load(dir.path()) {
            Err(Error::OpenTemplateFile { path, .. }) => {
                assert_eq!(dir.path().join("index.tmpl"), path)
            }
            Err(err) => panic!("wanted OpenTemplateFile; found {}", err),
            Ok(_) => panic!("wanted OpenTemplateFile; found Ok"),
        }
        Ok(())
    }

    #[test]
    fn test_invalid_view_file() -> TestResult {
        let dir = TempDir::new()?;
        standard(dir.path())?;
        fs::write(dir.path().join("article.tmpl"), "{{if .Doc}}unterminated")?;
        match Templates::load(dir.path()) {
            Err(Error::ParseTemplate { path, .. }) => {
                assert_eq!(dir.path().join("article.tmpl"), path)
            }
            Err(err) => panic!("wanted ParseTemplate; found {}", err),
            Ok(_) => panic!("wanted ParseTemplate; found Ok"),
        }
        Ok(())
    }

    #[test]
    fn test_render_failure_names_view() -> TestResult {
        let dir = TempDir::new()?;
        standard(dir.path())?;
        fs::write(
            dir.path().join("home.tmpl"),
            r#"{{define "title"}}Home{{end}}{{define "body"}}{{template "missing" .}}{{end}}"#,
        )?;
        let templates = Templates::load(dir.path())?;
        let corpus = corpus()?;
        let data = RootData {
            corpus: &corpus,
            base_path: "",
            doc: None,
            data: Some(corpus.documents()),
        };
        let mut buf = Vec::new();
        match templates.render(View::Home, &data, &mut buf) {
            Err(Error::Execute { view, .. }) => assert_eq!(View::Home, view),
            other => panic!("wanted Execute error; found {:?}", other),
        }
        Ok(())
    }
}
