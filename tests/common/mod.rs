//! Test fixtures: a throwaway project directory with a `quire.yaml`, a set
//! of templates, and whatever documents and static files a test writes.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, LOCATION};
use axum::http::{HeaderName, Request, StatusCode};
use axum::Router;
use quire::build::build_site;
use quire::config::Config;
use quire::server;
use tempfile::TempDir;
use tower::ServiceExt;

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub const ROOT: &str = r#"{{template "body" .}}"#;
pub const HOME: &str = r#"{{define "body"}}home:{{range .Data}}[{{.Path}}]{{end}}{{end}}"#;
pub const INDEX: &str =
    r#"{{define "body"}}index:{{range .Data}}[{{.Path}}]{{end}} tags:{{range .Tags}}<{{.}}>{{end}}{{end}}"#;
pub const ARTICLE: &str = r#"{{define "body"}}<h1>{{.Doc.Title}}</h1>{{.Doc.HTML}}{{with .Doc.Newer}}newer:{{.Path}} {{end}}{{with .Doc.Older}}older:{{.Path}} {{end}}related:{{range .Doc.Related}}[{{.Path}}]{{end}} base:{{.BasePath}} by:{{.Doc.Byline}}{{end}}"#;
pub const PAGE: &str = r#"{{define "body"}}{{.Doc.HTML}}{{end}}"#;

/// Fluent builder for a project directory.
pub struct ProjectBuilder {
    settings: Vec<(String, String)>,
    documents: Vec<(String, String)>,
    files: Vec<(String, String)>,
    templates: Vec<(&'static str, String)>,
}

impl ProjectBuilder {
    pub fn new() -> Self {
        Self {
            settings: vec![
                ("BaseURL".to_owned(), "https://example.org".to_owned()),
                ("Hostname".to_owned(), "example.org".to_owned()),
            ],
            documents: Vec::new(),
            files: Vec::new(),
            templates: vec![
                ("root.tmpl", ROOT.to_owned()),
                ("home.tmpl", HOME.to_owned()),
                ("index.tmpl", INDEX.to_owned()),
                ("article.tmpl", ARTICLE.to_owned()),
                ("page.tmpl", PAGE.to_owned()),
            ],
        }
    }

    /// Sets a `quire.yaml` key.
    pub fn setting(mut self, key: &str, value: impl ToString) -> Self {
        self.settings.retain(|(k, _)| k != key);
        self.settings.push((key.to_owned(), value.to_string()));
        self
    }

    /// Adds a document at `path` (relative to the content root, without the
    /// `.md` extension).
    pub fn document(mut self, path: &str, date: &str, tags: &[&str], body: &str) -> Self {
        let source = format!(
            "---\nTitle: Title of {}\nDate: {}\nTags: [{}]\nAuthors: [Ann, Bo]\n---\n{}",
            path,
            date,
            tags.join(", "),
            body
        );
        self.documents.push((format!("{}.md", path), source));
        self
    }

    /// Adds a raw content file, e.g. a static asset or a malformed document.
    pub fn file(mut self, path: &str, contents: &str) -> Self {
        self.files.push((path.to_owned(), contents.to_owned()));
        self
    }

    pub fn template(mut self, name: &'static str, contents: &str) -> Self {
        self.templates.retain(|(n, _)| *n != name);
        self.templates.push((name, contents.to_owned()));
        self
    }

    pub fn without_template(mut self, name: &str) -> Self {
        self.templates.retain(|(n, _)| *n != name);
        self
    }

    pub fn build(self) -> TestResult<Project> {
        let dir = TempDir::new()?;
        let yaml: String = self
            .settings
            .iter()
            .map(|(k, v)| format!("{}: {}\n", k, v))
            .collect();
        fs::write(dir.path().join("quire.yaml"), yaml)?;

        let content = dir.path().join("content");
        fs::create_dir_all(&content)?;
        for (path, contents) in self.documents.iter().chain(&self.files) {
            write(&content, path, contents)?;
        }

        let templates = dir.path().join("templates");
        fs::create_dir_all(&templates)?;
        for (name, contents) in &self.templates {
            fs::write(templates.join(name), contents)?;
        }

        let config = Config::from_directory(dir.path())?;
        Ok(Project { dir, config })
    }
}

fn write(root: &Path, relative: &str, contents: &str) -> std::io::Result<()> {
    let path: PathBuf = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}

/// A project on disk. The directory is removed when this is dropped.
pub struct Project {
    pub dir: TempDir,
    pub config: Config,
}

impl Project {
    pub fn router(&self) -> TestResult<Router> {
        Ok(server::router(Arc::new(build_site(&self.config)?)))
    }
}

/// Five documents `/d1` (oldest) to `/d5` (newest). Odd ones are tagged
/// `odd`, and `/d1` and `/d2` are tagged `low`.
pub fn five_documents() -> ProjectBuilder {
    ProjectBuilder::new()
        .document("d1", "2021-01-01", &["odd", "low"], "First.\n")
        .document("d2", "2021-01-02", &["low"], "Second.\n")
        .document("d3", "2021-01-03", &["odd"], "Third.\n")
        .document("d4", "2021-01-04", &[], "Fourth.\n")
        .document("d5", "2021-01-05", &["odd"], "Fifth.\n")
}

pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub location: Option<String>,
    pub body: String,
}

pub async fn get(app: &Router, uri: &str) -> TestResult<TestResponse> {
    send(app, "GET", uri).await
}

pub async fn send(app: &Router, method: &str, uri: &str) -> TestResult<TestResponse> {
    let req = Request::builder().method(method).uri(uri).body(Body::empty())?;
    let res = app.clone().oneshot(req).await?;
    let status = res.status();
    let header = |name: HeaderName| {
        res.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    let content_type = header(CONTENT_TYPE);
    let location = header(LOCATION);
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await?;
    Ok(TestResponse {
        status,
        content_type,
        location,
        body: String::from_utf8(bytes.to_vec())?,
    })
}
