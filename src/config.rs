//! Loads the project configuration from a `quire.yaml` file.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The name of the project file.
pub const PROJECT_FILE: &str = "quire.yaml";

#[derive(Deserialize)]
struct Project {
    #[serde(rename = "ContentPath", default = "default_content_path")]
    content_path: PathBuf,

    #[serde(rename = "TemplatePath", default = "default_template_path")]
    template_path: PathBuf,

    #[serde(rename = "BaseURL")]
    base_url: String,

    #[serde(rename = "BasePath", default)]
    base_path: String,

    #[serde(rename = "Hostname", default = "default_hostname")]
    hostname: String,

    #[serde(rename = "HomeArticles", default = "default_home_articles")]
    home_articles: usize,

    #[serde(rename = "FeedArticles", default = "default_feed_articles")]
    feed_articles: usize,

    #[serde(rename = "FeedTitle", default = "default_feed_title")]
    feed_title: String,

    #[serde(rename = "Address", default = "default_address")]
    address: String,

    #[serde(rename = "LogLevel", default = "default_log_level")]
    log_level: String,
}

fn default_content_path() -> PathBuf {
    PathBuf::from("content")
}

fn default_template_path() -> PathBuf {
    PathBuf::from("templates")
}

fn default_hostname() -> String {
    "localhost".to_owned()
}

fn default_home_articles() -> usize {
    5
}

fn default_feed_articles() -> usize {
    10
}

fn default_feed_title() -> String {
    "Blog".to_owned()
}

fn default_address() -> String {
    "127.0.0.1:8080".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

/// The resolved site configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// The directory holding the documents and static files.
    pub content_directory: PathBuf,

    /// The directory holding the view templates.
    pub template_directory: PathBuf,

    /// The absolute URL the site is served under, without a trailing slash.
    pub base_url: String,

    /// The server path prefix, without a trailing slash (empty for the root).
    pub base_path: String,

    /// The host name used in feed identifiers.
    pub hostname: String,

    /// The number of documents on the home page.
    pub home_articles: usize,

    /// The number of documents in the feeds.
    pub feed_articles: usize,

    pub feed_title: String,

    /// The address the server listens on.
    pub address: String,

    /// The default log filter; `RUST_LOG` takes precedence.
    pub log_level: String,
}

impl Config {
    /// Finds `quire.yaml` in `dir` or the nearest ancestor directory and
    /// loads it.
    pub fn from_directory(dir: &Path) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path).context("Loading configuration")
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent),
                None => Err(anyhow!(
                    "Could not find `{}` in any parent directory",
                    PROJECT_FILE
                )),
            }
        }
    }

    /// Loads the project file at `path`. Relative directories resolve
    /// against the directory holding the project file.
    pub fn from_project_file(path: &Path) -> Result<Config> {
        let file = File::open(path)
            .with_context(|| format!("Opening project file `{}`", path.display()))?;
        let project: Project = serde_yaml::from_reader(file)
            .with_context(|| format!("Parsing project file `{}`", path.display()))?;
        let project_root = path.parent().ok_or_else(|| {
            anyhow!(
                "Can't get parent directory for provided project file path '{}'",
                path.display()
            )
        })?;
        if project.base_url.trim().is_empty() {
            return Err(anyhow!("`BaseURL` must not be empty"));
        }

        Ok(Config {
            content_directory: project_root.join(project.content_path),
            template_directory: project_root.join(project.template_path),
            base_url: project.base_url.trim_end_matches('/').to_owned(),
            base_path: project.base_path.trim_end_matches('/').to_owned(),
            hostname: project.hostname,
            home_articles: project.home_articles,
            feed_articles: project.feed_articles,
            feed_title: project.feed_title,
            address: project.address,
            log_level: project.log_level,
        })
    }
}
