//! Exports the [`build_site`] function which stitches together the load
//! phase: parsing the templates ([`crate::template`]), parsing the documents
//! ([`crate::parser`]), deriving their relationships ([`crate::corpus`]) and
//! rendering the feeds ([`crate::feed`]). The result is the immutable
//! [`Site`] the server shares between requests.

use thiserror::Error;
use tower_http::services::ServeDir;
use tracing::info;

use crate::config::Config;
use crate::corpus::Corpus;
use crate::feed::{Error as FeedError, FeedConfig, Feeds};
use crate::parser::{Error as ParseError, Parser};
use crate::server::Site;
use crate::template::{Error as TemplateError, Templates};

/// Builds the site from a [`Config`] object. Any failure aborts the whole
/// load; there is no partially built site.
pub fn build_site(config: &Config) -> Result<Site> {
    let templates = Templates::load(&config.template_directory)?;

    let parser = Parser::new(&config.base_url, &config.base_path)?;
    let documents = parser.parse_documents(&config.content_directory)?;
    let corpus = Corpus::build(documents, &config.base_path);

    let feeds = Feeds::render(
        &FeedConfig {
            title: &config.feed_title,
            hostname: &config.hostname,
            base_url: &config.base_url,
            max_items: config.feed_articles,
        },
        corpus.documents(),
    )?;

    info!(
        documents = corpus.len(),
        tags = corpus.tags().len(),
        feed_items = config.feed_articles.min(corpus.len()),
        content = %config.content_directory.display(),
        "loaded site"
    );

    Ok(Site {
        corpus,
        templates,
        feeds,
        base_path: config.base_path.clone(),
        home_articles: config.home_articles,
        static_files: ServeDir::new(&config.content_directory),
    })
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during parsing
/// documents, loading templates, or rendering the feeds.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned for errors during parsing.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Returned for errors loading the templates.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Returned for errors rendering the feeds.
    #[error(transparent)]
    Feed(#[from] FeedError),
}
