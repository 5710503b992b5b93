//! The HTTP surface: maps request paths onto the views, the cached feeds,
//! and the static-file fallback.
//!
//! | Path                                    | Response                      |
//! |-----------------------------------------|-------------------------------|
//! | `/`                                     | `home` view, newest documents |
//! | `/index`                                | `index` view, all documents   |
//! | `/feed.atom`, `/feeds/posts/default`    | Atom feed                     |
//! | `/.json[?jsonp=<callback>]`             | JSON feed (or JSONP)          |
//! | `/<document path>`                      | `article` view                |
//! | anything else                           | file from the content root    |
//!
//! All paths are relative to the configured base path. The request method is
//! not checked.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::{CONTENT_TYPE, LOCATION};
use axum::http::{HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use bytes::Bytes;
use lazy_static::lazy_static;
use regex::Regex;
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tracing::{debug, error, warn};

use crate::corpus::{lookup_key, Corpus};
use crate::document::Document;
use crate::feed::Feeds;
use crate::template::{RootData, Templates, View};

pub const HTML: &str = "text/html; charset=utf-8";
pub const ATOM: &str = "application/atom+xml; charset=utf-8";
pub const JSON: &str = "application/json; charset=utf-8";
pub const JAVASCRIPT: &str = "application/javascript; charset=utf-8";

lazy_static! {
    static ref JSONP_CALLBACK: Regex = Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_.]*$").unwrap();
}

/// Everything the server needs, built once by [`crate::build::build_site`]
/// and shared read-only between requests.
pub struct Site {
    pub corpus: Corpus,
    pub templates: Templates,
    pub feeds: Feeds,

    /// The server path prefix, without a trailing slash.
    pub base_path: String,

    /// The number of documents on the home page.
    pub home_articles: usize,

    /// Serves files from the content root.
    pub static_files: ServeDir,
}

/// Where a request is dispatched to.
#[derive(Debug)]
pub enum Route<'a> {
    Home,
    Index,
    Atom,

    /// The JSON feed, wrapped in a call to `callback` if one is given.
    Json { callback: Option<String> },

    Article(&'a Document),

    /// Not a known path; the static-file service decides.
    Static,
}

/// Picks the [`Route`] for a request path and query string. `path` is the
/// full request path; `base_path` is stripped from it if present.
pub fn route<'c>(corpus: &'c Corpus, base_path: &str, path: &str, query: Option<&str>) -> Route<'c> {
    match lookup_key(path, base_path) {
        "/" => Route::Home,
        "/index" => Route::Index,
        "/feed.atom" | "/feeds/posts/default" => Route::Atom,
        "/.json" => Route::Json {
            callback: query.and_then(jsonp_callback),
        },
        p => match corpus.lookup(p) {
            Some(document) => Route::Article(document),
            None => Route::Static,
        },
    }
}

/// Returns the first `jsonp` query parameter if it is a valid callback name.
fn jsonp_callback(query: &str) -> Option<String> {
    let (_, callback) = url::form_urlencoded::parse(query.as_bytes()).find(|(k, _)| k == "jsonp")?;
    if JSONP_CALLBACK.is_match(&callback) {
        Some(callback.into_owned())
    } else {
        debug!(%callback, "ignoring invalid jsonp callback");
        None
    }
}

impl Site {
    pub fn route(&self, path: &str, query: Option<&str>) -> Route<'_> {
        route(&self.corpus, &self.base_path, path, query)
    }

    /// Answers one request.
    pub async fn respond(&self, req: Request) -> Response {
        let route = self.route(req.uri().path(), req.uri().query());
        debug!(path = %req.uri().path(), ?route, "routing request");
        match route {
            Route::Home => self.page(View::Home, None, Some(self.corpus.home(self.home_articles))),
            Route::Index => self.page(View::Index, None, Some(self.corpus.documents())),
            Route::Article(document) => self.page(View::Article, Some(document), None),
            Route::Atom => ([(CONTENT_TYPE, ATOM)], self.feeds.atom.clone()).into_response(),
            Route::Json { callback: None } => {
                ([(CONTENT_TYPE, JSON)], self.feeds.json.clone()).into_response()
            }
            Route::Json {
                callback: Some(callback),
            } => ([(CONTENT_TYPE, JAVASCRIPT)], jsonp(&callback, &self.feeds.json)).into_response(),
            Route::Static => self.serve_static(req).await,
        }
    }

    /// Renders a page view. A rendering failure is logged and whatever had
    /// been rendered up to that point is still sent.
    pub fn page(&self, view: View, doc: Option<&Document>, data: Option<&[Document]>) -> Response {
        let root = RootData {
            corpus: &self.corpus,
            base_path: &self.base_path,
            doc,
            data,
        };
        let mut buf = Vec::new();
        if let Err(err) = self.templates.render(view, &root, &mut buf) {
            error!(%err, "rendering page");
        }
        ([(CONTENT_TYPE, HTML)], buf).into_response()
    }

    async fn serve_static(&self, req: Request) -> Response {
        let (mut parts, body) = req.into_parts();
        let path = match parts.uri.path().strip_prefix(self.base_path.as_str()) {
            Some("") => "/",
            Some(p) if p.starts_with('/') => p,
            _ => {
                debug!(uri = %parts.uri, "static request outside the base path");
                return StatusCode::NOT_FOUND.into_response();
            }
        };
        let stripped = match parts.uri.query() {
            Some(query) => format!("{}?{}", path, query),
            None => path.to_owned(),
        };
        parts.uri = match stripped.parse::<Uri>() {
            Ok(uri) => uri,
            Err(err) => {
                warn!(%err, uri = %parts.uri, "rewriting static request");
                return StatusCode::BAD_REQUEST.into_response();
            }
        };
        let req = Request::from_parts(parts, body);
        let mut res = match self.static_files.clone().oneshot(req).await {
            Ok(res) => res.into_response(),
            Err(never) => match never {},
        };

        // Directory redirects point at the stripped path.
        if res.status().is_redirection() {
            let location = res
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .filter(|v| v.starts_with('/'))
                .map(|v| format!("{}{}", self.base_path, v));
            if let Some(location) = location {
                match HeaderValue::from_str(&location) {
                    Ok(value) => {
                        res.headers_mut().insert(LOCATION, value);
                    }
                    Err(err) => warn!(%err, %location, "rewriting static redirect"),
                }
            }
        }
        res
    }
}

fn jsonp(callback: &str, json: &Bytes) -> Bytes {
    let mut out = Vec::with_capacity(callback.len() + json.len() + 2);
    out.extend_from_slice(callback.as_bytes());
    out.push(b'(');
    out.extend_from_slice(json);
    out.push(b')');
    Bytes::from(out)
}

/// Builds the router. Every request goes through [`Site::respond`].
pub fn router(site: Arc<Site>) -> Router {
    Router::new().fallback(handle).with_state(site)
}

async fn handle(State(site): State<Arc<Site>>, req: Request<Body>) -> Response {
    site.respond(req).await
}
