//! The library code for the `quire` blog server. The architecture can be
//! broken down into two distinct phases:
//!
//! 1. Loading the site once at startup ([`crate::build`])
//! 2. Serving it read-only over HTTP ([`crate::server`])
//!
//! Of the two, the first phase is the more involved. It is itself composed of
//! three distinct steps:
//!
//! 1. Parsing documents from source files on disk ([`crate::parser`]), which
//!    also splits each body into sections and renders it to HTML
//!    ([`crate::markdown`])
//! 2. Ordering the documents and deriving the links between them
//!    ([`crate::corpus`])
//! 3. Rendering the Atom and JSON feeds ([`crate::feed`])
//!
//! The second step is where the relationships live: the documents are sorted
//! newest first, each one points at its chronological neighbors, and each one
//! lists the other documents that share a tag with it. Nothing changes after
//! the load; the server renders page views on request ([`crate::template`])
//! and hands out the pre-serialized feeds as they are.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod corpus;
pub mod document;
pub mod feed;
pub mod logger;
pub mod markdown;
pub mod parser;
pub mod server;
pub mod template;
pub mod url;
pub mod value;
