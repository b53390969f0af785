//! The library code for the `scriptorium` static site generator. A build is a
//! single batch which moves through five stages:
//!
//! 1. Loading the Markdown sources under the content directory
//!    ([`crate::document`])
//! 2. Parsing each document's front matter and rendering its body
//!    ([`crate::post`], with [`crate::markdown`] and [`crate::excerpt`])
//! 3. Indexing the posts by recency and by tag ([`crate::index`])
//! 4. Resolving the index into the site's pages: the home page, one page per
//!    post, the tag listing, and one page per tag ([`crate::page`])
//! 5. Rendering each page with the theme and its SEO metadata
//!    ([`crate::render`], [`crate::seo`]) and writing the results to disk
//!    ([`crate::write`])
//!
//! [`crate::build`] runs the stages in order, along with the Atom feed
//! ([`crate::feed`]) and the static assets. [`crate::query`] answers the named
//! queries the pages are built from directly from the index.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod document;
pub mod excerpt;
pub mod feed;
pub mod index;
pub mod markdown;
pub mod page;
pub mod post;
pub mod query;
pub mod render;
pub mod seo;
pub mod tag;
pub mod value;
pub mod write;
