//! Defines the [`PostRecord`] type and the front-matter [`Parser`] which
//! derives records from [`Document`]s.
//!
//! The metadata block is YAML with the following (optional) keys:
//!
//! ```md
//! ---
//! title: Hello, world!
//! createdAt: 2024-04-16
//! path: /hello-world
//! tags: [greet, meta]
//! ---
//! # Hello
//!
//! World
//! ```
//!
//! Only `path` is required: a missing title falls back to the site title,
//! missing tags mean no tags, and a post without `createdAt` is kept but
//! left out of the listings which are ordered by date.

use std::fmt;

use chrono::{DateTime, NaiveDate};
use rayon::prelude::*;
use serde::Deserialize;
use tracing::debug;

use crate::{
    config::SiteConfig,
    document::{Document, DocumentId},
    excerpt,
    markdown::MarkupRenderer,
};

/// The parsed representation of a [`Document`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostRecord {
    pub id: DocumentId,
    pub title: String,

    /// The publish date. Undated posts still get a page of their own.
    pub created_at: Option<NaiveDate>,

    /// The post's path verbatim from the front matter. See
    /// [`PostRecord::route`] for the route it resolves to.
    pub path: String,

    /// The post's tags in the order they were written, without duplicates.
    pub tags: Vec<String>,

    /// A plain-text summary of the body.
    pub excerpt: String,

    pub body_html: String,
}

impl PostRecord {
    /// The route of the post's page. See [`post_route`].
    pub fn route(&self) -> String {
        post_route(&self.path)
    }

    /// Formats the publish date for display, e.g. `January 01, 2024`.
    pub fn display_date(&self) -> Option<String> {
        self.created_at
            .map(|date| date.format(DISPLAY_DATE_FORMAT).to_string())
    }
}

/// Normalizes a front-matter `path` into a site-absolute route: a leading
/// `/`, no empty segments, and no trailing `/`. `hello`, `/hello/`, and
/// `//hello` all become `/hello`.
pub fn post_route(path: &str) -> String {
    let segments: Vec<&str> = path
        .trim()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();
    format!("/{}", segments.join("/"))
}

/// The `strftime` format for publish dates shown on pages and in queries.
pub const DISPLAY_DATE_FORMAT: &str = "%B %d, %Y";

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Frontmatter {
    #[serde(default)]
    title: Option<String>,

    #[serde(default)]
    created_at: Option<String>,

    #[serde(default)]
    path: Option<String>,

    // Kept as raw YAML so that `[1, true]` is rejected rather than coerced to
    // strings.
    #[serde(default)]
    tags: Option<Vec<serde_yaml::Value>>,
}

/// Parses [`PostRecord`]s from [`Document`]s.
pub struct Parser<'a> {
    /// Provides the fallback title and the default excerpt length.
    site: &'a SiteConfig,

    /// Renders post bodies to HTML.
    markup: &'a dyn MarkupRenderer,
}

impl<'a> Parser<'a> {
    pub fn new(site: &'a SiteConfig, markup: &'a dyn MarkupRenderer) -> Parser<'a> {
        Parser { site, markup }
    }

    /// Parses a single document using the site's excerpt length.
    pub fn parse(&self, document: &Document) -> Result<PostRecord> {
        self.parse_with_excerpt_length(document, self.site.excerpt_length)
    }

    /// Parses a single document, truncating its excerpt to `excerpt_length`
    /// characters.
    pub fn parse_with_excerpt_length(
        &self,
        document: &Document,
        excerpt_length: usize,
    ) -> Result<PostRecord> {
        let id = &document.id;
        let malformed = |cause| Error::MalformedFrontMatter {
            id: id.clone(),
            cause,
        };

        let frontmatter = match &document.raw_metadata_block {
            None => Frontmatter::default(),
            Some(block) if !block.terminated => {
                return Err(malformed(Malformed::Unterminated))
            }
            Some(block) if block.text.trim().is_empty() => Frontmatter::default(),
            Some(block) => serde_yaml::from_str(&block.text)
                .map_err(|err| malformed(Malformed::Yaml(err)))?,
        };

        let created_at = match &frontmatter.created_at {
            None => None,
            Some(raw) => Some(
                parse_date(raw)
                    .ok_or_else(|| malformed(Malformed::InvalidDate(raw.clone())))?,
            ),
        };

        let mut tags: Vec<String> = Vec::new();
        for tag in frontmatter.tags.unwrap_or_default() {
            let tag = match tag {
                serde_yaml::Value::String(tag) => tag,
                other => return Err(malformed(Malformed::NonStringTag(describe(&other)))),
            };
            let tag = tag.trim();
            if tag.is_empty() {
                return Err(malformed(Malformed::EmptyTag));
            }
            if !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_owned());
            }
        }

        let path = match frontmatter.path {
            Some(path) if !path.trim().is_empty() => path.trim().to_owned(),
            _ => return Err(Error::MissingPath { id: id.clone() }),
        };

        let body_html = self.markup.to_html(&document.raw_body);
        Ok(PostRecord {
            id: id.clone(),
            title: frontmatter
                .title
                .unwrap_or_else(|| self.site.title.clone()),
            created_at,
            path,
            tags,
            excerpt: excerpt::excerpt(
                &self.markup.to_text(&document.raw_body),
                excerpt_length,
            ),
            body_html,
        })
    }

    /// Parses `documents` on the rayon pool. The records keep the order of
    /// `documents`; the first failure aborts the whole batch.
    pub fn parse_all(&self, documents: &[Document]) -> Result<Vec<PostRecord>> {
        let posts = documents
            .par_iter()
            .map(|document| self.parse(document))
            .collect::<Result<Vec<PostRecord>>>()?;
        debug!(count = posts.len(), "parsed posts");
        Ok(posts)
    }
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp, in which case the date is
/// taken in the timestamp's own offset.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.naive_local().date())
        })
}

/// Renders a non-string YAML value for an error message.
fn describe(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::Null => String::from("null"),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Sequence(_) => String::from("a list"),
        serde_yaml::Value::Mapping(_) => String::from("a mapping"),
    }
}

/// Represents the result of a [`PostRecord`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`PostRecord`].
#[derive(Debug)]
pub enum Error {
    /// Returned when the document has a metadata block which isn't valid.
    MalformedFrontMatter { id: DocumentId, cause: Malformed },

    /// Returned when the document doesn't specify a `path`. Posts can't be
    /// addressed without one.
    MissingPath { id: DocumentId },
}

/// The reason a metadata block was rejected.
#[derive(Debug)]
pub enum Malformed {
    /// The opening fence was never closed.
    Unterminated,

    /// The block isn't valid YAML or a field has the wrong type (e.g., `tags`
    /// isn't a list).
    Yaml(serde_yaml::Error),

    /// `createdAt` isn't a date.
    InvalidDate(String),

    /// A tag is blank.
    EmptyTag,

    /// A tag is a number, boolean, null, list, or mapping rather than a
    /// string.
    NonStringTag(String),
}

impl fmt::Display for Malformed {
    /// Displays a [`Malformed`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Malformed::Unterminated => write!(f, "missing closing `---`"),
            Malformed::Yaml(err) => err.fmt(f),
            Malformed::InvalidDate(raw) => write!(
                f,
                "invalid `createdAt` value `{}` (wanted YYYY-MM-DD or RFC 3339)",
                raw
            ),
            Malformed::EmptyTag => write!(f, "tags must not be blank"),
            Malformed::NonStringTag(value) => {
                write!(f, "tags must be strings, found `{}`", value)
            }
        }
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MalformedFrontMatter { id, cause } => {
                write!(f, "malformed front matter in `{}`: {}", id, cause)
            }
            Error::MissingPath { id } => {
                write!(f, "post `{}` has no `path` in its front matter", id)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MalformedFrontMatter {
                id: _,
                cause: Malformed::Yaml(err),
            } => Some(err),
            Error::MalformedFrontMatter { .. } => None,
            Error::MissingPath { .. } => None,
        }
    }
}
