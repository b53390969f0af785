//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: loading the documents
//! ([`crate::document`]), parsing them into posts ([`crate::post`]), indexing
//! them ([`crate::index`]), resolving and rendering the pages
//! ([`crate::page`], [`crate::render`]), writing the pages and the Atom feed
//! ([`crate::write`], [`crate::feed`]), and copying the static assets.

use std::fmt;
use std::path::PathBuf;

use tracing::info;

use crate::config::Config;
use crate::document::{list_documents, Error as DocumentError};
use crate::feed::{write_feed, Error as FeedError, FEED_FILE};
use crate::index::{ContentIndex, Error as IndexError};
use crate::markdown::Markdown;
use crate::page::resolve;
use crate::post::{Error as ParseError, Parser as PostParser};
use crate::render::{Error as RenderError, Renderer, Theme};
use crate::write::{check_layout, Error as WriteError, Writer};

/// Loads, parses, and indexes every document under the project's content
/// directory. This is everything [`build_site`] does before rendering, and it
/// is what `scriptorium query` answers from.
pub fn load_index(config: &Config) -> Result<ContentIndex> {
    let documents = list_documents(&config.content_directory)?;
    let markdown = Markdown::default();
    let posts = PostParser::new(&config.site, &markdown).parse_all(&documents)?;
    Ok(ContentIndex::build(posts)?)
}

/// Builds the site from a [`Config`] object. Every page is rendered and every
/// output path is checked before anything is written, so a failing build
/// leaves the previous output in place.
pub fn build_site(config: &Config) -> Result<()> {
    // The output directory is deleted wholesale, so it must not contain the
    // sources.
    if config.content_directory.starts_with(&config.output_directory) {
        return Err(Error::UnsafeOutput(config.output_directory.clone()));
    }

    let index = load_index(config)?;
    let pages = resolve(&index);

    let renderer = Renderer::new(&config.site, &Theme::load(&config.theme_directory)?)?;
    let documents = renderer.render_all(&index, &pages)?;
    check_layout(&documents, &[FEED_FILE], &config.static_directory)?;

    let writer = Writer::new(&config.output_directory);
    writer.clean()?;
    writer.write_documents(&documents)?;
    write_feed(&config.site, &index, writer.create_file(FEED_FILE)?)?;
    writer.copy_static(&config.static_directory)?;

    info!(
        posts = index.posts().len(),
        tags = index.tag_groups().len(),
        pages = documents.len(),
        output = %config.output_directory.display(),
        "built site"
    );
    Ok(())
}

/// The result of a fallible build operation.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Each pipeline stage contributes its own
/// error type.
#[derive(Debug)]
pub enum Error {
    /// Returned when the output directory would contain the content directory.
    UnsafeOutput(PathBuf),

    /// Returned for errors loading source documents.
    Document(DocumentError),

    /// Returned for errors parsing documents into posts.
    Parse(ParseError),

    /// Returned when the posts can't be indexed.
    Index(IndexError),

    /// Returned for errors loading the theme or rendering pages.
    Render(RenderError),

    /// Returned for errors writing output files.
    Write(WriteError),

    /// Returned for errors writing the feed.
    Feed(FeedError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnsafeOutput(path) => write!(
                f,
                "refusing to use `{}` as the output directory: it contains the content directory",
                path.display()
            ),
            Error::Document(err) => err.fmt(f),
            Error::Parse(err) => err.fmt(f),
            Error::Index(err) => err.fmt(f),
            Error::Render(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::Feed(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`]. The stage errors are
    /// displayed in place, so the chain continues with their sources.
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::UnsafeOutput(_) => None,
            Error::Document(err) => std::error::Error::source(err),
            Error::Parse(err) => std::error::Error::source(err),
            Error::Index(err) => std::error::Error::source(err),
            Error::Render(err) => std::error::Error::source(err),
            Error::Write(err) => std::error::Error::source(err),
            Error::Feed(err) => std::error::Error::source(err),
        }
    }
}

impl From<DocumentError> for Error {
    /// Converts [`DocumentError`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: DocumentError) -> Error {
        Error::Document(err)
    }
}

impl From<ParseError> for Error {
    /// Converts [`ParseError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<IndexError> for Error {
    /// Converts [`IndexError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: IndexError) -> Error {
        Error::Index(err)
    }
}

impl From<RenderError> for Error {
    /// Converts [`RenderError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: RenderError) -> Error {
        Error::Render(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}

impl From<FeedError> for Error {
    /// Converts [`FeedError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: FeedError) -> Error {
        Error::Feed(err)
    }
}
