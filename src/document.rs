//! Defines the [`Document`] type and [`list_documents`], which discovers the
//! raw Markdown sources under a content root. A document is only split into
//! its metadata block and body here; interpreting either is the job of
//! [`crate::post::Parser`].

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// The extension (without the leading dot) of document source files.
pub const MARKDOWN_EXTENSION: &str = "md";

/// The line which opens and closes a metadata block.
const FENCE: &str = "---";

/// Identifies a [`Document`] (and the [`crate::post::PostRecord`] derived
/// from it). The ID is the source path relative to the content root, with
/// `/` separators and without the `.md` extension, e.g. the ID for
/// `{content_root}/2024/hello.md` is `2024/hello`. It only depends on the
/// source path, so rebuilding the same tree produces the same IDs.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new<S: Into<String>>(id: S) -> DocumentId {
        DocumentId(id.into())
    }

    /// Derives an ID from a path relative to the content root.
    pub fn from_relative_path(relative_path: &Path) -> DocumentId {
        let parts: Vec<String> = relative_path
            .with_extension("")
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        DocumentId(parts.join("/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The raw text between a document's opening and closing fences.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetadataBlock {
    /// The text between the fences, exclusive.
    pub text: String,

    /// False when the opening fence was found but the closing one wasn't. In
    /// that case `text` holds everything after the opening fence.
    pub terminated: bool,
}

/// A raw content unit, one per source file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub id: DocumentId,
    pub raw_body: String,
    pub raw_metadata_block: Option<MetadataBlock>,
}

impl Document {
    /// Splits `contents` into its optional metadata block and its body. A
    /// metadata block exists when the first line is exactly `---`; it ends at
    /// the next line which is exactly `---`.
    pub fn from_source(id: DocumentId, contents: &str) -> Document {
        let contents = contents.trim_start_matches('\u{feff}');
        let mut lines = contents.split_inclusive('\n');
        let opening = match lines.next() {
            Some(line) if line.trim_end() == FENCE => line,
            _ => {
                return Document {
                    id,
                    raw_body: contents.to_owned(),
                    raw_metadata_block: None,
                }
            }
        };

        let block_start = opening.len();
        let mut offset = block_start;
        for line in lines {
            if line.trim_end() == FENCE {
                return Document {
                    id,
                    raw_body: contents[offset + line.len()..].to_owned(),
                    raw_metadata_block: Some(MetadataBlock {
                        text: contents[block_start..offset].to_owned(),
                        terminated: true,
                    }),
                };
            }
            offset += line.len();
        }

        Document {
            id,
            raw_body: String::new(),
            raw_metadata_block: Some(MetadataBlock {
                text: contents[block_start..].to_owned(),
                terminated: false,
            }),
        }
    }
}

/// Recursively searches `content_root` for Markdown files and loads each of
/// them as a [`Document`]. Entries are visited in file-name order and hidden
/// files and directories are skipped, so the returned order (the "discovery
/// order") is stable across builds. Files are read on the rayon pool.
pub fn list_documents(content_root: &Path) -> Result<Vec<Document>> {
    let unavailable = |err: io::Error| Error::SourceUnavailable {
        path: content_root.to_owned(),
        err,
    };
    if !fs::metadata(content_root).map_err(unavailable)?.is_dir() {
        return Err(unavailable(io::Error::new(
            io::ErrorKind::Other,
            "not a directory",
        )));
    }

    let mut sources = Vec::new();
    for result in WalkDir::new(content_root)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry))
    {
        let entry = result.map_err(|err| Error::SourceUnavailable {
            path: err
                .path()
                .map(Path::to_owned)
                .unwrap_or_else(|| content_root.to_owned()),
            err: err.into(),
        })?;
        if entry.file_type().is_file() && is_markdown(entry.path()) {
            sources.push(entry.into_path());
        }
    }
    debug!(root = %content_root.display(), count = sources.len(), "discovered documents");

    sources
        .par_iter()
        .map(|path| load_document(content_root, path))
        .collect()
}

fn load_document(content_root: &Path, path: &Path) -> Result<Document> {
    let contents =
        fs::read_to_string(path).map_err(|err| Error::SourceUnavailable {
            path: path.to_owned(),
            err,
        })?;
    // `path` was produced by walking `content_root`, so it's always a
    // descendant.
    let relative_path = path.strip_prefix(content_root).unwrap_or(path);
    Ok(Document::from_source(
        DocumentId::from_relative_path(relative_path),
        &contents,
    ))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .map_or(false, |extension| extension == MARKDOWN_EXTENSION)
}

/// Represents the result of loading documents.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading [`Document`]s.
#[derive(Debug)]
pub enum Error {
    /// Returned when the content root or a file beneath it can't be read.
    SourceUnavailable { path: PathBuf, err: io::Error },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::SourceUnavailable { path, err } => {
                write!(f, "reading content source `{}`: {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::SourceUnavailable { path: _, err } => Some(err),
        }
    }
}
