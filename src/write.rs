//! Persists rendered pages to the output directory and copies the project's
//! static assets beside them.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::render::OutputDocument;

const INDEX_FILE: &str = "index.html";

/// Maps a route to the file which serves it, relative to the output
/// directory: `/` maps to `index.html` and `/x` or `/x/` to `x/index.html`.
/// Routes which would resolve outside of the output directory are rejected.
pub fn route_file(route_path: &str) -> Result<PathBuf> {
    let mut file = PathBuf::new();
    for segment in route_path.split('/').filter(|s| !s.is_empty()) {
        match Path::new(segment).components().next() {
            Some(Component::Normal(_)) => file.push(segment),
            _ => {
                return Err(Error::UnsafeRoute {
                    route: route_path.to_owned(),
                })
            }
        }
    }
    file.push(INDEX_FILE);
    Ok(file)
}

/// Writes output into a single directory.
pub struct Writer<'a> {
    output_directory: &'a Path,
}

impl<'a> Writer<'a> {
    pub fn new(output_directory: &'a Path) -> Writer<'a> {
        Writer { output_directory }
    }

    /// Deletes the output directory and everything in it. A missing directory
    /// is not an error.
    pub fn clean(&self) -> Result<()> {
        match fs::remove_dir_all(self.output_directory) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::Clean {
                path: self.output_directory.to_owned(),
                err,
            }),
        }
    }

    /// Writes each document to the file for its route, creating directories as
    /// needed. Returns the number of files written.
    pub fn write_documents(&self, documents: &[OutputDocument]) -> Result<usize> {
        documents
            .par_iter()
            .try_for_each(|document| self.write_document(document))?;
        info!(
            files = documents.len(),
            dir = %self.output_directory.display(),
            "wrote pages"
        );
        Ok(documents.len())
    }

    fn write_document(&self, document: &OutputDocument) -> Result<()> {
        let path = self.output_directory.join(route_file(&document.route_path)?);
        if let Some(dir) = path.parent() {
            create_dir(dir)?;
        }
        debug!(route = %document.route_path, file = %path.display(), "writing page");
        fs::write(&path, &document.html).map_err(|err| Error::Io { path, err })
    }

    /// Creates (or truncates) the file `name` in the output root.
    pub fn create_file(&self, name: &str) -> Result<fs::File> {
        create_dir(self.output_directory)?;
        let path = self.output_directory.join(name);
        fs::File::create(&path).map_err(|err| Error::Io { path, err })
    }

    /// Copies the tree under `static_directory` into the output root,
    /// preserving relative paths. A project without static assets is fine:
    /// a missing directory copies nothing. Returns the number of files copied.
    pub fn copy_static(&self, static_directory: &Path) -> Result<usize> {
        if static_directory.is_dir() {
            create_dir(self.output_directory)?;
        }
        let mut copied = 0;
        walk_static(static_directory, |entry, relative| {
            let target = self.output_directory.join(relative);
            if entry.file_type().is_dir() {
                create_dir(&target)
            } else {
                fs::copy(entry.path(), &target).map_err(|err| Error::Io {
                    path: target.clone(),
                    err,
                })?;
                copied += 1;
                Ok(())
            }
        })?;
        info!(files = copied, "copied static assets");
        Ok(copied)
    }
}

/// Checks that the pages, the extra files in the output root (e.g. the feed),
/// and the static assets under `static_directory` can all be written without
/// one of them replacing or blocking another. Nothing is written, so a build
/// can run this before it deletes the previous output.
pub fn check_layout(
    documents: &[OutputDocument],
    root_files: &[&str],
    static_directory: &Path,
) -> Result<()> {
    let mut files: BTreeSet<PathBuf> = BTreeSet::new();
    let claimed = documents
        .iter()
        .map(|document| route_file(&document.route_path))
        .chain(root_files.iter().map(|name| Ok(PathBuf::from(*name))));
    for file in claimed {
        let file = file?;
        if files.contains(&file) {
            return Err(Error::Conflict { path: file });
        }
        files.insert(file);
    }

    let dirs: BTreeSet<PathBuf> = files
        .iter()
        .flat_map(|file| file.ancestors().skip(1))
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_owned)
        .collect();
    if let Some(file) = files.iter().find(|file| dirs.contains(*file)) {
        return Err(Error::Conflict { path: file.clone() });
    }

    walk_static(static_directory, |entry, relative| {
        let blocked = match entry.file_type().is_dir() {
            true => files.contains(relative),
            false => files.contains(relative) || dirs.contains(relative),
        };
        match blocked {
            true => Err(Error::Conflict {
                path: relative.to_owned(),
            }),
            false => Ok(()),
        }
    })
}

/// Visits every entry below `static_directory` in file-name order, passing
/// the entry and its path relative to `static_directory`. A missing directory
/// has no entries.
fn walk_static<F>(static_directory: &Path, mut visit: F) -> Result<()>
where
    F: FnMut(&DirEntry, &Path) -> Result<()>,
{
    if !static_directory.is_dir() {
        debug!(dir = %static_directory.display(), "no static directory");
        return Ok(());
    }

    let walker = WalkDir::new(static_directory)
        .min_depth(1)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()));
    for entry in walker {
        let entry = entry.map_err(|err| Error::Walk {
            path: static_directory.to_owned(),
            err,
        })?;
        // Every entry lives under the walk's root.
        if let Ok(relative) = entry.path().strip_prefix(static_directory) {
            visit(&entry, relative)?;
        }
    }
    Ok(())
}

fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|err| Error::Io {
        path: dir.to_owned(),
        err,
    })
}

/// The result of a fallible output operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error writing output.
#[derive(Debug)]
pub enum Error {
    /// Returned when a route contains `.` or `..` segments.
    UnsafeRoute { route: String },

    /// Returned when two outputs would be written to the same path, or one
    /// would need a directory where another is a file.
    Conflict { path: PathBuf },

    /// Returned for I/O problems while deleting the old output.
    Clean { path: PathBuf, err: io::Error },

    /// Returned for I/O problems while traversing the static directory.
    Walk { path: PathBuf, err: walkdir::Error },

    /// Returned for I/O problems while creating or writing a file.
    Io { path: PathBuf, err: io::Error },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnsafeRoute { route } => {
                write!(f, "route `{}` escapes the output directory", route)
            }
            Error::Conflict { path } => write!(
                f,
                "output path `{}` is claimed by more than one page, asset or feed",
                path.display()
            ),
            Error::Clean { path, err } => {
                write!(f, "cleaning directory `{}`: {}", path.display(), err)
            }
            Error::Walk { path, err } => {
                write!(f, "reading static directory `{}`: {}", path.display(), err)
            }
            Error::Io { path, err } => {
                write!(f, "writing `{}`: {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::UnsafeRoute { .. } => None,
            Error::Conflict { .. } => None,
            Error::Clean { err, .. } => Some(err),
            Error::Walk { err, .. } => Some(err),
            Error::Io { err, .. } => Some(err),
        }
    }
}
