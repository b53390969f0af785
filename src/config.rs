//! Loads the project file (`scriptorium.yaml`) into a [`Config`]. The
//! site-level settings which the parser and the renderer need are collected in
//! the immutable [`SiteConfig`], which is handed to each of them when they are
//! constructed.

use std::{
    fmt,
    fs::File,
    io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use url::Url;

use crate::excerpt::DEFAULT_EXCERPT_LENGTH;

/// The name of the project file.
pub const PROJECT_FILE: &str = "scriptorium.yaml";

#[derive(Deserialize)]
struct ExcerptLength(usize);
impl Default for ExcerptLength {
    fn default() -> Self {
        ExcerptLength(DEFAULT_EXCERPT_LENGTH)
    }
}

/// The stylesheet the layout links when the project file doesn't list any.
pub const DEFAULT_STYLESHEET: &str = "/index.css";

fn default_stylesheets() -> Vec<String> {
    vec![DEFAULT_STYLESHEET.to_owned()]
}

fn default_content_directory() -> PathBuf {
    PathBuf::from("posts")
}

fn default_static_directory() -> PathBuf {
    PathBuf::from("static")
}

fn default_theme_directory() -> PathBuf {
    PathBuf::from("theme")
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Project {
    title: String,
    url: Url,
    #[serde(default)]
    tagline: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    twitter: Option<String>,
    #[serde(default)]
    excerpt_length: ExcerptLength,
    #[serde(default)]
    navigation: Vec<NavLink>,
    #[serde(default = "default_stylesheets")]
    stylesheets: Vec<String>,
    #[serde(default = "default_content_directory")]
    content_directory: PathBuf,
    #[serde(default = "default_static_directory")]
    static_directory: PathBuf,
    #[serde(default = "default_theme_directory")]
    theme_directory: PathBuf,
}

/// An extra link in the site header, after "Home" and "Tags".
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct NavLink {
    pub title: String,
    pub url: String,
}

/// Site-wide settings shared by the parser and the renderer.
#[derive(Clone, Debug)]
pub struct SiteConfig {
    /// The blog title. Also the fallback title for posts without one.
    pub title: String,

    /// The canonical base URL of the deployed site.
    pub url: Url,

    /// The line shown under the title in the site header.
    pub tagline: Option<String>,

    /// The author's display name, used for structured data and the feed.
    pub author: Option<String>,

    /// The author's Twitter handle (e.g. `@someone`).
    pub twitter: Option<String>,

    /// The character budget for post excerpts.
    pub excerpt_length: usize,

    pub navigation: Vec<NavLink>,

    /// The stylesheet URLs linked from every page, in order. Empty means no
    /// stylesheet links.
    pub stylesheets: Vec<String>,
}

impl SiteConfig {
    /// Constructs a [`SiteConfig`] with only the required fields set.
    pub fn new<S: Into<String>>(title: S, url: Url) -> SiteConfig {
        SiteConfig {
            title: title.into(),
            url,
            tagline: None,
            author: None,
            twitter: None,
            excerpt_length: DEFAULT_EXCERPT_LENGTH,
            navigation: Vec::new(),
            stylesheets: default_stylesheets(),
        }
    }

    /// Returns the absolute URL for `route_path`, e.g. the canonical URL for
    /// `/tags` on a site rooted at `https://example.org/` is
    /// `https://example.org/tags`.
    pub fn canonical_url(&self, route_path: &str) -> String {
        let base = self.url.as_str().trim_end_matches('/');
        if route_path.starts_with('/') {
            format!("{}{}", base, route_path)
        } else {
            format!("{}/{}", base, route_path)
        }
    }
}

/// Everything a build needs: the site settings and the project's directories.
/// Relative directories in the project file are resolved against the
/// directory which contains it.
#[derive(Clone, Debug)]
pub struct Config {
    pub site: SiteConfig,
    pub content_directory: PathBuf,
    pub static_directory: PathBuf,
    pub theme_directory: PathBuf,
    pub output_directory: PathBuf,
}

impl Config {
    /// Searches `dir` and then each of its ancestors for a project file and
    /// loads the first one found. If `output_directory` is `None`, output goes
    /// to `_site` beside the project file.
    pub fn from_directory(
        dir: &Path,
        output_directory: Option<&Path>,
    ) -> Result<Config> {
        let mut current = Some(dir);
        while let Some(dir) = current {
            let path = dir.join(PROJECT_FILE);
            if path.is_file() {
                return Config::from_project_file(&path, output_directory);
            }
            current = dir.parent();
        }
        Err(Error::ProjectNotFound(dir.to_owned()))
    }

    /// Loads the project file at `path`.
    pub fn from_project_file(
        path: &Path,
        output_directory: Option<&Path>,
    ) -> Result<Config> {
        let file = File::open(path).map_err(|err| Error::Open {
            path: path.to_owned(),
            err,
        })?;
        let project: Project =
            serde_yaml::from_reader(file).map_err(|err| Error::Deserialize {
                path: path.to_owned(),
                err,
            })?;
        let project_root = path.parent().unwrap_or_else(|| Path::new("."));

        Ok(Config {
            site: SiteConfig {
                title: project.title,
                url: project.url,
                tagline: project.tagline,
                author: project.author,
                twitter: project.twitter,
                excerpt_length: project.excerpt_length.0,
                navigation: project.navigation,
                stylesheets: project.stylesheets,
            },
            content_directory: project_root.join(project.content_directory),
            static_directory: project_root.join(project.static_directory),
            theme_directory: project_root.join(project.theme_directory),
            output_directory: match output_directory {
                Some(dir) => dir.to_owned(),
                None => project_root.join("_site"),
            },
        })
    }
}

/// Represents the result of loading a [`Config`].
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading a [`Config`].
#[derive(Debug)]
pub enum Error {
    /// Returned when no project file exists in the search directory or any of
    /// its ancestors.
    ProjectNotFound(PathBuf),

    /// Returned when the project file can't be opened.
    Open { path: PathBuf, err: io::Error },

    /// Returned when the project file isn't valid.
    Deserialize {
        path: PathBuf,
        err: serde_yaml::Error,
    },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ProjectNotFound(dir) => write!(
                f,
                "could not find `{}` in `{}` or any parent directory",
                PROJECT_FILE,
                dir.display()
            ),
            Error::Open { path, err } => {
                write!(f, "opening project file `{}`: {}", path.display(), err)
            }
            Error::Deserialize { path, err } => {
                write!(f, "loading project file `{}`: {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ProjectNotFound(_) => None,
            Error::Open { path: _, err } => Some(err),
            Error::Deserialize { path: _, err } => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    #[test]
    fn test_canonical_url() -> std::result::Result<(), url::ParseError> {
        let site = SiteConfig::new("Blog", Url::parse("https://example.org/")?);
        assert_eq!("https://example.org/", site.canonical_url("/"));
        assert_eq!("https://example.org/tags", site.canonical_url("/tags"));
        assert_eq!("https://example.org/hello", site.canonical_url("hello"));
        Ok(())
    }

    #[test]
    fn test_from_directory_searches_ancestors() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(PROJECT_FILE),
            "title: My Blog\nurl: https://example.org\ntwitter: '@me'\n\
             navigation:\n  - title: Daily Readings\n    url: /daily-readings\n",
        )
        .unwrap();
        let nested = dir.path().join("posts/2024");
        fs::create_dir_all(&nested).unwrap();

        let config = Config::from_directory(&nested, None)?;
        assert_eq!("My Blog", config.site.title);
        assert_eq!(Some(String::from("@me")), config.site.twitter);
        assert_eq!(DEFAULT_EXCERPT_LENGTH, config.site.excerpt_length);
        assert_eq!(
            vec![NavLink {
                title: String::from("Daily Readings"),
                url: String::from("/daily-readings"),
            }],
            config.site.navigation
        );
        assert_eq!(vec![DEFAULT_STYLESHEET.to_owned()], config.site.stylesheets);
        assert_eq!(dir.path().join("posts"), config.content_directory);
        assert_eq!(dir.path().join("_site"), config.output_directory);
        Ok(())
    }

    #[test]
    fn test_stylesheets() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PROJECT_FILE);
        fs::write(
            &path,
            "title: My Blog\nurl: https://example.org\nstylesheets: [/site.css, /print.css]\n",
        )
        .unwrap();
        let config = Config::from_project_file(&path, None)?;
        assert_eq!(vec!["/site.css", "/print.css"], config.site.stylesheets);

        fs::write(&path, "title: My Blog\nurl: https://example.org\nstylesheets: []\n").unwrap();
        let config = Config::from_project_file(&path, None)?;
        assert!(config.site.stylesheets.is_empty());
        Ok(())
    }

    #[test]
    fn test_invalid_project_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PROJECT_FILE);
        fs::write(&path, "title: My Blog\nurl: not a url\n").unwrap();
        match Config::from_project_file(&path, None) {
            Err(Error::Deserialize { .. }) => {}
            other => panic!("wanted Deserialize error; found {:?}", other),
        }
    }
}
