//! Defines the [`ContentIndex`], the aggregate view of every post which the
//! page resolver, the renderer, and the queries read from.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
    fmt,
};

use tracing::info;

use crate::{
    document::DocumentId,
    feed::FEED_FILE,
    post::{post_route, PostRecord},
    tag::{kebab_case, TagGroup, TAGS_ROUTE},
};

/// All posts of a site, ordered and grouped by tag. An index is built in one
/// go from a complete set of records and never mutated afterwards; a rebuild
/// creates a new index.
#[derive(Debug, PartialEq)]
pub struct ContentIndex {
    /// Dated posts (newest first) followed by undated posts in discovery
    /// order.
    posts: Vec<PostRecord>,

    /// The number of dated posts, i.e., the length of the dated prefix of
    /// `posts`.
    dated: usize,

    tag_groups: BTreeMap<String, TagGroup>,
    by_id: HashMap<DocumentId, usize>,
    by_route: HashMap<String, usize>,
}

impl ContentIndex {
    /// Builds an index from `records`, which must be in discovery order.
    ///
    /// Fails if two records resolve to the same route, if a record's route
    /// shadows a generated page, or if two distinct tags share a tag-page
    /// route.
    pub fn build(records: Vec<PostRecord>) -> Result<ContentIndex> {
        check_routes(&records)?;

        let mut posts = records;
        posts.sort_by(|a, b| match (a.created_at, b.created_at) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        let dated = posts.iter().take_while(|p| p.created_at.is_some()).count();

        let tag_groups = group_tags(&posts)?;

        let by_id = posts
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();
        let by_route = posts
            .iter()
            .enumerate()
            .map(|(i, p)| (route_key(&p.path), i))
            .collect();

        info!(
            posts = posts.len(),
            dated,
            tags = tag_groups.len(),
            "built content index"
        );
        Ok(ContentIndex {
            posts,
            dated,
            tag_groups,
            by_id,
            by_route,
        })
    }

    /// Every post: dated posts newest first, then undated posts in discovery
    /// order.
    pub fn posts(&self) -> &[PostRecord] {
        &self.posts
    }

    /// The dated posts, newest first. Posts with the same date keep their
    /// discovery order.
    pub fn posts_by_recency(&self) -> &[PostRecord] {
        &self.posts[..self.dated]
    }

    /// The tag groups, iterated by tag name.
    pub fn tag_groups(&self) -> &BTreeMap<String, TagGroup> {
        &self.tag_groups
    }

    pub fn post(&self, id: &DocumentId) -> Option<&PostRecord> {
        self.by_id.get(id).map(|&i| &self.posts[i])
    }

    /// Looks a post up by its route. `/hello` and `/hello/` are equivalent.
    pub fn post_by_path(&self, path: &str) -> Option<&PostRecord> {
        self.by_route.get(&route_key(path)).map(|&i| &self.posts[i])
    }
}

/// Fails if two records share a route or a record shadows a generated page.
fn check_routes(records: &[PostRecord]) -> Result<()> {
    let mut owners: HashMap<String, &DocumentId> = HashMap::new();
    for record in records {
        let key = route_key(&record.path);
        if is_reserved(&key) {
            return Err(Error::ReservedPath {
                id: record.id.clone(),
                path: record.path.clone(),
            });
        }
        if let Some(first) = owners.insert(key, &record.id) {
            return Err(Error::DuplicatePath {
                path: record.path.clone(),
                first: first.clone(),
                second: record.id.clone(),
            });
        }
    }
    Ok(())
}

/// Groups the (already ordered) `posts` by tag. Every post is considered,
/// dated or not.
fn group_tags(posts: &[PostRecord]) -> Result<BTreeMap<String, TagGroup>> {
    let mut tag_groups: BTreeMap<String, TagGroup> = BTreeMap::new();
    let mut slugs: HashMap<String, &str> = HashMap::new();
    for post in posts {
        for tag in &post.tags {
            if let Some(group) = tag_groups.get_mut(tag) {
                group.posts.push(post.id.clone());
                continue;
            }

            let slug = kebab_case(tag);
            if slug.is_empty() {
                return Err(Error::UnroutableTag {
                    tag: tag.clone(),
                    id: post.id.clone(),
                });
            }
            if let Some(other) = slugs.insert(slug, tag) {
                return Err(Error::TagRouteConflict {
                    first: other.to_owned(),
                    second: tag.clone(),
                });
            }
            tag_groups.insert(
                tag.clone(),
                TagGroup {
                    posts: vec![post.id.clone()],
                },
            );
        }
    }
    Ok(tag_groups)
}

/// Normalizes `path` into the form used to detect collisions. Paths which
/// write to the same file (`/a/b`, `/a//b/`) share a key.
fn route_key(path: &str) -> String {
    post_route(path)
}

/// Reports whether a post at `key` would shadow a generated page or the feed,
/// or would escape its own directory.
fn is_reserved(key: &str) -> bool {
    key == "/"
        || key == TAGS_ROUTE
        || key.starts_with(&format!("{}/", TAGS_ROUTE))
        || key == format!("/{}", FEED_FILE)
        || key.split('/').any(|segment| segment == "." || segment == "..")
}

/// Represents the result of building a [`ContentIndex`].
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error building a [`ContentIndex`].
#[derive(Debug)]
pub enum Error {
    /// Returned when two posts have the same `path`.
    DuplicatePath {
        path: String,
        first: DocumentId,
        second: DocumentId,
    },

    /// Returned when a post's `path` collides with the home page, the tag
    /// pages, or the feed, or contains a `.` or `..` segment.
    ReservedPath { id: DocumentId, path: String },

    /// Returned when two distinct tags (e.g., `Rust` and `rust`) would be
    /// listed on the same tag page.
    TagRouteConflict { first: String, second: String },

    /// Returned when a tag has no characters that can appear in a route.
    UnroutableTag { tag: String, id: DocumentId },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::DuplicatePath {
                path,
                first,
                second,
            } => write!(
                f,
                "posts `{}` and `{}` both have the path `{}`",
                first, second, path
            ),
            Error::ReservedPath { id, path } => write!(
                f,
                "post `{}` has the reserved or non-plain path `{}`",
                id, path
            ),
            Error::TagRouteConflict { first, second } => write!(
                f,
                "tags `{}` and `{}` map to the same tag page `{}/{}/`",
                first,
                second,
                TAGS_ROUTE,
                kebab_case(first)
            ),
            Error::UnroutableTag { tag, id } => write!(
                f,
                "tag `{}` in post `{}` has no characters usable in a URL",
                tag, id
            ),
        }
    }
}

impl std::error::Error for Error {}
