//! Resolves a [`ContentIndex`] into the set of pages to generate. See
//! [`resolve`].

use crate::{
    document::DocumentId,
    index::ContentIndex,
    tag::{tag_route, TAGS_ROUTE},
};

/// The route of the home page.
pub const HOME_ROUTE: &str = "/";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PageKind {
    Home,
    Post,
    TagList,
    TagDetail,
}

/// The data a page is rendered from. Posts are referenced by ID; the records
/// themselves stay in the [`ContentIndex`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BoundData {
    /// The dated posts, newest first.
    Home { posts: Vec<DocumentId> },

    /// A single post, dated or not.
    Post { post: DocumentId },

    /// Every tag name, sorted. Counts are read from the index's tag groups.
    TagList { tags: Vec<String> },

    /// The posts carrying `tag`, in the index's post order.
    TagDetail { tag: String, posts: Vec<DocumentId> },
}

/// An output page: a route and the data needed to render it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageDescriptor {
    pub route_path: String,
    pub bound_data: BoundData,
}

impl PageDescriptor {
    pub fn kind(&self) -> PageKind {
        match self.bound_data {
            BoundData::Home { .. } => PageKind::Home,
            BoundData::Post { .. } => PageKind::Post,
            BoundData::TagList { .. } => PageKind::TagList,
            BoundData::TagDetail { .. } => PageKind::TagDetail,
        }
    }
}

/// Enumerates the pages for `index`: the home page, one page per post, the
/// tag listing, and one page per tag, in that order. The result only depends
/// on the index, so resolving the same index twice yields the same sequence.
pub fn resolve(index: &ContentIndex) -> Vec<PageDescriptor> {
    let tag_groups = index.tag_groups();
    let mut pages = Vec::with_capacity(2 + index.posts().len() + tag_groups.len());

    pages.push(PageDescriptor {
        route_path: HOME_ROUTE.to_owned(),
        bound_data: BoundData::Home {
            posts: index
                .posts_by_recency()
                .iter()
                .map(|p| p.id.clone())
                .collect(),
        },
    });

    pages.extend(index.posts().iter().map(|post| PageDescriptor {
        route_path: post.route(),
        bound_data: BoundData::Post {
            post: post.id.clone(),
        },
    }));

    pages.push(PageDescriptor {
        route_path: TAGS_ROUTE.to_owned(),
        bound_data: BoundData::TagList {
            tags: tag_groups.keys().cloned().collect(),
        },
    });

    pages.extend(tag_groups.iter().map(|(tag, group)| PageDescriptor {
        route_path: tag_route(tag),
        bound_data: BoundData::TagDetail {
            tag: tag.clone(),
            posts: group.posts.clone(),
        },
    }));

    tracing::debug!(count = pages.len(), "resolved pages");
    pages
}
