//! Defines [`TagGroup`], the posts which share a tag, and the routing rules
//! for tag pages.

use crate::document::DocumentId;

/// The route of the tag-listing page.
pub const TAGS_ROUTE: &str = "/tags";

/// Converts a tag name into the kebab-case form used in its route, e.g.
/// `Rust Lang` becomes `rust-lang`.
pub fn kebab_case(tag: &str) -> String {
    slug::slugify(tag)
}

/// Returns the route of the page listing the posts tagged `tag`, e.g.
/// `/tags/rust-lang/`.
pub fn tag_route(tag: &str) -> String {
    format!("{}/{}/", TAGS_ROUTE, kebab_case(tag))
}

/// The posts carrying a single tag. Members are kept in the index's post
/// order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagGroup {
    pub posts: Vec<DocumentId>,
}

impl TagGroup {
    /// The number of posts carrying the tag.
    pub fn count(&self) -> usize {
        self.posts.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tag_route() {
        assert_eq!("/tags/js/", tag_route("js"));
        assert_eq!("/tags/rust-lang/", tag_route("Rust Lang"));
        assert_eq!("/tags/c-plus-plus/", tag_route("C Plus Plus"));
    }
}
