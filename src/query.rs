//! The fixed set of named queries pages are built from, answered directly
//! from a [`ContentIndex`]. The result types serialize with the field names
//! templates and external tooling expect (`createdAt`, `fieldValue`,
//! `totalCount`), e.g. for `scriptorium query`.

use serde::Serialize;

use crate::{document::DocumentId, index::ContentIndex, post::PostRecord};

/// A post as returned by [`all_posts`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary<'a> {
    pub id: &'a DocumentId,
    pub excerpt: &'a str,
    pub title: &'a str,
    pub path: &'a str,
    pub created_at: Option<String>,
    pub tags: &'a [String],
}

/// A tag as returned by [`tag_groups`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagCount<'a> {
    pub field_value: &'a str,
    pub total_count: usize,
}

/// A post as returned by [`post_by_path`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail<'a> {
    pub html: &'a str,
    pub title: &'a str,
    pub created_at: Option<String>,
    pub path: &'a str,
}

/// Every post, newest first, with undated posts last.
pub fn all_posts(index: &ContentIndex) -> Vec<PostSummary> {
    index.posts().iter().map(summary).collect()
}

/// Every tag with the number of posts carrying it, ordered by tag name.
pub fn tag_groups(index: &ContentIndex) -> Vec<TagCount> {
    index
        .tag_groups()
        .iter()
        .map(|(tag, group)| TagCount {
            field_value: tag,
            total_count: group.count(),
        })
        .collect()
}

/// The post whose page lives at `path`, if any.
pub fn post_by_path<'a>(index: &'a ContentIndex, path: &str) -> Option<PostDetail<'a>> {
    index.post_by_path(path).map(|post| PostDetail {
        html: &post.body_html,
        title: &post.title,
        created_at: post.display_date(),
        path: &post.path,
    })
}

fn summary(post: &PostRecord) -> PostSummary {
    PostSummary {
        id: &post.id,
        excerpt: &post.excerpt,
        title: &post.title,
        path: &post.path,
        created_at: post.display_date(),
        tags: &post.tags,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::index::{self, test::scenario};

    #[test]
    fn test_all_posts() -> index::Result<()> {
        let index = ContentIndex::build(scenario())?;
        let posts = all_posts(&index);
        let paths: Vec<&str> = posts.iter().map(|p| p.path).collect();
        assert_eq!(vec!["/b", "/a", "/c"], paths);
        assert_eq!(Some(String::from("February 01, 2024")), posts[0].created_at);
        assert_eq!(None, posts[2].created_at);
        Ok(())
    }

    #[test]
    fn test_tag_groups() -> index::Result<()> {
        let index = ContentIndex::build(scenario())?;
        assert_eq!(
            vec![
                TagCount {
                    field_value: "js",
                    total_count: 2,
                },
                TagCount {
                    field_value: "tech",
                    total_count: 2,
                },
            ],
            tag_groups(&index)
        );
        Ok(())
    }

    #[test]
    fn test_post_by_path() -> index::Result<()> {
        let index = ContentIndex::build(scenario())?;
        assert_eq!(
            Some(PostDetail {
                html: "<p>About a.</p>\n",
                title: "A",
                created_at: Some(String::from("January 01, 2024")),
                path: "/a",
            }),
            post_by_path(&index, "/a")
        );
        assert_eq!(None, post_by_path(&index, "/nope"));
        Ok(())
    }

    #[test]
    fn test_serialized_shape() -> index::Result<()> {
        let index = ContentIndex::build(scenario())?;
        let json = serde_json::to_value(&tag_groups(&index)).unwrap();
        assert_eq!(
            serde_json::json!([
                { "fieldValue": "js", "totalCount": 2 },
                { "fieldValue": "tech", "totalCount": 2 },
            ]),
            json
        );

        let json = serde_json::to_value(&all_posts(&index)[0]).unwrap();
        assert_eq!(
            serde_json::json!({
                "id": "b",
                "excerpt": "About b.",
                "title": "B",
                "path": "/b",
                "createdAt": "February 01, 2024",
                "tags": ["js", "tech"],
            }),
            json
        );
        Ok(())
    }
}
