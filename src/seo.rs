//! Builds the `<head>` metadata for a page: schema.org structured data, Open
//! Graph tags, and the Twitter card.

use chrono::NaiveDate;
use serde_json::{json, Map, Value as Json};

use crate::{config::SiteConfig, value::escape};

const SCHEMA_CONTEXT: &str = "http://schema.org";

/// What the head metadata describes.
pub struct PageMeta<'a> {
    /// The page's own title, if any. The site title is used otherwise.
    pub title: Option<&'a str>,

    pub canonical_url: &'a str,

    /// Set for post pages only.
    pub article: Option<Article<'a>>,
}

/// The extra fields of a post page.
pub struct Article<'a> {
    pub published: Option<NaiveDate>,
    pub description: Option<&'a str>,
}

/// Renders the head tags for `meta`. Every page gets the `WebSite` structured
/// data and the site-level Open Graph tags; post pages additionally get the
/// breadcrumb and `BlogPosting` structured data, `og:type=article`, a
/// description, and the Twitter card. Absent optional fields are left out.
pub fn head_tags(site: &SiteConfig, meta: &PageMeta) -> String {
    let title = meta.title.unwrap_or(&site.title);
    let mut tags: Vec<String> = Vec::new();

    if let Some(Article {
        description: Some(description),
        ..
    }) = &meta.article
    {
        tags.push(meta_name("description", description));
    }

    tags.push(format!(
        r#"<script type="application/ld+json">{}</script>"#,
        script_safe(&structured_data(site, meta, title).to_string())
    ));

    tags.push(meta_property(
        "og:type",
        match meta.article {
            Some(_) => "article",
            None => "website",
        },
    ));
    tags.push(meta_property("og:site_name", &site.title));
    tags.push(meta_property("og:url", meta.canonical_url));
    tags.push(meta_property("og:title", title));

    if meta.article.is_some() {
        tags.push(meta_name("twitter:card", "summary_large_image"));
        if let Some(twitter) = &site.twitter {
            tags.push(meta_name("twitter:creator", twitter));
        }
        tags.push(meta_name("twitter:title", title));
    }

    tags.join("\n")
}

/// The schema.org JSON-LD array for a page.
pub fn structured_data(site: &SiteConfig, meta: &PageMeta, title: &str) -> Json {
    let website = json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "WebSite",
        "url": meta.canonical_url,
        "name": title,
        "alternateName": site.title,
    });

    let article = match &meta.article {
        None => return Json::Array(vec![website]),
        Some(article) => article,
    };

    let breadcrumbs = json!({
        "@context": SCHEMA_CONTEXT,
        "@type": "BreadcrumbList",
        "itemListElement": [{
            "@type": "ListItem",
            "position": 1,
            "item": {
                "@id": meta.canonical_url,
                "name": title,
            },
        }],
    });

    let mut posting = Map::new();
    posting.insert("@context".into(), json!(SCHEMA_CONTEXT));
    posting.insert("@type".into(), json!("BlogPosting"));
    posting.insert("url".into(), json!(meta.canonical_url));
    posting.insert("name".into(), json!(title));
    posting.insert("alternateName".into(), json!(site.title));
    posting.insert("headline".into(), json!(title));
    if let Some(description) = article.description {
        posting.insert("description".into(), json!(description));
    }
    if let Some(author) = &site.author {
        posting.insert(
            "author".into(),
            json!({ "@type": "Person", "name": author }),
        );
        posting.insert(
            "publisher".into(),
            json!({
                "@type": "Organization",
                "url": site.url.as_str(),
                "name": author,
            }),
        );
    }
    posting.insert(
        "mainEntityOfPage".into(),
        json!({ "@type": "WebSite", "@id": site.url.as_str() }),
    );
    if let Some(published) = article.published {
        posting.insert(
            "datePublished".into(),
            json!(published.format("%Y-%m-%d").to_string()),
        );
    }

    Json::Array(vec![website, breadcrumbs, Json::Object(posting)])
}

fn meta_name(name: &str, content: &str) -> String {
    format!(
        r#"<meta name="{}" content="{}">"#,
        escape(name),
        escape(content)
    )
}

fn meta_property(property: &str, content: &str) -> String {
    format!(
        r#"<meta property="{}" content="{}">"#,
        escape(property),
        escape(content)
    )
}

/// Keeps serialized JSON from closing its `<script>` element early.
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\/")
}

#[cfg(test)]
mod test {
    use super::*;
    use url::Url;

    fn site() -> SiteConfig {
        let mut site =
            SiteConfig::new("My Blog", Url::parse("https://example.org/").unwrap());
        site.author = Some(String::from("Ada"));
        site.twitter = Some(String::from("@ada"));
        site
    }

    #[test]
    fn test_post_head_tags() {
        let site = site();
        let head = head_tags(
            &site,
            &PageMeta {
                title: Some("Hello & Welcome"),
                canonical_url: "https://example.org/hello",
                article: Some(Article {
                    published: NaiveDate::from_ymd_opt(2024, 2, 1),
                    description: Some("A greeting."),
                }),
            },
        );
        assert!(head.contains(r#"<meta property="og:type" content="article">"#));
        assert!(head.contains(
            r#"<meta property="og:url" content="https://example.org/hello">"#
        ));
        assert!(head.contains(
            r#"<meta property="og:title" content="Hello &amp; Welcome">"#
        ));
        assert!(head.contains(
            r#"<meta name="twitter:card" content="summary_large_image">"#
        ));
        assert!(head.contains(r#"<meta name="twitter:creator" content="@ada">"#));
        assert!(head.contains(r#"<meta name="description" content="A greeting.">"#));
        assert!(head.contains(r#""datePublished":"2024-02-01""#));
        assert!(head.contains(r#""@type":"BreadcrumbList""#));
    }

    #[test]
    fn test_website_head_tags() {
        let site = site();
        let head = head_tags(
            &site,
            &PageMeta {
                title: None,
                canonical_url: "https://example.org/",
                article: None,
            },
        );
        assert!(head.contains(r#"<meta property="og:type" content="website">"#));
        assert!(head.contains(r#"<meta property="og:title" content="My Blog">"#));
        assert!(!head.contains("twitter:card"));
        assert!(!head.contains("BlogPosting"));
    }

    #[test]
    fn test_structured_data_omits_missing_fields() {
        let site = SiteConfig::new("My Blog", Url::parse("https://example.org/").unwrap());
        let data = structured_data(
            &site,
            &PageMeta {
                title: Some("Draft"),
                canonical_url: "https://example.org/draft",
                article: Some(Article {
                    published: None,
                    description: None,
                }),
            },
            "Draft",
        );
        let posting = &data[2];
        assert_eq!("BlogPosting", posting["@type"]);
        assert!(posting.get("datePublished").is_none());
        assert!(posting.get("author").is_none());
        assert!(posting.get("description").is_none());
    }

    #[test]
    fn test_script_safe() {
        assert_eq!(r#"{"a":"<\/script>"}"#, script_safe(r#"{"a":"</script>"}"#));
    }
}
