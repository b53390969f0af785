//! Converts index data into template [`Value`]s. Text is HTML-escaped here,
//! once, so templates can interpolate fields directly; the only raw field is
//! a post's rendered `html`.

use std::collections::HashMap;

use gtmpl::Value;
use pulldown_cmark::escape::escape_html;

use crate::{
    config::SiteConfig,
    page::HOME_ROUTE,
    post::PostRecord,
    tag::{tag_route, TagGroup, TAGS_ROUTE},
};

/// Escapes `s` for use in HTML text and attribute values.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    // Writing into a `String` can't fail.
    let _ = escape_html(&mut out, s);
    out
}

fn text(s: &str) -> Value {
    Value::String(escape(s))
}

fn optional_text(s: Option<&str>) -> Value {
    match s {
        Some(s) if !s.is_empty() => text(s),
        _ => Value::Nil,
    }
}

/// Builds an object value from already converted fields.
pub fn object(fields: Vec<(&str, Value)>) -> Value {
    let m: HashMap<String, Value> = fields
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v))
        .collect();
    Value::Object(m)
}

fn link(title: &str, url: &str) -> Value {
    object(vec![("title", text(title)), ("url", text(url))])
}

/// A tag as shown beside a post: `{name, url}`.
pub fn tag(name: &str) -> Value {
    object(vec![("name", text(name)), ("url", text(&tag_route(name)))])
}

/// A post as listed on the home and tag pages: `{title, url, date, excerpt,
/// tags}`. `date` and `excerpt` are nil when absent.
pub fn post_summary(post: &PostRecord) -> Value {
    object(vec![
        ("title", text(&post.title)),
        ("url", text(&post.route())),
        ("date", optional_text(post.display_date().as_deref())),
        ("excerpt", optional_text(Some(&post.excerpt))),
        ("tags", Value::Array(post.tags.iter().map(|t| tag(t)).collect())),
    ])
}

/// A post as shown on its own page: the summary fields plus the raw `html`
/// body.
pub fn post_detail(post: &PostRecord) -> Value {
    let mut value = post_summary(post);
    if let Value::Object(m) = &mut value {
        m.insert("html".to_owned(), Value::String(post.body_html.clone()));
    }
    value
}

/// A tag as listed on the tag-listing page: `{name, url, count}`.
pub fn tag_group(name: &str, group: &TagGroup) -> Value {
    let mut value = tag(name);
    if let Value::Object(m) = &mut value {
        m.insert("count".to_owned(), Value::String(group.count().to_string()));
    }
    value
}

/// The site fields available to every template: `{title, tagline, url}`.
pub fn site(site: &SiteConfig) -> Value {
    object(vec![
        ("title", text(&site.title)),
        ("tagline", optional_text(site.tagline.as_deref())),
        ("url", text(site.url.as_str())),
        (
            "stylesheets",
            Value::Array(site.stylesheets.iter().map(|href| text(href)).collect()),
        ),
    ])
}

/// The header links: "Home", "Tags", and then the configured extras.
pub fn navigation(site: &SiteConfig) -> Value {
    let mut links = vec![link("Home", HOME_ROUTE), link("Tags", TAGS_ROUTE)];
    links.extend(site.navigation.iter().map(|l| link(&l.title, &l.url)));
    Value::Array(links)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::index::test::record;

    fn field<'a>(value: &'a Value, key: &str) -> &'a Value {
        match value {
            Value::Object(m) => &m[key],
            _ => panic!("not an object"),
        }
    }

    fn string<'a>(value: &'a Value) -> &'a str {
        match value {
            Value::String(s) => s,
            _ => panic!("not a string"),
        }
    }

    fn is_nil(value: &Value) -> bool {
        match value {
            Value::Nil => true,
            _ => false,
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(
            "Tom &amp; Jerry &lt;3 &quot;cartoons&quot;",
            escape("Tom & Jerry <3 \"cartoons\"")
        );
    }

    #[test]
    fn test_post_summary() {
        let mut post = record("a", "/a", Some((2024, 1, 1)), &["js"]);
        post.title = String::from("<Hello>");
        let value = post_summary(&post);
        assert_eq!("&lt;Hello&gt;", string(field(&value, "title")));
        assert_eq!("January 01, 2024", string(field(&value, "date")));
        match field(&value, "tags") {
            Value::Array(tags) => {
                assert_eq!("/tags/js/", string(field(&tags[0], "url")))
            }
            _ => panic!("not an array"),
        }
    }

    #[test]
    fn test_absent_fields_are_nil() {
        let mut post = record("c", "/c", None, &[]);
        post.excerpt = String::new();
        let value = post_summary(&post);
        assert!(is_nil(field(&value, "date")));
        assert!(is_nil(field(&value, "excerpt")));
    }

    #[test]
    fn test_post_detail_keeps_html_raw() {
        let post = record("a", "/a", None, &[]);
        assert_eq!("<p>About a.</p>\n", string(field(&post_detail(&post), "html")));
    }

    #[test]
    fn test_post_summary_url_is_site_absolute() {
        let post = record("hello", "hello", None, &[]);
        assert_eq!("/hello", string(field(&post_summary(&post), "url")));
    }
}
