//! Support for creating an Atom feed from the dated posts of a
//! [`ContentIndex`].

use std::fmt;
use std::io::Write;

use atom_syndication::{Category, Entry, Error as AtomError, Feed, Link, Person, Text};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};

use crate::{config::SiteConfig, index::ContentIndex, post::PostRecord};

/// The name of the feed file in the output root.
pub const FEED_FILE: &str = "feed.atom";

/// Creates a feed of the dated posts in `index` (newest first) and writes the
/// result to `w`. The feed's `updated` timestamp is the newest post's date, so
/// building the same content twice yields the same feed.
pub fn write_feed<W: Write>(site: &SiteConfig, index: &ContentIndex, w: W) -> Result<()> {
    feed(site, index).write_to(w)?;
    Ok(())
}

fn feed(site: &SiteConfig, index: &ContentIndex) -> Feed {
    let posts = index.posts_by_recency();
    let home_page = site.canonical_url("/");

    let mut feed = Feed::default();
    feed.set_title(site.title.clone());
    feed.set_id(home_page.clone());
    feed.set_updated(timestamp(
        posts
            .first()
            .and_then(|post| post.created_at)
            .unwrap_or_else(epoch),
    ));
    feed.set_authors(author_to_people(site));
    feed.set_links(vec![alternate(home_page)]);
    feed.set_entries(
        posts
            .iter()
            .map(|post| feed_entry(site, post))
            .collect::<Vec<Entry>>(),
    );
    feed
}

fn feed_entry(site: &SiteConfig, post: &PostRecord) -> Entry {
    let url = site.canonical_url(&post.route());
    let date = timestamp(post.created_at.unwrap_or_else(epoch));

    let mut entry = Entry::default();
    entry.set_id(url.clone());
    entry.set_title(post.title.clone());
    entry.set_updated(date);
    entry.set_published(Some(date));
    entry.set_authors(author_to_people(site));
    entry.set_links(vec![alternate(url)]);
    entry.set_categories(
        post.tags
            .iter()
            .map(|tag| {
                let mut category = Category::default();
                category.set_term(tag.clone());
                category
            })
            .collect::<Vec<Category>>(),
    );
    if !post.excerpt.is_empty() {
        entry.set_summary(Some(Text::from(post.excerpt.clone())));
    }
    entry
}

fn alternate(href: String) -> Link {
    let mut link = Link::default();
    link.set_href(href);
    link.set_rel("alternate");
    link
}

fn author_to_people(site: &SiteConfig) -> Vec<Person> {
    match &site.author {
        Some(author) => {
            let mut person = Person::default();
            person.set_name(author.clone());
            vec![person]
        }
        None => Vec::new(),
    }
}

// 1970-01-01
fn epoch() -> NaiveDate {
    NaiveDate::default()
}

// Posts only carry a date, so entries are stamped at midnight UTC.
fn timestamp(date: NaiveDate) -> DateTime<FixedOffset> {
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    Utc.from_utc_datetime(&midnight).into()
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a feed.
#[derive(Debug)]
pub enum Error {
    /// Returned when there is a generic I/O error.
    Io(std::io::Error),

    /// Returned when there is an Atom-related error.
    Atom(AtomError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(f),
            Error::Atom(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Atom(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator in fallible feed operations.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<AtomError> for Error {
    /// Converts [`AtomError`]s into [`Error`]. This allows us to use the `?`
    /// operator in fallible feed operations.
    fn from(err: AtomError) -> Error {
        Error::Atom(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::index::test::scenario;
    use url::Url;

    #[test]
    fn test_feed() -> Result<()> {
        let mut site =
            SiteConfig::new("My Blog", Url::parse("https://example.org/").unwrap());
        site.author = Some(String::from("Ada"));
        let index = ContentIndex::build(scenario()).unwrap();

        let mut out: Vec<u8> = Vec::new();
        write_feed(&site, &index, &mut out)?;
        let xml = String::from_utf8(out).unwrap();

        assert!(xml.contains("<title>My Blog</title>"));
        assert!(xml.contains("<id>https://example.org/b</id>"));
        assert!(xml.contains("<id>https://example.org/a</id>"));
        assert!(!xml.contains("https://example.org/c"));
        assert!(xml.contains("<updated>2024-02-01T00:00:00+00:00</updated>"));
        assert!(xml.contains("<name>Ada</name>"));
        let b = xml.find("https://example.org/b").unwrap();
        let a = xml.find("https://example.org/a").unwrap();
        assert!(b < a);
        Ok(())
    }

    #[test]
    fn test_feed_is_reproducible() -> Result<()> {
        let site = SiteConfig::new("My Blog", Url::parse("https://example.org/").unwrap());
        let index = ContentIndex::build(scenario()).unwrap();
        let mut first: Vec<u8> = Vec::new();
        let mut second: Vec<u8> = Vec::new();
        write_feed(&site, &index, &mut first)?;
        write_feed(&site, &index, &mut second)?;
        assert_eq!(first, second);
        Ok(())
    }
}
