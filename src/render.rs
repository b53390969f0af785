//! Renders [`PageDescriptor`]s into HTML documents. Each page body is produced
//! by the template for its kind and then wrapped in the shared layout, which
//! carries the page's `<head>` metadata (see [`crate::seo`]).

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use gtmpl::{Context, Template, Value};
use rayon::prelude::*;
use tracing::debug;

use crate::{
    config::SiteConfig,
    document::DocumentId,
    index::ContentIndex,
    page::{BoundData, PageDescriptor},
    post::PostRecord,
    seo::{self, Article, PageMeta},
    value,
};

const LAYOUT_TEMPLATE: &str = "layout.html";
const HOME_TEMPLATE: &str = "home.html";
const POST_TEMPLATE: &str = "post.html";
const TAG_LIST_TEMPLATE: &str = "tags.html";
const TAG_DETAIL_TEMPLATE: &str = "tag.html";

/// The template sources a site is rendered with.
#[derive(Clone, Debug)]
pub struct Theme {
    /// Wraps every page. Receives `site`, `navigation`, `document_title`,
    /// `canonical_url`, `head` (raw HTML), and `content` (raw HTML).
    pub layout: String,

    /// Receives `posts`.
    pub home: String,

    /// Receives `post`.
    pub post: String,

    /// Receives `tags`.
    pub tag_list: String,

    /// Receives `tag` and `posts`.
    pub tag_detail: String,
}

impl Default for Theme {
    /// The built-in theme.
    fn default() -> Theme {
        Theme {
            layout: include_str!("../theme/layout.html").to_owned(),
            home: include_str!("../theme/home.html").to_owned(),
            post: include_str!("../theme/post.html").to_owned(),
            tag_list: include_str!("../theme/tags.html").to_owned(),
            tag_detail: include_str!("../theme/tag.html").to_owned(),
        }
    }
}

impl Theme {
    /// Loads the built-in theme, replacing each template for which `dir`
    /// contains a file of the same name (`layout.html`, `home.html`,
    /// `post.html`, `tags.html`, `tag.html`). A missing `dir` is fine.
    pub fn load(dir: &Path) -> Result<Theme> {
        let mut theme = Theme::default();
        for (name, slot) in vec![
            (LAYOUT_TEMPLATE, &mut theme.layout),
            (HOME_TEMPLATE, &mut theme.home),
            (POST_TEMPLATE, &mut theme.post),
            (TAG_LIST_TEMPLATE, &mut theme.tag_list),
            (TAG_DETAIL_TEMPLATE, &mut theme.tag_detail),
        ] {
            let path = dir.join(name);
            if path.is_file() {
                *slot = fs::read_to_string(&path)
                    .map_err(|err| Error::OpenTemplateFile { path: path.clone(), err })?;
                debug!(template = %path.display(), "using theme override");
            }
        }
        Ok(theme)
    }

    /// Parses every template of the theme.
    fn parse(&self) -> Result<Templates> {
        Ok(Templates {
            layout: parse_template(LAYOUT_TEMPLATE, &self.layout)?,
            home: parse_template(HOME_TEMPLATE, &self.home)?,
            post: parse_template(POST_TEMPLATE, &self.post)?,
            tag_list: parse_template(TAG_LIST_TEMPLATE, &self.tag_list)?,
            tag_detail: parse_template(TAG_DETAIL_TEMPLATE, &self.tag_detail)?,
        })
    }
}

/// The parsed templates of a [`Theme`]. Executing a template only borrows it,
/// so one set serves every rayon worker.
struct Templates {
    layout: Template,
    home: Template,
    post: Template,
    tag_list: Template,
    tag_detail: Template,
}

/// A rendered page, ready to be written at `route_path`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputDocument {
    pub route_path: String,
    pub html: String,
}

/// Renders pages with a [`Theme`] and the site settings.
pub struct Renderer<'a> {
    site: &'a SiteConfig,
    templates: Templates,
}

impl<'a> Renderer<'a> {
    /// Constructs a renderer, parsing every template in `theme` up front.
    pub fn new(site: &'a SiteConfig, theme: &Theme) -> Result<Renderer<'a>> {
        Ok(Renderer {
            site,
            templates: theme.parse()?,
        })
    }

    /// Renders a single page. Posts referenced by `page` are looked up in
    /// `index`.
    pub fn render(
        &self,
        index: &ContentIndex,
        page: &PageDescriptor,
    ) -> Result<OutputDocument> {
        let route = page.route_path.as_str();
        let canonical_url = self.site.canonical_url(route);
        let (name, template, title, article, data) = match &page.bound_data {
            BoundData::Home { posts } => (
                HOME_TEMPLATE,
                &self.templates.home,
                None,
                None,
                value::object(vec![("posts", summaries(index, posts, route)?)]),
            ),
            BoundData::Post { post } => {
                let post = lookup(index, post, route)?;
                (
                    POST_TEMPLATE,
                    &self.templates.post,
                    Some(post.title.clone()),
                    Some(Article {
                        published: post.created_at,
                        description: Some(post.excerpt.as_str())
                            .filter(|excerpt| !excerpt.is_empty()),
                    }),
                    value::object(vec![("post", value::post_detail(post))]),
                )
            }
            BoundData::TagList { tags } => {
                let groups = index.tag_groups();
                (
                    TAG_LIST_TEMPLATE,
                    &self.templates.tag_list,
                    Some(String::from("Tags")),
                    None,
                    value::object(vec![(
                        "tags",
                        Value::Array(
                            tags.iter()
                                .filter_map(|tag| {
                                    groups
                                        .get(tag)
                                        .map(|group| value::tag_group(tag, group))
                                })
                                .collect(),
                        ),
                    )]),
                )
            }
            BoundData::TagDetail { tag, posts } => (
                TAG_DETAIL_TEMPLATE,
                &self.templates.tag_detail,
                Some(format!("Posts tagged #{}", tag)),
                None,
                value::object(vec![
                    ("tag", Value::String(value::escape(tag))),
                    ("posts", summaries(index, posts, route)?),
                ]),
            ),
        };

        let content = execute(name, template, route, data)?;
        let head = seo::head_tags(
            self.site,
            &PageMeta {
                title: title.as_deref(),
                canonical_url: &canonical_url,
                article,
            },
        );
        let document_title = match &title {
            Some(title) => format!("{} | {}", title, self.site.title),
            None => self.site.title.clone(),
        };

        let html = execute(
            LAYOUT_TEMPLATE,
            &self.templates.layout,
            route,
            value::object(vec![
                ("site", value::site(self.site)),
                ("navigation", value::navigation(self.site)),
                ("document_title", Value::String(value::escape(&document_title))),
                ("canonical_url", Value::String(value::escape(&canonical_url))),
                ("head", Value::String(head)),
                ("content", Value::String(content)),
            ]),
        )?;

        Ok(OutputDocument {
            route_path: page.route_path.clone(),
            html,
        })
    }

    /// Renders `pages` on the rayon pool. The output keeps the order of
    /// `pages`; the first failure aborts the batch.
    pub fn render_all(
        &self,
        index: &ContentIndex,
        pages: &[PageDescriptor],
    ) -> Result<Vec<OutputDocument>> {
        pages
            .par_iter()
            .map(|page| self.render(index, page))
            .collect()
    }
}

fn lookup<'i>(
    index: &'i ContentIndex,
    id: &DocumentId,
    route: &str,
) -> Result<&'i PostRecord> {
    index.post(id).ok_or_else(|| Error::UnknownPost {
        id: id.clone(),
        route: route.to_owned(),
    })
}

fn summaries(index: &ContentIndex, ids: &[DocumentId], route: &str) -> Result<Value> {
    Ok(Value::Array(
        ids.iter()
            .map(|id| lookup(index, id, route).map(value::post_summary))
            .collect::<Result<Vec<Value>>>()?,
    ))
}

fn parse_template(name: &'static str, text: &str) -> Result<Template> {
    let mut template = Template::default();
    template
        .parse(text)
        .map_err(|err| Error::ParseTemplate {
            name,
            err: err.to_string(),
        })?;
    Ok(template)
}

fn execute(
    name: &'static str,
    template: &Template,
    route: &str,
    data: Value,
) -> Result<String> {
    let failed = |err: String| Error::ExecuteTemplate {
        name,
        route: route.to_owned(),
        err,
    };
    let context = Context::from(data).map_err(|err| failed(err.to_string()))?;
    let mut out: Vec<u8> = Vec::new();
    template
        .execute(&mut out, &context)
        .map_err(|err| failed(err.to_string()))?;
    String::from_utf8(out).map_err(|err| failed(err.to_string()))
}

/// Represents the result of a rendering operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error rendering a page. None of these occur with the built-in
/// theme and an index-consistent page list.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O problems while reading theme override files.
    OpenTemplateFile { path: PathBuf, err: io::Error },

    /// Returned when a template doesn't parse.
    ParseTemplate { name: &'static str, err: String },

    /// Returned when a template fails while rendering a page.
    ExecuteTemplate {
        name: &'static str,
        route: String,
        err: String,
    },

    /// Returned when a page references a post that isn't in the index.
    UnknownPost { id: DocumentId, route: String },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OpenTemplateFile { path, err } => {
                write!(f, "opening template file `{}`: {}", path.display(), err)
            }
            Error::ParseTemplate { name, err } => {
                write!(f, "parsing template `{}`: {}", name, err)
            }
            Error::ExecuteTemplate { name, route, err } => write!(
                f,
                "rendering `{}` with template `{}`: {}",
                route, name, err
            ),
            Error::UnknownPost { id, route } => {
                write!(f, "page `{}` references unknown post `{}`", route, id)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::OpenTemplateFile { path: _, err } => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{index::test::scenario, page::resolve};
    use url::Url;

    fn site() -> SiteConfig {
        let mut site =
            SiteConfig::new("My Blog", Url::parse("https://example.org/").unwrap());
        site.tagline = Some(String::from("On Humans, Javascript, and Tech"));
        site
    }

    fn render_scenario() -> Result<Vec<OutputDocument>> {
        let site = site();
        let index = ContentIndex::build(scenario()).unwrap();
        let renderer = Renderer::new(&site, &Theme::default())?;
        renderer.render_all(&index, &resolve(&index))
    }

    fn page<'a>(docs: &'a [OutputDocument], route: &str) -> &'a str {
        &docs
            .iter()
            .find(|d| d.route_path == route)
            .unwrap_or_else(|| panic!("no page at {}", route))
            .html
    }

    #[test]
    fn test_layout() -> Result<()> {
        let docs = render_scenario()?;
        assert_eq!(7, docs.len());
        let home = page(&docs, "/");
        assert!(home.contains("<title>My Blog</title>"));
        assert!(home.contains(r#"<link rel="canonical" href="https://example.org/">"#));
        assert!(home.contains("On Humans, Javascript, and Tech"));
        assert!(home.contains(r#"<li><a href="/tags">Tags</a></li>"#));
        assert!(home.contains(r#"<meta property="og:type" content="website">"#));
        assert!(home.contains(r#"<link rel="stylesheet" href="/index.css">"#));
        Ok(())
    }

    #[test]
    fn test_stylesheets() -> Result<()> {
        let index = ContentIndex::build(scenario()).unwrap();
        let home = resolve(&index).remove(0);

        let mut site = site();
        site.stylesheets = vec![String::from("/a.css"), String::from("/b.css")];
        let html = Renderer::new(&site, &Theme::default())?.render(&index, &home)?.html;
        let a = html.find(r#"<link rel="stylesheet" href="/a.css">"#).unwrap();
        let b = html.find(r#"<link rel="stylesheet" href="/b.css">"#).unwrap();
        assert!(a < b);

        site.stylesheets.clear();
        let html = Renderer::new(&site, &Theme::default())?.render(&index, &home)?.html;
        assert!(!html.contains("rel=\"stylesheet\""));
        Ok(())
    }

    #[test]
    fn test_home_lists_dated_posts_newest_first() -> Result<()> {
        let docs = render_scenario()?;
        let home = page(&docs, "/");
        let b = home.find(r#"<a href="/b">B (February 01, 2024)</a>"#).unwrap();
        let a = home.find(r#"<a href="/a">A (January 01, 2024)</a>"#).unwrap();
        assert!(b < a);
        assert!(!home.contains(r#"href="/c""#));
        assert!(home.contains("<blockquote>About b.</blockquote>"));
        Ok(())
    }

    #[test]
    fn test_post_page() -> Result<()> {
        let docs = render_scenario()?;
        let post = page(&docs, "/b");
        assert!(post.contains("<title>B | My Blog</title>"));
        assert!(post.contains("<h1>B</h1>"));
        assert!(post.contains("<h2>February 01, 2024</h2>"));
        assert!(post.contains("<p>About b.</p>"));
        assert!(post.contains(r#"<meta property="og:type" content="article">"#));
        assert!(post.contains(r#""datePublished":"2024-02-01""#));
        assert!(post.contains(r#"<a class="tag" href="/tags/tech/">#tech</a>"#));
        Ok(())
    }

    #[test]
    fn test_undated_post_page_omits_date() -> Result<()> {
        let docs = render_scenario()?;
        let post = page(&docs, "/c");
        assert!(post.contains("<h1>C</h1>"));
        assert!(!post.contains("<h2>"));
        assert!(!post.contains("datePublished"));
        Ok(())
    }

    #[test]
    fn test_tag_pages() -> Result<()> {
        let docs = render_scenario()?;
        let tags = page(&docs, "/tags");
        assert!(tags.contains(r#"<li><a href="/tags/js/">js (2)</a></li>"#));
        assert!(tags.contains(r#"<li><a href="/tags/tech/">tech (2)</a></li>"#));

        let tech = page(&docs, "/tags/tech/");
        assert!(tech.contains("<title>Posts tagged #tech | My Blog</title>"));
        let b = tech.find(r#"href="/b""#).unwrap();
        let c = tech.find(r#"href="/c""#).unwrap();
        assert!(b < c);
        Ok(())
    }

    #[test]
    fn test_unknown_post() {
        let site = site();
        let index = ContentIndex::build(scenario()).unwrap();
        let renderer = Renderer::new(&site, &Theme::default()).unwrap();
        let result = renderer.render(
            &index,
            &PageDescriptor {
                route_path: String::from("/ghost"),
                bound_data: BoundData::Post {
                    post: DocumentId::new("ghost"),
                },
            },
        );
        match result {
            Err(Error::UnknownPost { id, route }) => {
                assert_eq!(DocumentId::new("ghost"), id);
                assert_eq!("/ghost", route);
            }
            other => panic!("wanted UnknownPost; found {:?}", other),
        }
    }

    #[test]
    fn test_theme_override() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tags.html"), "{{ range .tags }}[{{ .name }}]{{ end }}")
            .unwrap();
        let theme = Theme::load(dir.path())?;
        assert_eq!(Theme::default().layout, theme.layout);

        let site = site();
        let index = ContentIndex::build(scenario()).unwrap();
        let renderer = Renderer::new(&site, &theme)?;
        let tags = resolve(&index)
            .into_iter()
            .find(|p| p.route_path == "/tags")
            .unwrap();
        assert!(renderer.render(&index, &tags)?.html.contains("[js][tech]"));
        Ok(())
    }

    #[test]
    fn test_renderer_is_reused() -> Result<()> {
        fn shared<T: Sync>(_: &T) {}

        let site = site();
        let index = ContentIndex::build(scenario()).unwrap();
        let renderer = Renderer::new(&site, &Theme::default())?;
        shared(&renderer);
        let pages = resolve(&index);
        assert_eq!(
            renderer.render_all(&index, &pages)?,
            renderer.render_all(&index, &pages)?
        );
        Ok(())
    }

    #[test]
    fn test_invalid_template() {
        let mut theme = Theme::default();
        theme.home = String::from("{{ range .posts }}");
        let site = site();
        match Renderer::new(&site, &theme) {
            Err(Error::ParseTemplate { name, err: _ }) => assert_eq!(HOME_TEMPLATE, name),
            Err(other) => panic!("wanted ParseTemplate; found {:?}", other),
            Ok(_) => panic!("wanted ParseTemplate; found a renderer"),
        }
    }
}
