//! The markup-rendering collaborator. The pipeline only depends on the
//! [`MarkupRenderer`] trait; [`Markdown`] is the implementation the site
//! builds with.

use pulldown_cmark::{html, Event, Options, Parser, Tag};

/// Converts a document body into HTML. Implementations must be deterministic:
/// the same input always renders to the same output.
pub trait MarkupRenderer: Sync {
    fn to_html(&self, raw_body: &str) -> String;

    /// The body's readable text with all markup removed and runs of whitespace
    /// collapsed, for excerpts. Raw HTML (including the contents of `<script>`
    /// and `<style>` elements) contributes nothing.
    fn to_text(&self, raw_body: &str) -> String;
}

/// Elements whose contents are never readable text.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Renders CommonMark (plus footnotes, tables, strikethrough, task lists, and
/// smart punctuation) with [`pulldown_cmark`].
pub struct Markdown {
    /// The number of levels to demote the body's headings by.
    heading_offset: u32,
}

impl Markdown {
    /// Constructs a renderer which demotes headings by `heading_offset`
    /// levels. Headings never go below `<h6>`.
    pub fn with_heading_offset(heading_offset: u32) -> Markdown {
        Markdown { heading_offset }
    }

    fn convert_tag<'a>(&self, tag: Tag<'a>) -> Tag<'a> {
        match tag {
            // The post page renders the post title as an `<h1>`, so the
            // body's headings are shifted to stay subordinate to it.
            Tag::Heading(level) => {
                Tag::Heading((level + self.heading_offset).min(6))
            }
            _ => tag,
        }
    }

    fn convert<'a>(&self, ev: Event<'a>) -> Event<'a> {
        match ev {
            Event::Start(tag) => Event::Start(self.convert_tag(tag)),
            Event::End(tag) => Event::End(self.convert_tag(tag)),
            _ => ev,
        }
    }
}

impl Default for Markdown {
    fn default() -> Markdown {
        Markdown::with_heading_offset(1)
    }
}

impl MarkupRenderer for Markdown {
    fn to_html(&self, raw_body: &str) -> String {
        let mut out = String::with_capacity(raw_body.len() * 3 / 2);
        html::push_html(
            &mut out,
            Parser::new_ext(raw_body, options()).map(|ev| self.convert(ev)),
        );
        out
    }

    fn to_text(&self, raw_body: &str) -> String {
        let mut text = String::with_capacity(raw_body.len());
        let mut raw_depth = 0;
        for ev in Parser::new_ext(raw_body, options()) {
            match ev {
                Event::Html(html) => raw_depth = raw_text_depth(raw_depth, &html),
                _ if raw_depth > 0 => {}
                Event::Text(s) | Event::Code(s) => text.push_str(&s),
                Event::SoftBreak | Event::HardBreak | Event::Rule => text.push(' '),
                Event::End(Tag::Emphasis)
                | Event::End(Tag::Strong)
                | Event::End(Tag::Strikethrough)
                | Event::End(Tag::Link(..))
                | Event::End(Tag::Image(..)) => {}
                // Block boundaries separate words.
                Event::End(_) => text.push(' '),
                _ => {}
            }
        }
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options
}

/// Tracks how many `<script>`/`<style>` elements are open after a raw HTML
/// fragment. A block of raw HTML usually opens and closes its element in one
/// fragment; inline HTML opens and closes in separate fragments with text
/// events in between.
fn raw_text_depth(depth: usize, html: &str) -> usize {
    let html = html.to_ascii_lowercase();
    RAW_TEXT_ELEMENTS.iter().fold(depth, |depth, name| {
        let opened = html.matches(&format!("<{}", name)).count();
        let closed = html.matches(&format!("</{}", name)).count();
        (depth + opened).saturating_sub(closed)
    })
}
