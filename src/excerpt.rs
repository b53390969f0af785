//! Derives post summaries from the plain text of a post body (see
//! [`crate::markdown::MarkupRenderer::to_text`]).

/// The default character budget for excerpts.
pub const DEFAULT_EXCERPT_LENGTH: usize = 250;

const ELLIPSIS: char = '…';

/// Truncates the plain `text` of a post body to at most `budget` characters.
/// See [`truncate`].
pub fn excerpt(text: &str, budget: usize) -> String {
    truncate(text.trim(), budget)
}

/// Truncates `text` to at most `budget` characters (not bytes). Text that
/// already fits is returned unchanged. Otherwise the text is cut at the last
/// word boundary which leaves room for a trailing ellipsis; a single word
/// longer than the budget is cut mid-word since there's no boundary to use.
pub fn truncate(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_owned();
    }
    if budget == 0 {
        return String::new();
    }

    let limit = budget - 1;
    let end = text
        .char_indices()
        .nth(limit)
        .map_or(text.len(), |(i, _)| i);
    let head = &text[..end];
    let cut = if text[end..].starts_with(char::is_whitespace) {
        head
    } else {
        match head.rfind(char::is_whitespace) {
            Some(i) => &head[..i],
            None => head,
        }
    };

    let mut out = cut.trim_end().to_owned();
    out.push(ELLIPSIS);
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_short_text_is_unchanged() {
        assert_eq!("short text", truncate("short text", 250));
        assert_eq!("exactly", truncate("exactly", 7));
    }

    #[test]
    fn test_truncate_on_word_boundary() {
        let text = "lorem ipsum dolor sit amet ".repeat(40);
        let text = text.trim_end();
        assert_eq!(1079, text.chars().count());

        let excerpt = truncate(text, DEFAULT_EXCERPT_LENGTH);
        assert!(excerpt.chars().count() <= DEFAULT_EXCERPT_LENGTH);
        assert!(excerpt.ends_with(ELLIPSIS));

        let kept = excerpt.trim_end_matches(ELLIPSIS);
        assert!(text.starts_with(kept));
        assert!(text[kept.len()..].starts_with(' '));
    }

    #[test]
    fn test_truncate_1000_plain_characters() {
        let words = "abcdefghi ".repeat(100);
        assert_eq!(1000, words.chars().count());

        let excerpt = truncate(&words, 250);
        assert!(excerpt.chars().count() <= 250);
        assert_eq!(format!("{}…", "abcdefghi ".repeat(25).trim_end()), excerpt);
    }

    #[test]
    fn test_truncate_without_boundary() {
        let word = "x".repeat(300);
        let excerpt = truncate(&word, 10);
        assert_eq!(format!("{}…", "x".repeat(9)), excerpt);
    }

    #[test]
    fn test_truncate_counts_characters() {
        let text = "ééééé ééééé ééééé";
        let excerpt = truncate(text, 8);
        assert_eq!("ééééé…", excerpt);
    }

    #[test]
    fn test_truncate_zero_budget() {
        assert_eq!("", truncate("anything", 0));
    }

    #[test]
    fn test_excerpt() {
        assert_eq!(
            "One two…",
            excerpt("One two three", 9)
        );
    }
}
