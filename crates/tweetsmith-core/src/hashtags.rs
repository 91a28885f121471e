//! Hashtag-aware text helpers shared by the splitter and content post-processing.

use std::sync::LazyLock;

use regex::Regex;

/// One or more whitespace-preceded `#word` tokens anchored at the end of the text.
static TRAILING_HASHTAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\s+#\w+)+\s*$").expect("valid trailing hashtag regex"));

/// Separate a trailing hashtag run from the body of `text`.
///
/// Returns the body (right-trimmed) and the hashtags as a single
/// space-separated string, e.g. `("Be humble.", Some("#Wisdom #Growth"))`.
/// Hashtags that appear mid-sentence are left in the body.
#[must_use]
pub fn split_trailing_hashtags(text: &str) -> (&str, Option<&str>) {
    match TRAILING_HASHTAGS.find(text) {
        Some(m) => (text[..m.start()].trim_end(), Some(m.as_str().trim())),
        None => (text.trim_end(), None),
    }
}

/// Remove every `#tag` word, collapsing whitespace. Used for image prompts
/// and image captions.
#[must_use]
pub fn strip_hashtags(text: &str) -> String {
    text.split_whitespace()
        .filter(|word| !word.starts_with('#'))
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Cut `s` to at most `max_chars` characters without splitting a word.
///
/// If the cut would land inside the first word, the hard prefix is returned.
pub(crate) fn cut_at_word_boundary(s: &str, max_chars: usize) -> &str {
    let Some((byte_end, next)) = s.char_indices().nth(max_chars) else {
        return s;
    };
    let prefix = &s[..byte_end];
    if next.is_whitespace() {
        return prefix.trim_end();
    }
    match prefix.rfind(char::is_whitespace) {
        Some(idx) => prefix[..idx].trim_end(),
        None => prefix,
    }
}

/// Bound `text` to `max_chars`, keeping the trailing hashtags when possible.
///
/// When the text has trailing hashtags and more than `min_body_chars` remain
/// for the body after reserving room for them, the body is cut at a word
/// boundary and the hashtags re-attached. Otherwise the whole text is cut at a
/// word boundary and `...` appended, still within `max_chars`.
#[must_use]
pub fn truncate_preserving_hashtags(text: &str, max_chars: usize, min_body_chars: usize) -> String {
    if char_len(text) <= max_chars {
        return text.to_string();
    }

    if let (body, Some(tags)) = split_trailing_hashtags(text) {
        let available = max_chars.saturating_sub(char_len(tags) + 1);
        if available > min_body_chars {
            let body = cut_at_word_boundary(body, available);
            return format!("{body} {tags}");
        }
    }

    let cut = cut_at_word_boundary(text, max_chars.saturating_sub(3));
    format!("{cut}...")
}
