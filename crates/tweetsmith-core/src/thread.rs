//! Splits long posts into numbered, platform-sized thread fragments.
//!
//! Packing is greedy over sentences, falling back to words for sentences that
//! do not fit on their own. The trailing hashtag run is lifted off before
//! packing and re-attached to the final fragment only, or given a trailing
//! fragment of their own when the final one has no room left. Every fragment
//! of a multi-part thread gets an ` (i/n)` suffix.

use std::sync::LazyLock;

use regex::Regex;

use crate::hashtags::{char_len, split_trailing_hashtags};

/// Characters held back on every fragment for the ` (i/n)` suffix.
pub const NUMBERING_RESERVE: usize = 10;

/// Smallest room the final sentence must keep before hashtags are dropped.
pub const MIN_MAIN_TEXT: usize = 15;

/// Sentence terminator followed by whitespace and an uppercase letter.
static SENTENCE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+\p{Lu}").expect("valid sentence break regex"));

/// Split `text` into fragments of at most `limit` characters.
///
/// Text already within the limit is returned unchanged as a single fragment.
/// A single word longer than the available room is emitted as its own
/// fragment and is the only way a fragment can exceed `limit`.
#[must_use]
pub fn split_into_thread(text: &str, limit: usize) -> Vec<String> {
    if char_len(text) <= limit {
        return vec![text.to_string()];
    }

    let (body, hashtags) = split_trailing_hashtags(text.trim());
    let sentences = split_sentences(body);

    let room = limit.saturating_sub(NUMBERING_RESERVE).max(1);
    let mut suffix = hashtags.map(|tags| format!(" {tags}")).unwrap_or_default();
    if !suffix.is_empty() && room.saturating_sub(char_len(&suffix)) < MIN_MAIN_TEXT {
        tracing::debug!(
            limit,
            hashtags = suffix.trim(),
            "hashtags would starve the final fragment; dropping them"
        );
        suffix.clear();
    }
    let last_room = room.saturating_sub(char_len(&suffix)).max(1);

    let mut packer = Packer::default();
    let last_index = sentences.len().saturating_sub(1);
    for (i, sentence) in sentences.iter().enumerate() {
        let available = if i == last_index { last_room } else { room };
        if char_len(sentence) <= available {
            packer.push(sentence, available);
        } else {
            for word in sentence.split_whitespace() {
                packer.push(word, available);
            }
        }
    }
    let mut fragments = packer.finish();

    if fragments.is_empty() {
        fragments.push(String::new());
    }
    if !suffix.is_empty() {
        let fits = fragments
            .last()
            .is_some_and(|last| char_len(last) + char_len(&suffix) <= room);
        match fragments.last_mut() {
            Some(last) if fits => {
                last.push_str(&suffix);
                if last.starts_with(' ') {
                    *last = last.trim_start().to_string();
                }
            }
            // The final word opened a fresh fragment with no room left for tags.
            _ => fragments.push(suffix.trim_start().to_string()),
        }
    }

    let total = fragments.len();
    if total > 1 {
        for (i, fragment) in fragments.iter_mut().enumerate() {
            fragment.push_str(&format!(" ({}/{total})", i + 1));
        }
    }
    fragments
}

/// Break `text` into sentences, keeping terminators attached.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for m in SENTENCE_BREAK.find_iter(text) {
        // The match is `<punct><ws><Upper>`; the sentence ends after the
        // one-byte punctuation and the next begins at the uppercase letter.
        let end = m.start() + 1;
        let next = m.end() - m.as_str().chars().last().map_or(0, char::len_utf8);
        let sentence = text[start..end].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = next;
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

/// Greedy fragment accumulator.
#[derive(Default)]
struct Packer {
    fragments: Vec<String>,
    buffer: String,
}

impl Packer {
    fn push(&mut self, unit: &str, available: usize) {
        if self.buffer.is_empty() {
            self.buffer.push_str(unit);
            return;
        }
        if char_len(&self.buffer) + 1 + char_len(unit) <= available {
            self.buffer.push(' ');
            self.buffer.push_str(unit);
        } else {
            self.fragments.push(std::mem::take(&mut self.buffer));
            self.buffer.push_str(unit);
        }
    }

    fn finish(mut self) -> Vec<String> {
        if !self.buffer.is_empty() {
            self.fragments.push(self.buffer);
        }
        self.fragments
    }
}

#[cfg(test)]
#[path = "thread_test.rs"]
mod tests;
