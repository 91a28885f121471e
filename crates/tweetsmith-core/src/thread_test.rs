use super::*;
use crate::hashtags::char_len;

/// Remove the ` (i/n)` suffix from fragment `i` (0-based) of `n`.
fn strip_numbering(fragment: &str, i: usize, n: usize) -> &str {
    let suffix = format!(" ({}/{n})", i + 1);
    fragment
        .strip_suffix(&suffix)
        .unwrap_or_else(|| panic!("fragment {i} missing {suffix:?}: {fragment:?}"))
}

#[test]
fn short_text_is_returned_unchanged() {
    assert_eq!(split_into_thread("Hello world.", 280), vec!["Hello world."]);
}

#[test]
fn text_exactly_at_limit_is_identity() {
    let text = "a".repeat(40);
    assert_eq!(split_into_thread(&text, 40), vec![text.clone()]);
}

#[test]
fn length_is_measured_in_characters() {
    // 10 characters, 40 bytes.
    let text = "🌊".repeat(10);
    assert_eq!(split_into_thread(&text, 10), vec![text.clone()]);
}

#[test]
fn splits_sentences_and_keeps_hashtags_on_last_fragment() {
    let parts = split_into_thread(
        "Sentence one. Sentence two. Sentence three. #Tag1 #Tag2",
        40,
    );
    assert_eq!(
        parts,
        vec![
            "Sentence one. Sentence two. (1/2)",
            "Sentence three. #Tag1 #Tag2 (2/2)",
        ]
    );
}

#[test]
fn text_without_punctuation_is_packed_by_words() {
    let text = vec!["lorem"; 40].join(" ");
    let parts = split_into_thread(&text, 50);

    // room is 40: six five-letter words per fragment.
    assert_eq!(parts.len(), 7);
    let n = parts.len();
    for (i, part) in parts.iter().enumerate() {
        assert!(char_len(part) <= 50, "fragment too long: {part:?}");
        let body = strip_numbering(part, i, n);
        assert!(body.split_whitespace().all(|w| w == "lorem"), "{part:?}");
    }
}

#[test]
fn fragments_reconstruct_the_original_body() {
    let text = "The river remembers every stone it has passed. Nobody asked it to. \
                It simply keeps the shape of what it touched, and carries it downstream to the sea. \
                That is memory! Is it a burden? Only if you stop flowing. #Nature #Memory";
    let parts = split_into_thread(text, 60);
    let n = parts.len();
    assert!(n > 1);

    let mut bodies = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        assert!(char_len(part) <= 60, "fragment too long: {part:?}");
        let mut body = strip_numbering(part, i, n);
        if i == n - 1 {
            body = body
                .strip_suffix(" #Nature #Memory")
                .unwrap_or_else(|| panic!("last fragment lost hashtags: {part:?}"));
        } else {
            assert!(!body.contains('#'), "hashtags outside last fragment: {part:?}");
        }
        bodies.push(body);
    }

    let original_body = text.strip_suffix(" #Nature #Memory").unwrap();
    let expected = original_body.split_whitespace().collect::<Vec<_>>().join(" ");
    assert_eq!(bodies.join(" "), expected);
}

#[test]
fn single_fragment_after_splitting_gets_no_numbering() {
    // Over the limit only because of the whitespace before the tags.
    let text = format!("Brief.{}#Tag", " ".repeat(30));
    let parts = split_into_thread(&text, 30);
    assert_eq!(parts, vec!["Brief. #Tag"]);
}

#[test]
fn starving_hashtags_are_dropped() {
    let text = "Short sentence here. Another one follows it. \
                #VeryLongHashtagNumberOne #VeryLongHashtagNumberTwo";
    let parts = split_into_thread(text, 40);
    assert!(parts.len() > 1);
    for part in &parts {
        assert!(!part.contains('#'), "hashtags should be dropped: {part:?}");
        assert!(char_len(part) <= 40, "fragment too long: {part:?}");
    }
}

#[test]
fn hashtags_move_to_own_fragment_when_last_word_fills_it() {
    let parts = split_into_thread("Sentence one is here. Antidisestablishmentarian #Tag1 #Tag2", 40);
    assert_eq!(
        parts,
        vec![
            "Sentence one is here. (1/3)",
            "Antidisestablishmentarian (2/3)",
            "#Tag1 #Tag2 (3/3)",
        ]
    );
    for part in &parts {
        assert!(char_len(part) <= 40, "fragment too long: {part:?}");
    }
}

#[test]
fn oversize_word_becomes_its_own_fragment() {
    let parts = split_into_thread("Supercalifragilisticexpialidocious is long.", 20);
    assert_eq!(
        parts,
        vec![
            "Supercalifragilisticexpialidocious (1/2)",
            "is long. (2/2)",
        ]
    );
}

#[test]
fn splitting_is_deterministic() {
    let text = "One thing. Two things! Three things? Four things and more words here. #A #B";
    assert_eq!(split_into_thread(text, 30), split_into_thread(text, 30));
}

#[test]
fn sentence_breaks_need_uppercase_after_terminator() {
    assert_eq!(
        split_sentences("Use e.g. tea. It works! Does it? Yes."),
        vec!["Use e.g. tea.", "It works!", "Does it?", "Yes."]
    );
    assert_eq!(split_sentences("Pi is 3.14 today."), vec!["Pi is 3.14 today."]);
}
