//! Sentence segmentation over normalized text.
//!
//! Boundary candidates come from `sakurs-core`'s English rules. Its abbreviation table treats a
//! few tokens that also work as ordinary words (`No.`, `Dec.`, `St.`, single capitals) as
//! abbreviations everywhere, so those are split again when a capitalized word follows.

use sakurs_core::{Input, SentenceProcessor};

/// Abbreviations that also end sentences as plain words.
const ORDINARY_WORD_ABBREVIATIONS: &[&str] = &[
    "no", "nos", "st", "mt", "co", "vol", "ch", "sec", "fig", "ref", "gen", "col", "rep", "jan",
    "feb", "mar", "apr", "aug", "sep", "sept", "oct", "nov", "dec",
];

/// Split `text` into trimmed, non-empty sentences.
///
/// A boundary sits after a run of `.`, `?` or `!` that is followed by whitespace or the end of
/// the text. Text without terminal punctuation comes back as a single sentence.
pub fn segment(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut sentences = Vec::new();
    let mut start = 0;
    for end in detected_boundaries(text) {
        if end <= start || !ends_at_gap(text, end) {
            continue;
        }
        split_ordinary_abbreviations(&text[start..end], &mut sentences);
        start = end;
    }
    split_ordinary_abbreviations(&text[start..], &mut sentences);
    sentences
}

fn detected_boundaries(text: &str) -> Vec<usize> {
    let output = SentenceProcessor::with_language("en")
        .and_then(|processor| processor.process(Input::from_text(text)));
    match output {
        Ok(output) => {
            let mut offsets: Vec<usize> = output
                .boundaries
                .into_iter()
                .map(|boundary| boundary.offset)
                .collect();
            offsets.sort_unstable();
            offsets.dedup();
            offsets
        }
        Err(error) => {
            tracing::warn!(%error, "Sentence detection failed; keeping text as one sentence");
            Vec::new()
        }
    }
}

/// Whether a boundary at byte `end` is followed by whitespace or the end of `text`.
fn ends_at_gap(text: &str, end: usize) -> bool {
    text.is_char_boundary(end)
        && text[end..]
            .chars()
            .next()
            .is_none_or(char::is_whitespace)
}

fn split_ordinary_abbreviations(span: &str, sentences: &mut Vec<String>) {
    let mut start = 0;
    for (index, _) in span.match_indices('.') {
        let end = index + 1;
        if index < start || !ends_at_gap(span, end) {
            continue;
        }
        let before = &span[start..index];
        if before.ends_with(['.', '?', '!']) || !is_ordinary_word_abbreviation(before) {
            continue;
        }
        let next_is_capitalized = span[end..]
            .trim_start()
            .chars()
            .next()
            .is_some_and(char::is_uppercase);
        if next_is_capitalized {
            push_sentence(&span[start..end], sentences);
            start = end;
        }
    }
    push_sentence(&span[start..], sentences);
}

fn is_ordinary_word_abbreviation(before: &str) -> bool {
    let word = before.rsplit(char::is_whitespace).next().unwrap_or_default();
    let mut chars = word.chars();
    if let (Some(first), None) = (chars.next(), chars.next()) {
        return first.is_ascii_uppercase();
    }
    let lowered = word.to_ascii_lowercase();
    ORDINARY_WORD_ABBREVIATIONS.contains(&lowered.as_str())
}

fn push_sentence(piece: &str, sentences: &mut Vec<String>) {
    let trimmed = piece.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn splits_simple_sentences() {
        let text = "Alpha works well. Beta fails rarely. Gamma ships today.";
        assert_eq!(
            segment(text),
            vec!["Alpha works well.", "Beta fails rarely.", "Gamma ships today."]
        );
    }

    #[test]
    fn mixed_terminal_runs_end_one_sentence() {
        assert_eq!(segment("What!? Really?"), vec!["What!?", "Really?"]);
        assert_eq!(
            segment("It's great. Don't worry."),
            vec!["It's great.", "Don't worry."]
        );
    }

    #[test]
    fn abbreviations_before_lowercase_words_stay_inside_the_sentence() {
        let text = "Dr. Smith works at Apple Inc. and lives on Main St. in the city.";
        assert_eq!(segment(text), vec![text]);
        assert_eq!(
            segment("Shipped in Dec. and sold out."),
            vec!["Shipped in Dec. and sold out."]
        );
    }

    #[test]
    fn ordinary_word_abbreviations_split_before_capitalized_words() {
        let cases = [
            ("He answered No. Then he left.", "He answered No.", "Then he left."),
            ("Shipped in Dec. Sales rose.", "Shipped in Dec.", "Sales rose."),
            (
                "They live on Main St. The garden is big.",
                "They live on Main St.",
                "The garden is big.",
            ),
            (
                "It started after World War I. It ended badly.",
                "It started after World War I.",
                "It ended badly.",
            ),
            ("Choose plan B. It works.", "Choose plan B.", "It works."),
        ];
        for (text, first, second) in cases {
            assert_eq!(segment(text), vec![first, second], "input: {text}");
        }
    }

    #[test]
    fn titles_do_not_split_before_names() {
        assert_eq!(
            segment("Mr. Jones met Dr. Smith. They talked."),
            vec!["Mr. Jones met Dr. Smith.", "They talked."]
        );
    }

    #[test]
    fn blank_text_has_no_sentences() {
        assert!(segment("").is_empty());
        assert!(segment("   \t ").is_empty());
        assert_eq!(
            segment("no terminal punctuation"),
            vec!["no terminal punctuation"]
        );
    }

    proptest! {
        #[test]
        fn segmentation_preserves_every_word(text in "[a-zA-Z0-9 .?!]{0,200}") {
            let sentences = segment(&text);
            for sentence in &sentences {
                prop_assert!(!sentence.is_empty());
                prop_assert_eq!(sentence.trim(), sentence.as_str());
            }
            let rejoined = sentences.join(" ");
            let expected: Vec<&str> = text.split_whitespace().collect();
            let actual: Vec<&str> = rejoined.split_whitespace().collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
