//! Noise stripping applied to raw text before segmentation.
//!
//! Each rule rewrites the whole string before the next one runs. Bracket removal must come
//! before punctuation stripping, otherwise the bracket characters would disappear while their
//! contents stayed behind.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static SQUARE_BRACKETS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*?\]").expect("square bracket pattern is valid"));
static PARENTHESES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(.*?\)").expect("parenthesis pattern is valid"));
static ANGLE_BRACKETS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<.*?>").expect("angle bracket pattern is valid"));
static LINE_BREAKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\r\n]+").expect("line break pattern is valid"));
static NON_SENTENCE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s.?!]").expect("punctuation pattern is valid"));

/// Case-sensitive set of tokens elided during normalization.
#[derive(Debug, Clone, Default)]
pub struct Stopwords {
    words: HashSet<String>,
}

impl Stopwords {
    /// NLTK's English stopword list.
    pub fn english() -> Self {
        Self::from_words(
            stop_words::get(stop_words::LANGUAGE::English)
                .iter()
                .map(|word| word.to_string()),
        )
    }

    /// A set that removes nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a set from arbitrary words. Matching stays case-sensitive.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `token` is elided.
    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    /// Number of words in the set.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Strip citations, asides, markup, stray symbols, non-ASCII and stopwords from `text`.
///
/// Returns an empty string for blank input. Running the function on its own output is a no-op.
pub fn normalize(text: &str, stopwords: &Stopwords) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let cleaned = SQUARE_BRACKETS.replace_all(text, "");
    let cleaned = PARENTHESES.replace_all(&cleaned, "");
    let cleaned = ANGLE_BRACKETS.replace_all(&cleaned, "");
    let cleaned = LINE_BREAKS.replace_all(&cleaned, " ");
    let cleaned = NON_SENTENCE_CHARS.replace_all(&cleaned, "");
    let cleaned: String = cleaned.chars().filter(char::is_ascii).collect();

    cleaned
        .split_whitespace()
        .filter(|token| !stopwords.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}
