//! Sentence-aligned chunk packing and length metrics.
//!
//! Backends measure their input differently, so the packer never hard-codes a metric:
//!
//! - `Characters`: Unicode scalar count, suited to hosted chat APIs with generous windows.
//! - `Words`: whitespace token count, the usual budget for local summarization models.
//! - `Tokens`: `cl100k_base` BPE tokens via `tiktoken-rs` for exact OpenAI budgets.
//!
//! Sentences are never split. A sentence longer than the bound becomes its own oversized
//! chunk and backends are expected to cope with it.

use std::sync::Arc;
use tiktoken_rs::cl100k_base;

use super::normalize::{Stopwords, normalize};
use super::segment::segment;
use super::types::{Chunk, ChunkingError, ValidationError};

/// Shared length function used by the packer.
pub type LengthFn = Arc<dyn Fn(&str) -> usize + Send + Sync>;

const TOKEN_ENCODING: &str = "cl100k_base";

/// How chunk length is measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LengthMetric {
    /// Count Unicode scalar values.
    Characters,
    /// Count whitespace-separated words.
    Words,
    /// Count BPE tokens.
    Tokens,
}

impl LengthMetric {
    /// Build the length function for this metric.
    pub fn counter(self) -> Result<LengthFn, ChunkingError> {
        match self {
            Self::Characters => Ok(Arc::new(|segment: &str| segment.chars().count())),
            Self::Words => Ok(Arc::new(|segment: &str| segment.split_whitespace().count())),
            Self::Tokens => build_token_counter(),
        }
    }
}

impl std::str::FromStr for LengthMetric {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chars" | "characters" => Ok(Self::Characters),
            "words" => Ok(Self::Words),
            "tokens" => Ok(Self::Tokens),
            other => Err(ValidationError::InvalidLengthMetric(other.to_string())),
        }
    }
}

fn build_token_counter() -> Result<LengthFn, ChunkingError> {
    let encoding = cl100k_base().map_err(|source| ChunkingError::Tokenizer {
        encoding: TOKEN_ENCODING.to_string(),
        source,
    })?;
    let encoding = Arc::new(encoding);
    Ok(Arc::new(move |segment: &str| {
        encoding.encode_ordinary(segment).len()
    }))
}

/// Greedily pack whole sentences into chunks bounded by `max_len`.
///
/// A sentence joins the open chunk when the joined text still measures `<= max_len`;
/// otherwise the open chunk is closed and the sentence starts a new one. Blank sentences are
/// skipped. The returned chunks are numbered in source order and are never empty.
pub fn pack(sentences: &[String], max_len: usize, len_fn: &dyn Fn(&str) -> usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut buffer = String::new();
    let mut members: Vec<String> = Vec::new();

    for sentence in sentences {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            continue;
        }

        if members.is_empty() {
            buffer.push_str(sentence);
            members.push(sentence.to_string());
            continue;
        }

        let candidate = format!("{buffer} {sentence}");
        if len_fn(&candidate) <= max_len {
            buffer = candidate;
            members.push(sentence.to_string());
        } else {
            close_chunk(&mut chunks, &mut buffer, &mut members);
            buffer.push_str(sentence);
            members.push(sentence.to_string());
        }
    }

    if !members.is_empty() {
        close_chunk(&mut chunks, &mut buffer, &mut members);
    }

    chunks
}

fn close_chunk(chunks: &mut Vec<Chunk>, buffer: &mut String, members: &mut Vec<String>) {
    chunks.push(Chunk {
        index: chunks.len(),
        sentences: std::mem::take(members),
        text: std::mem::take(buffer).trim_end().to_string(),
    });
}

/// Normalize, segment, and pack raw text in one pass.
///
/// Returns an empty vector when nothing survives normalization.
pub fn chunk_text(
    raw_text: &str,
    stopwords: &Stopwords,
    max_len: usize,
    len_fn: &dyn Fn(&str) -> usize,
) -> Vec<Chunk> {
    let normalized = normalize(raw_text, stopwords);
    let sentences = segment(&normalized);
    pack(&sentences, max_len, len_fn)
}
