//! Core data types and error definitions for the summarization pipeline.

use crate::config::ConfigError;
use crate::sources::SourceError;
use crate::summarization::BackendError;
use anyhow::Error as TokenizerError;
use serde::Serialize;
use thiserror::Error;

/// Input that was rejected before any backend call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Input normalized to zero sentences.
    #[error("empty input: nothing to summarize")]
    EmptyInput,
    /// Backend selector did not name a known variant.
    #[error("invalid summarization method '{0}' (expected 'remote' or 'local')")]
    InvalidMethod(String),
    /// Packing bound must be positive.
    #[error("max chunk length must be greater than zero")]
    InvalidChunkLength,
    /// Worker pool must hold at least one worker.
    #[error("concurrency must be greater than zero")]
    InvalidConcurrency,
    /// Length metric did not name a known variant.
    #[error("invalid length metric '{0}' (expected 'chars', 'words' or 'tokens')")]
    InvalidLengthMetric(String),
    /// Summary tone did not name a known variant.
    #[error("invalid summary tone '{0}' (expected 'general' or 'scientific')")]
    InvalidTone(String),
}

/// Errors produced while preparing the chunk length metric.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// Tokenizer resources were unavailable for the token metric.
    #[error("failed to initialize tokenizer '{encoding}': {source}")]
    Tokenizer {
        /// Encoding we attempted to load.
        encoding: String,
        /// Underlying error raised by the tokenizer library.
        #[source]
        source: TokenizerError,
    },
}

/// Errors surfaced by a summarization run.
#[derive(Debug, Error)]
pub enum SummarizeError {
    /// Input or options were rejected up front.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Backend could not be configured.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
    /// Length metric could not be built.
    #[error("Failed to prepare chunking: {0}")]
    Chunking(#[from] ChunkingError),
    /// A backend call failed fatally; the run was aborted.
    #[error("Chunk {index} failed: {source}")]
    Backend {
        /// Zero-based position of the failing chunk.
        index: usize,
        /// Error reported by the backend.
        #[source]
        source: BackendError,
    },
    /// Source adapter failed to produce text.
    #[error("Failed to read source: {0}")]
    Source(#[from] SourceError),
    /// The run was cancelled before every chunk completed.
    #[error("Summarization cancelled")]
    Cancelled,
    /// A worker task panicked or was torn down unexpectedly.
    #[error("Summarization worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Coarse classification of a [`SummarizeError`] for user-facing reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Invalid or empty input.
    Validation,
    /// Missing credential or bad settings.
    Configuration,
    /// Remote service rejected the credential.
    Authentication,
    /// Network or 5xx failure after retries.
    TransientService,
    /// Throttled after retries.
    RateLimit,
    /// Local model could not be loaded.
    ModelUnavailable,
    /// Backend failed while generating.
    Inference,
    /// Source adapter failure.
    Source,
    /// Run cancelled.
    Cancelled,
    /// Internal task failure.
    Internal,
}

impl SummarizeError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Configuration(_) | Self::Chunking(_) => ErrorKind::Configuration,
            Self::Backend { source, .. } => source.kind(),
            Self::Source(_) => ErrorKind::Source,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Worker(_) => ErrorKind::Internal,
        }
    }

    /// Position of the chunk that caused the failure, when one did.
    pub fn chunk_index(&self) -> Option<usize> {
        match self {
            Self::Backend { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// Sentence-aligned unit of text dispatched to a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based position within the chunk sequence.
    pub index: usize,
    /// Whole sentences packed into this chunk, in source order.
    pub sentences: Vec<String>,
    /// Sentences joined with single spaces.
    pub text: String,
}

/// Backend output for exactly one chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryFragment {
    /// Position of the chunk this fragment summarizes.
    pub index: usize,
    /// Text returned by the backend.
    pub text: String,
}

/// Result of a completed summarization run.
#[derive(Debug, Clone)]
pub struct SummaryOutcome {
    /// Fragments joined in chunk order.
    pub summary: String,
    /// Individual fragments, ordered by chunk index.
    pub fragments: Vec<SummaryFragment>,
    /// Number of chunks dispatched.
    pub chunk_count: usize,
}
