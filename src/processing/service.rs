//! Orchestrator coordinating chunking, backend dispatch, and reassembly.

use crate::{
    config::Config,
    metrics::{MetricsSnapshot, RunMetrics},
    processing::{
        bullets::to_bullets,
        cancel::CancelSignal,
        chunking::{LengthFn, chunk_text},
        normalize::Stopwords,
        types::{
            Chunk, ChunkingError, SummarizeError, SummaryFragment, SummaryOutcome,
            ValidationError,
        },
    },
    sources::SourceAdapter,
    summarization::{BackendError, SummaryBackend, build_backend},
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::{sync::Semaphore, task::JoinSet};

const DEFAULT_CONCURRENCY: usize = 4;

/// Chunking and scheduling knobs for a [`Summarizer`].
#[derive(Clone)]
pub struct SummarizerOptions {
    /// Packing bound measured with `length_fn`.
    pub max_chunk_length: usize,
    /// Length metric applied by the packer.
    pub length_fn: LengthFn,
    /// Maximum number of backend calls in flight.
    pub concurrency: usize,
    /// Tokens elided during normalization.
    pub stopwords: Stopwords,
}

impl SummarizerOptions {
    /// Options with the English stopword list and the default worker pool.
    pub fn new(max_chunk_length: usize, length_fn: LengthFn) -> Self {
        Self {
            max_chunk_length,
            length_fn,
            concurrency: DEFAULT_CONCURRENCY,
            stopwords: Stopwords::english(),
        }
    }

    /// Derive options from configuration.
    pub fn from_config(config: &Config) -> Result<Self, ChunkingError> {
        Ok(Self::new(config.max_chunk_length, config.length_metric.counter()?)
            .with_concurrency(config.concurrency))
    }

    /// Override the worker pool size.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Override the stopword list.
    pub fn with_stopwords(mut self, stopwords: Stopwords) -> Self {
        self.stopwords = stopwords;
        self
    }
}

/// Drives a full summarization run: normalize, segment, pack, dispatch, reassemble.
///
/// The summarizer only knows the [`SummaryBackend`] trait. Chunks are summarized concurrently
/// on a bounded pool and the fragments are reassembled by chunk index, so completion order
/// never leaks into the output. Any fatal backend error aborts the whole run.
pub struct Summarizer {
    backend: Arc<dyn SummaryBackend>,
    options: SummarizerOptions,
    metrics: Arc<RunMetrics>,
}

/// Abstraction over the summarizer used by external surfaces (HTTP, CLI).
#[async_trait]
pub trait SummarizeApi: Send + Sync {
    /// Summarize raw text into prose.
    async fn summarize(&self, raw_text: &str) -> Result<SummaryOutcome, SummarizeError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl Summarizer {
    /// Build a summarizer around an existing backend.
    pub fn new(
        backend: Arc<dyn SummaryBackend>,
        options: SummarizerOptions,
    ) -> Result<Self, SummarizeError> {
        if options.max_chunk_length == 0 {
            return Err(ValidationError::InvalidChunkLength.into());
        }
        if options.concurrency == 0 {
            return Err(ValidationError::InvalidConcurrency.into());
        }
        Ok(Self {
            backend,
            options,
            metrics: Arc::new(RunMetrics::new()),
        })
    }

    /// Build the configured backend and wrap it.
    ///
    /// Configuration problems such as a missing credential surface here, before any chunk is
    /// dispatched.
    pub fn from_config(config: &Config) -> Result<Self, SummarizeError> {
        let backend = build_backend(config)?;
        Self::new(backend, SummarizerOptions::from_config(config)?)
    }

    /// Normalize, segment, and pack `raw_text`.
    ///
    /// Fails with [`ValidationError::EmptyInput`] when no sentence survives normalization.
    pub fn prepare_chunks(&self, raw_text: &str) -> Result<Vec<Chunk>, SummarizeError> {
        let chunks = chunk_text(
            raw_text,
            &self.options.stopwords,
            self.options.max_chunk_length,
            self.options.length_fn.as_ref(),
        );
        if chunks.is_empty() {
            return Err(ValidationError::EmptyInput.into());
        }
        tracing::debug!(
            raw_chars = raw_text.len(),
            chunks = chunks.len(),
            max_chunk_length = self.options.max_chunk_length,
            "Prepared chunks"
        );
        Ok(chunks)
    }

    /// Summarize `raw_text`, returning the merged summary and its fragments.
    pub async fn summarize(&self, raw_text: &str) -> Result<SummaryOutcome, SummarizeError> {
        self.summarize_with_cancel(raw_text, &CancelSignal::new())
            .await
    }

    /// Summarize `raw_text`, aborting with [`SummarizeError::Cancelled`] when `cancel` fires.
    pub async fn summarize_with_cancel(
        &self,
        raw_text: &str,
        cancel: &CancelSignal,
    ) -> Result<SummaryOutcome, SummarizeError> {
        let result = self.execute(raw_text, cancel).await;
        match &result {
            Ok(outcome) => {
                self.metrics.record_summary(outcome.chunk_count as u64);
                tracing::info!(
                    backend = self.backend.name(),
                    chunks = outcome.chunk_count,
                    summary_chars = outcome.summary.len(),
                    "Summary complete"
                );
            }
            Err(error) => {
                self.metrics.record_failure();
                tracing::warn!(
                    backend = self.backend.name(),
                    kind = ?error.kind(),
                    chunk = error.chunk_index(),
                    error = %error,
                    "Summarization aborted"
                );
            }
        }
        result
    }

    /// Summarize `raw_text` and return only the merged prose.
    pub async fn run(&self, raw_text: &str) -> Result<String, SummarizeError> {
        Ok(self.summarize(raw_text).await?.summary)
    }

    /// Summarize `raw_text` and render the result as a bullet list.
    pub async fn run_bullets(&self, raw_text: &str) -> Result<String, SummarizeError> {
        Ok(to_bullets(&self.run(raw_text).await?))
    }

    /// Pull text from a source adapter and summarize it.
    ///
    /// A source that yields no text is reported as empty input.
    pub async fn summarize_source(
        &self,
        source: &dyn SourceAdapter,
        cancel: &CancelSignal,
    ) -> Result<SummaryOutcome, SummarizeError> {
        tracing::info!(source = %source.describe(), "Fetching source text");
        let raw_text = match source.fetch_text().await {
            Ok(Some(raw_text)) => raw_text,
            Ok(None) => {
                self.metrics.record_failure();
                return Err(ValidationError::EmptyInput.into());
            }
            Err(error) => {
                self.metrics.record_failure();
                tracing::warn!(source = %source.describe(), %error, "Source fetch failed");
                return Err(error.into());
            }
        };
        self.summarize_with_cancel(&raw_text, cancel).await
    }

    /// Return the current run metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    async fn execute(
        &self,
        raw_text: &str,
        cancel: &CancelSignal,
    ) -> Result<SummaryOutcome, SummarizeError> {
        let chunks = self.prepare_chunks(raw_text)?;
        let chunk_count = chunks.len();
        tracing::info!(
            backend = self.backend.name(),
            chunks = chunk_count,
            concurrency = self.options.concurrency,
            "Summarizing document"
        );

        let fragments = self.dispatch(chunks, cancel).await?;
        let summary = fragments
            .iter()
            .map(|fragment| fragment.text.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Ok(SummaryOutcome {
            summary,
            fragments,
            chunk_count,
        })
    }

    /// Fan chunks out to the backend on a bounded pool and fan the fragments back in by index.
    async fn dispatch(
        &self,
        chunks: Vec<Chunk>,
        cancel: &CancelSignal,
    ) -> Result<Vec<SummaryFragment>, SummarizeError> {
        let semaphore = Arc::new(Semaphore::new(self.options.concurrency));
        let mut slots: Vec<Option<String>> = vec![None; chunks.len()];
        let mut tasks: JoinSet<(usize, Option<Result<String, BackendError>>)> = JoinSet::new();

        for chunk in chunks {
            let backend = Arc::clone(&self.backend);
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (chunk.index, None);
                };
                if cancel.is_cancelled() {
                    return (chunk.index, None);
                }
                tracing::debug!(
                    chunk = chunk.index,
                    sentences = chunk.sentences.len(),
                    "Dispatching chunk"
                );
                let result = backend.summarize_chunk(&chunk.text).await;
                (chunk.index, Some(result))
            });
        }

        loop {
            let joined = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tasks.abort_all();
                    return Err(SummarizeError::Cancelled);
                }
                joined = tasks.join_next() => joined,
            };
            let Some(joined) = joined else {
                break;
            };

            match joined? {
                (index, Some(Ok(text))) => slots[index] = Some(text),
                (index, Some(Err(source))) => {
                    tasks.abort_all();
                    return Err(SummarizeError::Backend { index, source });
                }
                (_, None) => {
                    tasks.abort_all();
                    return Err(SummarizeError::Cancelled);
                }
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.map(|text| SummaryFragment { index, text })
                    .ok_or(SummarizeError::Cancelled)
            })
            .collect()
    }
}

#[async_trait]
impl SummarizeApi for Summarizer {
    async fn summarize(&self, raw_text: &str) -> Result<SummaryOutcome, SummarizeError> {
        Summarizer::summarize(self, raw_text).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        Summarizer::metrics_snapshot(self)
    }
}

/// One-shot pipeline: summarize `raw_text` with `backend`, packing chunks to `max_len`
/// as measured by `len_fn`.
pub async fn run(
    raw_text: &str,
    backend: Arc<dyn SummaryBackend>,
    max_len: usize,
    len_fn: LengthFn,
) -> Result<String, SummarizeError> {
    Summarizer::new(backend, SummarizerOptions::new(max_len, len_fn))?
        .run(raw_text)
        .await
}
