use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing summarization activity.
#[derive(Default)]
pub struct RunMetrics {
    documents_summarized: AtomicU64,
    chunks_summarized: AtomicU64,
    failed_runs: AtomicU64,
    last_chunk_count: AtomicU64,
}

impl RunMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed run and the number of chunks it dispatched.
    pub fn record_summary(&self, chunk_count: u64) {
        self.documents_summarized.fetch_add(1, Ordering::Relaxed);
        self.chunks_summarized
            .fetch_add(chunk_count, Ordering::Relaxed);
        self.last_chunk_count.store(chunk_count, Ordering::Relaxed);
    }

    /// Record a run that aborted with an error.
    pub fn record_failure(&self) {
        self.failed_runs.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let last_chunk_count = self.last_chunk_count.load(Ordering::Relaxed);
        MetricsSnapshot {
            documents_summarized: self.documents_summarized.load(Ordering::Relaxed),
            chunks_summarized: self.chunks_summarized.load(Ordering::Relaxed),
            failed_runs: self.failed_runs.load(Ordering::Relaxed),
            last_chunk_count: (last_chunk_count > 0).then_some(last_chunk_count),
        }
    }
}

/// Immutable view of summarization counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of documents summarized since startup.
    pub documents_summarized: u64,
    /// Total chunks dispatched across all successful runs.
    pub chunks_summarized: u64,
    /// Runs that ended in an error.
    pub failed_runs: u64,
    /// Chunk count of the most recent successful run, if any.
    pub last_chunk_count: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_documents_and_chunks() {
        let metrics = RunMetrics::new();
        metrics.record_summary(2);
        metrics.record_summary(3);
        metrics.record_failure();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_summarized, 2);
        assert_eq!(snapshot.chunks_summarized, 5);
        assert_eq!(snapshot.failed_runs, 1);
        assert_eq!(snapshot.last_chunk_count, Some(3));
    }

    #[test]
    fn snapshot_is_consistent() {
        let metrics = RunMetrics::new();
        assert_eq!(metrics.snapshot().documents_summarized, 0);
        assert_eq!(metrics.snapshot().chunks_summarized, 0);
        assert!(metrics.snapshot().last_chunk_count.is_none());
    }
}
