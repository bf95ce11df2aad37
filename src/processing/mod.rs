//! Summarization pipeline: normalization, segmentation, chunk packing, and orchestration.

pub mod artifact;
pub mod bullets;
mod cancel;
pub mod chunking;
pub mod normalize;
pub mod segment;
mod service;
pub mod types;

pub use artifact::write_artifact;
pub use bullets::to_bullets;
pub use cancel::CancelSignal;
pub use chunking::{LengthFn, LengthMetric, chunk_text, pack};
pub use normalize::{Stopwords, normalize};
pub use segment::segment;
pub use service::{SummarizeApi, Summarizer, SummarizerOptions, run};
pub use types::{
    Chunk, ChunkingError, ErrorKind, SummarizeError, SummaryFragment, SummaryOutcome,
    ValidationError,
};
