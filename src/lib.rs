#![deny(missing_docs)]

//! Core library for the rustysum document summarizer.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Structured logging and tracing setup.
pub mod logging;
/// Summarization run metrics.
pub mod metrics;
/// Text preparation and summarization orchestration.
pub mod processing;
/// Source adapters producing raw text.
pub mod sources;
/// Summarization backends.
pub mod summarization;
