//! Summarization backends that turn one chunk of text into plain-language prose.
//!
//! The orchestrator only sees [`SummaryBackend`]; concrete variants are chosen once at startup
//! by [`build_backend`]. Both variants talk HTTP directly through `reqwest`:
//!
//! - [`RemoteChatBackend`] calls an OpenAI-compatible chat-completion API and retries
//!   transient failures with exponential backoff.
//! - [`LocalInferenceBackend`] drives a locally served model through the Ollama runtime and
//!   treats every failure as fatal.

mod local;
mod remote;

pub use local::LocalInferenceBackend;
pub use remote::{RemoteChatBackend, RetryPolicy};

use crate::config::{Config, ConfigError, SummaryMethod, SummaryTone};
use crate::processing::ErrorKind;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced while summarizing a single chunk.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The remote service rejected the credential.
    #[error("Authentication rejected: {0}")]
    Authentication(String),
    /// Network failure or 5xx response; eligible for retry.
    #[error("Transient service failure: {0}")]
    TransientService(String),
    /// The remote service throttled the request; eligible for retry.
    #[error("Rate limited: {0}")]
    RateLimited(String),
    /// The service refused the request for a non-retryable reason.
    #[error("Request rejected ({status}): {body}")]
    Rejected {
        /// HTTP status returned by the service.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Response could not be decoded.
    #[error("Malformed backend response: {0}")]
    InvalidResponse(String),
    /// The local model could not be loaded.
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),
    /// Generation failed at runtime.
    #[error("Inference failed: {0}")]
    Inference(String),
}

impl BackendError {
    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientService(_) | Self::RateLimited(_))
    }

    /// Classification used in user-facing reports.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::TransientService(_) => ErrorKind::TransientService,
            Self::RateLimited(_) => ErrorKind::RateLimit,
            Self::ModelUnavailable(_) => ErrorKind::ModelUnavailable,
            Self::Rejected { .. } | Self::InvalidResponse(_) | Self::Inference(_) => {
                ErrorKind::Inference
            }
        }
    }
}

/// Interface implemented by summarization backends.
///
/// Each call is independent: no context carries over between chunks.
#[async_trait]
pub trait SummaryBackend: Send + Sync {
    /// Summarize one chunk.
    async fn summarize_chunk(&self, chunk: &str) -> Result<String, BackendError>;

    /// Short identifier used in logs.
    fn name(&self) -> &str;
}

/// Build the backend selected by configuration.
///
/// Fails before any network traffic when the remote backend has no credential.
pub fn build_backend(config: &Config) -> Result<Arc<dyn SummaryBackend>, ConfigError> {
    let backend: Arc<dyn SummaryBackend> = match config.method {
        SummaryMethod::Remote => Arc::new(RemoteChatBackend::from_config(config)?),
        SummaryMethod::Local => Arc::new(LocalInferenceBackend::from_config(config)?),
    };
    tracing::info!(backend = backend.name(), "Summarization backend ready");
    Ok(backend)
}

pub(crate) fn build_http_client(timeout_secs: u64, agent: &str) -> Result<Client, ConfigError> {
    Client::builder()
        .user_agent(agent)
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()
        .map_err(|error| ConfigError::InvalidValue(format!("HTTP client: {error}")))
}

pub(crate) fn system_instruction(tone: SummaryTone) -> &'static str {
    match tone {
        SummaryTone::General => {
            "You are an AI summariser. Your task is to summarise a given text clearly, \
             comprehensively and in an understandable way."
        }
        SummaryTone::Scientific => {
            "You are an AI research assistant. Your task is to summarise scientific papers \
             clearly, comprehensively and in an understandable way. The tone of the summary \
             should be formal and scientific."
        }
    }
}

pub(crate) fn user_prompt(chunk: &str) -> String {
    format!("Summarize the following text in plain language: {chunk}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned()).expect("config")
    }

    #[test]
    fn remote_backend_requires_credential() {
        let error = build_backend(&config(&[("SUMMARIZER_METHOD", "remote")]))
            .err()
            .expect("missing credential");
        assert!(matches!(
            error,
            ConfigError::MissingCredential(ref key) if key == "OPENAI_API_KEY"
        ));
    }

    #[test]
    fn selects_backend_by_method() {
        let remote = build_backend(&config(&[("OPENAI_API_KEY", "sk-test")])).expect("remote");
        assert_eq!(remote.name(), "remote-chat");

        let local = build_backend(&config(&[("SUMMARIZER_METHOD", "local")])).expect("local");
        assert_eq!(local.name(), "local-inference");
    }

    #[test]
    fn only_transient_and_throttling_errors_retry() {
        assert!(BackendError::TransientService("503".into()).is_retryable());
        assert!(BackendError::RateLimited("429".into()).is_retryable());
        assert!(!BackendError::Authentication("401".into()).is_retryable());
        assert!(!BackendError::Inference("boom".into()).is_retryable());
        assert!(!BackendError::ModelUnavailable("gone".into()).is_retryable());
    }

    #[test]
    fn tone_changes_system_instruction() {
        assert!(system_instruction(SummaryTone::Scientific).contains("formal and scientific"));
        assert!(!system_instruction(SummaryTone::General).contains("scientific"));
        assert!(user_prompt("chunk body").ends_with("plain language: chunk body"));
    }
}
