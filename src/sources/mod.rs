//! Source adapters that turn documents into raw text for the pipeline.
//!
//! An adapter either yields text, yields nothing (`Ok(None)`, e.g. a video without a
//! transcript), or fails. The pipeline treats "nothing" as empty input.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::path::PathBuf;
use thiserror::Error;
use tokio::io::AsyncReadExt;

const WEBPAGE_RENDER_WIDTH: usize = 10_000;

/// Errors raised while fetching source text.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Local I/O failed.
    #[error("I/O failure reading {target}: {source}")]
    Io {
        /// File or stream that failed.
        target: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Remote server answered with a non-success status.
    #[error("Unexpected response from {url} ({status})")]
    UnexpectedStatus {
        /// Requested URL.
        url: String,
        /// HTTP status returned.
        status: StatusCode,
    },
    /// Payload could not be turned into text.
    #[error("Failed to extract text: {0}")]
    Decode(String),
}

/// Producer of raw text for one summarization run.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Fetch the raw text, or `None` when the source has no text.
    async fn fetch_text(&self) -> Result<Option<String>, SourceError>;

    /// Human-readable description used in logs.
    fn describe(&self) -> String;
}

fn non_blank(text: String) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Reads a UTF-8 text file.
pub struct TextFileSource {
    path: PathBuf,
}

impl TextFileSource {
    /// Create an adapter for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SourceAdapter for TextFileSource {
    async fn fetch_text(&self) -> Result<Option<String>, SourceError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SourceError::Io {
                target: self.path.display().to_string(),
                source,
            })?;
        Ok(non_blank(text))
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

/// Reads all of standard input.
#[derive(Default)]
pub struct StdinSource;

#[async_trait]
impl SourceAdapter for StdinSource {
    async fn fetch_text(&self) -> Result<Option<String>, SourceError> {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .map_err(|source| SourceError::Io {
                target: "stdin".into(),
                source,
            })?;
        Ok(non_blank(text))
    }

    fn describe(&self) -> String {
        "stdin".into()
    }
}

/// Fetches a web page and keeps its visible text.
pub struct WebpageSource {
    http: Client,
    url: String,
}

impl WebpageSource {
    /// Create an adapter for `url`.
    pub fn new(url: impl Into<String>) -> Result<Self, SourceError> {
        let http = Client::builder().user_agent("rustysum/source").build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[async_trait]
impl SourceAdapter for WebpageSource {
    async fn fetch_text(&self) -> Result<Option<String>, SourceError> {
        let response = self.http.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::UnexpectedStatus {
                url: self.url.clone(),
                status,
            });
        }
        let html = response.bytes().await?;
        let text = visible_text(&html)?;
        tracing::debug!(url = %self.url, chars = text.len(), "Fetched web page");
        Ok(non_blank(text))
    }

    fn describe(&self) -> String {
        format!("web:{}", self.url)
    }
}

/// Render HTML to plain text, dropping scripts, styles, and markup.
fn visible_text(html: &[u8]) -> Result<String, SourceError> {
    html2text::config::plain()
        .string_from_read(html, WEBPAGE_RENDER_WIDTH)
        .map_err(|error| SourceError::Decode(error.to_string()))
}
