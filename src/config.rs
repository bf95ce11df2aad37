use crate::processing::{LengthMetric, ValidationError};
use std::env;
use thiserror::Error;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_LOCAL_MODEL: &str = "llama3.2";
const DEFAULT_CONCURRENCY: usize = 4;
const DEFAULT_MAX_RETRIES: usize = 3;
const DEFAULT_RETRY_BASE_MS: u64 = 500;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The remote backend was selected but no API key is available.
    #[error("Missing credential: set {0} to use the remote backend")]
    MissingCredential(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
    /// A parsed value failed semantic validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Runtime configuration for the summarizer.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend variant used to summarize chunks.
    pub method: SummaryMethod,
    /// Packing bound measured with [`Config::length_metric`].
    pub max_chunk_length: usize,
    /// Length metric used by the chunk packer.
    pub length_metric: LengthMetric,
    /// API key for the hosted chat-completion service.
    pub openai_api_key: Option<String>,
    /// Base URL of the OpenAI-compatible API.
    pub openai_base_url: String,
    /// Chat model used by the remote backend.
    pub openai_model: String,
    /// Register requested from the remote backend.
    pub tone: SummaryTone,
    /// Base URL of the local Ollama runtime.
    pub ollama_url: String,
    /// Model served by the local runtime.
    pub local_model: String,
    /// Maximum number of chunks summarized concurrently.
    pub concurrency: usize,
    /// Extra attempts allowed for transient or throttled backend calls.
    pub max_retries: usize,
    /// Base delay of the exponential retry schedule, in milliseconds.
    pub retry_base_delay_ms: u64,
    /// Per-request HTTP timeout in seconds.
    pub request_timeout_secs: u64,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
    chunk_length_overridden: bool,
    length_metric_overridden: bool,
}

/// Supported summarization backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SummaryMethod {
    /// Hosted chat-completion API.
    Remote,
    /// Locally served model.
    Local,
}

/// Tone requested from the remote backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SummaryTone {
    /// Plain, general-audience summaries.
    #[default]
    General,
    /// Formal, scientific summaries suited to research papers.
    Scientific,
}

impl SummaryMethod {
    /// Default packing bound for the backend class.
    pub const fn default_max_chunk_length(self) -> usize {
        match self {
            Self::Remote => 3000,
            Self::Local => 512,
        }
    }

    /// Default length metric for the backend class.
    pub const fn default_length_metric(self) -> LengthMetric {
        match self {
            Self::Remote => LengthMetric::Characters,
            Self::Local => LengthMetric::Words,
        }
    }
}

impl std::str::FromStr for SummaryMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "remote" | "openai" | "gpt" => Ok(Self::Remote),
            "local" | "ollama" | "transformers" => Ok(Self::Local),
            other => Err(ValidationError::InvalidMethod(other.to_string())),
        }
    }
}

impl std::fmt::Display for SummaryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote => f.write_str("remote"),
            Self::Local => f.write_str("local"),
        }
    }
}

impl std::str::FromStr for SummaryTone {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "general" => Ok(Self::General),
            "scientific" | "formal" => Ok(Self::Scientific),
            other => Err(ValidationError::InvalidTone(other.to_string())),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as absent so that `FOO=` in a `.env` file falls back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let method = match get("SUMMARIZER_METHOD") {
            Some(value) => value.parse::<SummaryMethod>()?,
            None => SummaryMethod::Remote,
        };
        let max_chunk_length: Option<usize> =
            parse_optional(get("MAX_CHUNK_LENGTH"), "MAX_CHUNK_LENGTH")?;
        if max_chunk_length == Some(0) {
            return Err(ValidationError::InvalidChunkLength.into());
        }
        let length_metric = get("CHUNK_LENGTH_METRIC")
            .map(|value| value.parse::<LengthMetric>())
            .transpose()?;
        let tone = get("SUMMARY_TONE")
            .map(|value| value.parse::<SummaryTone>())
            .transpose()?
            .unwrap_or_default();
        let concurrency = parse_optional(get("SUMMARIZER_CONCURRENCY"), "SUMMARIZER_CONCURRENCY")?
            .unwrap_or(DEFAULT_CONCURRENCY);
        if concurrency == 0 {
            return Err(ValidationError::InvalidConcurrency.into());
        }

        Ok(Self {
            method,
            max_chunk_length: max_chunk_length.unwrap_or_else(|| method.default_max_chunk_length()),
            length_metric: length_metric.unwrap_or_else(|| method.default_length_metric()),
            chunk_length_overridden: max_chunk_length.is_some(),
            length_metric_overridden: length_metric.is_some(),
            openai_api_key: get("OPENAI_API_KEY").map(|value| value.trim().to_string()),
            openai_base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            tone,
            ollama_url: get("OLLAMA_URL").unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            local_model: get("LOCAL_MODEL").unwrap_or_else(|| DEFAULT_LOCAL_MODEL.to_string()),
            concurrency,
            max_retries: parse_optional(get("BACKEND_MAX_RETRIES"), "BACKEND_MAX_RETRIES")?
                .unwrap_or(DEFAULT_MAX_RETRIES),
            retry_base_delay_ms: parse_optional(
                get("BACKEND_RETRY_BASE_MS"),
                "BACKEND_RETRY_BASE_MS",
            )?
            .unwrap_or(DEFAULT_RETRY_BASE_MS),
            request_timeout_secs: parse_optional(
                get("REQUEST_TIMEOUT_SECS"),
                "REQUEST_TIMEOUT_SECS",
            )?
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            server_port: parse_optional(get("SERVER_PORT"), "SERVER_PORT")?,
        })
    }

    /// Switch to another backend, resetting chunking defaults unless they were set explicitly.
    pub fn with_method(mut self, method: SummaryMethod) -> Self {
        if !self.chunk_length_overridden {
            self.max_chunk_length = method.default_max_chunk_length();
        }
        if !self.length_metric_overridden {
            self.length_metric = method.default_length_metric();
        }
        self.method = method;
        self
    }

    /// Pin the packing bound so later backend switches keep it.
    pub fn with_max_chunk_length(mut self, max_chunk_length: usize) -> Self {
        self.max_chunk_length = max_chunk_length;
        self.chunk_length_overridden = true;
        self
    }
}

fn parse_optional<T: std::str::FromStr>(
    value: Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    value
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

/// Load `.env` (if present) and build configuration from the process environment.
pub fn load_config() -> Result<Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        method = %config.method,
        max_chunk_length = config.max_chunk_length,
        length_metric = ?config.length_metric,
        concurrency = config.concurrency,
        has_api_key = config.openai_api_key.is_some(),
        "Loaded configuration"
    );
    Ok(config)
}
