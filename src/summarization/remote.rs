//! OpenAI-compatible chat-completion backend.

use super::{BackendError, SummaryBackend, build_http_client, system_instruction, user_prompt};
use crate::config::{Config, ConfigError, SummaryTone};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

const CREDENTIAL_VARIABLE: &str = "OPENAI_API_KEY";
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Bounded exponential backoff applied to transient and throttled failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Extra attempts after the first request.
    pub max_retries: usize,
    /// Delay before the first retry; doubles for each subsequent one.
    pub base_delay: Duration,
}

impl RetryPolicy {
    fn delays(&self) -> impl Iterator<Item = Duration> {
        // Base 2 doubles the delay per attempt; the factor scales the first step to `base_delay`.
        let factor = (self.base_delay.as_millis() as u64 / 2).max(1);
        ExponentialBackoff::from_millis(2)
            .factor(factor)
            .max_delay(MAX_BACKOFF)
            .map(jitter)
            .take(self.max_retries)
    }
}

/// Summarizes chunks through a hosted chat-completion service.
pub struct RemoteChatBackend {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    tone: SummaryTone,
    retry: RetryPolicy,
}

impl RemoteChatBackend {
    /// Build the backend, failing when no credential is configured.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let api_key = config
            .openai_api_key
            .clone()
            .ok_or_else(|| ConfigError::MissingCredential(CREDENTIAL_VARIABLE.to_string()))?;
        let http = build_http_client(config.request_timeout_secs, "rustysum/remote")?;
        tracing::debug!(
            base_url = %config.openai_base_url,
            model = %config.openai_model,
            tone = ?config.tone,
            max_retries = config.max_retries,
            "Initialized remote chat backend"
        );

        Ok(Self {
            http,
            base_url: config.openai_base_url.clone(),
            api_key,
            model: config.openai_model.clone(),
            tone: config.tone,
            retry: RetryPolicy {
                max_retries: config.max_retries,
                base_delay: Duration::from_millis(config.retry_base_delay_ms),
            },
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    async fn request_once(&self, chunk: &str) -> Result<String, BackendError> {
        let payload = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_instruction(self.tone) },
                { "role": "user", "content": user_prompt(chunk) },
            ],
        });

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                BackendError::TransientService(format!(
                    "failed to reach {}: {error}",
                    self.base_url
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, body));
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|error| {
            BackendError::InvalidResponse(format!("failed to decode chat completion: {error}"))
        })?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| BackendError::InvalidResponse("completion contained no message".into()))
    }
}

fn classify_status(status: StatusCode, body: String) -> BackendError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            BackendError::Authentication(format!("{status}: {body}"))
        }
        StatusCode::TOO_MANY_REQUESTS => BackendError::RateLimited(format!("{status}: {body}")),
        StatusCode::REQUEST_TIMEOUT => BackendError::TransientService(format!("{status}: {body}")),
        status if status.is_server_error() => {
            BackendError::TransientService(format!("{status}: {body}"))
        }
        status => BackendError::Rejected { status, body },
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl SummaryBackend for RemoteChatBackend {
    async fn summarize_chunk(&self, chunk: &str) -> Result<String, BackendError> {
        RetryIf::spawn(
            self.retry.delays(),
            || self.request_once(chunk),
            |error: &BackendError| {
                let retry = error.is_retryable();
                if retry {
                    tracing::warn!(error = %error, "Remote summarization failed; retrying");
                }
                retry
            },
        )
        .await
    }

    fn name(&self) -> &str {
        "remote-chat"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};
    use std::collections::HashMap;

    fn backend(server: &MockServer, max_retries: &str) -> RemoteChatBackend {
        let pairs: HashMap<String, String> = [
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", server.base_url().as_str()),
            ("OPENAI_MODEL", "gpt-test"),
            ("BACKEND_MAX_RETRIES", max_retries),
            ("BACKEND_RETRY_BASE_MS", "1"),
        ]
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
        let config = Config::from_lookup(|key| pairs.get(key).cloned()).expect("config");
        RemoteChatBackend::from_config(&config).expect("backend")
    }

    #[tokio::test]
    async fn returns_first_choice_content() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .header("authorization", "Bearer sk-test")
                    .json_body_partial(r#"{"model": "gpt-test"}"#);
                then.status(200).json_body(json!({
                    "choices": [
                        { "message": { "role": "assistant", "content": "  A short summary.  " } }
                    ]
                }));
            })
            .await;

        let summary = backend(&server, "0")
            .summarize_chunk("Some long text.")
            .await
            .expect("summary");

        mock.assert_async().await;
        assert_eq!(summary, "A short summary.");
    }

    #[tokio::test]
    async fn retries_server_errors_until_exhausted() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(503).body("overloaded");
            })
            .await;

        let error = backend(&server, "2")
            .summarize_chunk("text")
            .await
            .expect_err("service unavailable");

        mock.assert_hits_async(3).await;
        assert!(matches!(
            error,
            BackendError::TransientService(ref message) if message.contains("503")
        ));
    }

    #[tokio::test]
    async fn retries_rate_limits() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(429).body("slow down");
            })
            .await;

        let error = backend(&server, "1")
            .summarize_chunk("text")
            .await
            .expect_err("throttled");

        mock.assert_hits_async(2).await;
        assert!(matches!(error, BackendError::RateLimited(_)));
    }

    #[tokio::test]
    async fn authentication_failures_are_not_retried() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(401).body("invalid key");
            })
            .await;

        let error = backend(&server, "3")
            .summarize_chunk("text")
            .await
            .expect_err("unauthorized");

        mock.assert_hits_async(1).await;
        assert!(matches!(error, BackendError::Authentication(_)));
    }

    #[tokio::test]
    async fn malformed_body_is_reported() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(json!({ "choices": [] }));
            })
            .await;

        let error = backend(&server, "0")
            .summarize_chunk("text")
            .await
            .expect_err("no choices");
        assert!(matches!(error, BackendError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn recovers_after_transient_failure() {
        use axum::{Json, Router, http::StatusCode as AxumStatus, routing::post};
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let app = Router::new().route(
            "/chat/completions",
            post(move || {
                let counter = Arc::clone(&counter);
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        (AxumStatus::SERVICE_UNAVAILABLE, Json(json!({ "error": "busy" })))
                    } else {
                        (
                            AxumStatus::OK,
                            Json(json!({
                                "choices": [ { "message": { "content": "Recovered." } } ]
                            })),
                        )
                    }
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let address = listener.local_addr().expect("address");
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let backend = RemoteChatBackend {
            http: Client::new(),
            base_url: format!("http://{address}"),
            api_key: "sk-test".into(),
            model: "gpt-test".into(),
            tone: SummaryTone::General,
            retry: RetryPolicy {
                max_retries: 2,
                base_delay: Duration::from_millis(1),
            },
        };
        let summary = backend.summarize_chunk("text").await.expect("summary");
        server.abort();

        assert_eq!(summary, "Recovered.");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn retry_schedule_is_bounded() {
        let policy = RetryPolicy {
            max_retries: 4,
            base_delay: Duration::from_millis(500),
        };
        let delays: Vec<Duration> = policy.delays().collect();
        assert_eq!(delays.len(), 4);
        assert!(delays.iter().all(|delay| *delay <= MAX_BACKOFF));
    }

    #[test]
    fn classifies_status_codes() {
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, String::new()),
            BackendError::Authentication(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, String::new()),
            BackendError::TransientService(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, "context too long".into()),
            BackendError::Rejected { status, .. } if status == StatusCode::BAD_REQUEST
        ));
    }
}
