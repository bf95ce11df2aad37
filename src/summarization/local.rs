//! Local inference backend served by an Ollama runtime.

use super::{BackendError, SummaryBackend, build_http_client, system_instruction, user_prompt};
use crate::config::{Config, ConfigError, SummaryTone};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

/// Summarizes chunks with a model loaded into the local runtime.
///
/// Failures are never retried: a model that cannot load or a generation that crashes is
/// fatal for the chunk.
pub struct LocalInferenceBackend {
    http: Client,
    base_url: String,
    model: String,
    tone: SummaryTone,
}

impl LocalInferenceBackend {
    /// Build the backend from configuration.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let http = build_http_client(config.request_timeout_secs, "rustysum/local")?;
        tracing::debug!(
            url = %config.ollama_url,
            model = %config.local_model,
            "Initialized local inference backend"
        );
        Ok(Self {
            http,
            base_url: config.ollama_url.clone(),
            model: config.local_model.clone(),
            tone: config.tone,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    done: bool,
}

#[async_trait]
impl SummaryBackend for LocalInferenceBackend {
    async fn summarize_chunk(&self, chunk: &str) -> Result<String, BackendError> {
        let payload = json!({
            "model": self.model,
            "system": system_instruction(self.tone),
            "prompt": user_prompt(chunk),
            "stream": false,
            "options": {
                // Lower temperature for deterministic summaries.
                "temperature": 0.1,
            }
        });

        let response = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                if error.is_connect() {
                    BackendError::ModelUnavailable(format!(
                        "failed to reach Ollama at {}: {error}",
                        self.base_url
                    ))
                } else {
                    BackendError::Inference(format!("generation request failed: {error}"))
                }
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(BackendError::ModelUnavailable(format!(
                "model '{}' is not available at {}",
                self.model,
                self.endpoint()
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Inference(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: GenerateResponse = response.json().await.map_err(|error| {
            BackendError::Inference(format!("failed to decode Ollama response: {error}"))
        })?;

        if !body.done {
            return Err(BackendError::Inference(
                "Ollama response incomplete (streaming not supported)".into(),
            ));
        }

        Ok(body.response.trim().to_string())
    }

    fn name(&self) -> &str {
        "local-inference"
    }
}
