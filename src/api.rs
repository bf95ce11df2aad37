//! HTTP surface for rustysum.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `POST /summarize` – Summarize raw text. Accepts an optional `bullets` flag and returns the
//!   merged summary, the number of chunks dispatched, and the bullet rendering when requested.
//! - `GET /metrics` – Observe run counters and the chunk count of the last run.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.
//!
//! The HTTP surface shares the same pipeline with the CLI, so behavior is identical across
//! interfaces.

use crate::processing::{ErrorKind, SummarizeApi, SummarizeError, to_bullets};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Build the HTTP router exposing the summarization API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: SummarizeApi + 'static,
{
    Router::new()
        .route("/summarize", post(summarize_document::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .with_state(service)
}

/// Request body for the `POST /summarize` endpoint.
#[derive(Deserialize)]
struct SummarizeRequest {
    /// Raw document contents to summarize.
    text: String,
    /// Also render the summary as a bullet list.
    #[serde(default)]
    bullets: bool,
}

/// Success response for the `POST /summarize` endpoint.
#[derive(Serialize)]
struct SummarizeResponse {
    summary: String,
    chunk_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    bullets: Option<String>,
}

async fn summarize_document<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>, AppError>
where
    S: SummarizeApi,
{
    let outcome = service.summarize(&request.text).await?;
    tracing::info!(
        chunks = outcome.chunk_count,
        bullets = request.bullets,
        "Summarize request completed"
    );
    let bullets = request.bullets.then(|| to_bullets(&outcome.summary));
    Ok(Json(SummarizeResponse {
        summary: outcome.summary,
        chunk_count: outcome.chunk_count,
        bullets,
    }))
}

/// Return run counters and the chunk count of the most recent run.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsResponse>
where
    S: SummarizeApi,
{
    let snapshot = service.metrics_snapshot();
    Json(MetricsResponse {
        documents_summarized: snapshot.documents_summarized,
        chunks_summarized: snapshot.chunks_summarized,
        failed_runs: snapshot.failed_runs,
        last_chunk_count: snapshot.last_chunk_count,
    })
}

/// Response body for `GET /metrics`.
#[derive(Serialize)]
struct MetricsResponse {
    documents_summarized: u64,
    chunks_summarized: u64,
    failed_runs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_chunk_count: Option<u64>,
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "summarize",
                method: "POST",
                path: "/summarize",
                description: "Split a document into sentence-aligned chunks, summarize each \
                    chunk, and join the fragments in order. Response returns \
                    { \"summary\": string, \"chunk_count\": number, \"bullets\"?: string }.",
                request_example: Some(json!({
                    "text": "Document contents",
                    "bullets": true
                })),
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return summarization counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

struct AppError(SummarizeError);

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::RateLimit => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::Authentication | ErrorKind::Inference | ErrorKind::Source => {
            StatusCode::BAD_GATEWAY
        }
        ErrorKind::TransientService | ErrorKind::ModelUnavailable | ErrorKind::Cancelled => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        ErrorKind::Configuration | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let body = json!({
            "error": self.0.to_string(),
            "kind": kind,
            "chunk_index": self.0.chunk_index(),
        });
        (status_for(kind), Json(body)).into_response()
    }
}

impl From<SummarizeError> for AppError {
    fn from(inner: SummarizeError) -> Self {
        Self(inner)
    }
}
