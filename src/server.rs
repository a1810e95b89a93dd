//! HTTP surface over the alignment engine.
//!
//! Three routes on a stateless engine: a health probe, a JSON analyze
//! endpoint, and a multipart variant that accepts an optional guideline
//! upload. Requests never fail on bad clinical input; an empty or missing
//! note produces the all-Missing report. The guideline upload is consumed as
//! plain text (lossy UTF-8), and an unreadable upload degrades to no
//! guideline rather than an error.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::config;
use crate::pipeline::alignment::{AlignmentEngine, AlignmentReport};

// 20 MB covers any realistic guideline upload (multipart overhead included).
const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Server startup errors.
#[derive(Error, Debug)]
pub enum ServeError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Build the application router over a shared engine.
pub fn router(engine: Arc<AlignmentEngine>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .route("/analyze-with-guideline", post(analyze_with_guideline))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(engine)
}

/// Bind and serve until the process is stopped.
pub async fn serve(engine: Arc<AlignmentEngine>) -> Result<(), ServeError> {
    let addr = config::bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind { addr, source })?;
    tracing::info!(addr = %addr, "{} listening", config::APP_NAME);
    axum::serve(listener, router(engine)).await?;
    Ok(())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok", version: config::APP_VERSION })
}

async fn analyze(
    State(engine): State<Arc<AlignmentEngine>>,
    Json(request): Json<AnalyzeRequest>,
) -> Json<AlignmentReport> {
    let request_id = Uuid::new_v4();
    tracing::info!(
        request_id = %request_id,
        note_len = request.note.len(),
        "analyze request"
    );
    Json(engine.run(&request.note, ""))
}

async fn analyze_with_guideline(
    State(engine): State<Arc<AlignmentEngine>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let request_id = Uuid::new_v4();

    let mut note = String::new();
    let mut guideline = String::new();

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "doctor_note" => {
                note = field.text().await.unwrap_or_default();
            }
            "guideline" => match field.bytes().await {
                Ok(bytes) => {
                    guideline = String::from_utf8_lossy(&bytes).into_owned();
                }
                Err(e) => {
                    tracing::warn!(
                        request_id = %request_id,
                        "Failed to read guideline upload, continuing without it: {e}"
                    );
                }
            },
            _ => {}
        }
    }

    tracing::info!(
        request_id = %request_id,
        note_len = note.len(),
        guideline_len = guideline.len(),
        "analyze-with-guideline request"
    );
    Json(engine.run(&note, &guideline)).into_response()
}
