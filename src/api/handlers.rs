//! API request handlers

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::Event;
use axum::response::sse::KeepAlive;
use axum::response::sse::Sse;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use futures::Stream;
use futures::StreamExt;
use tracing::error;
use tracing::info;

use crate::api::types::AskEvent;
use crate::api::types::AskRequest;
use crate::api::types::ErrorResponse;
use crate::api::types::HealthResponse;
use crate::api::types::StatusResponse;
use crate::database::PostStore;
use crate::rag::RagService;
use crate::rag::StreamingAnswer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PostStore>,
    pub rag_service: Arc<RagService>,
}

/// Health check handler
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Index status (GET /api/status)
pub async fn status(State(state): State<AppState>) -> Response {
    match state.store.status().await {
        Ok(index) => Json(StatusResponse {
            status: "ok".to_string(),
            index,
        })
        .into_response(),
        Err(e) => {
            error!("Failed to read index status: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.to_string())),
            )
                .into_response()
        }
    }
}

/// Streamed question answering (POST /api/ask)
pub async fn ask(State(state): State<AppState>, Json(req): Json<AskRequest>) -> Response {
    let question = req.question.trim().to_string();
    if question.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("question must not be empty")),
        )
            .into_response();
    }

    info!(
        "POST /api/ask: {} (conversation: {})",
        question,
        req.conversation_id.as_deref().unwrap_or("-")
    );

    let events = ask_events(state.rag_service.answer_streaming(question));
    Sse::new(events.map(|event| Ok::<_, Infallible>(to_sse(&event))))
        .keep_alive(KeepAlive::default())
        .into_response()
}

/// Every token, then citations and completion, or a single error
pub fn ask_events(answer: StreamingAnswer) -> impl Stream<Item = AskEvent> + Send {
    let StreamingAnswer { tokens, result } = answer;

    let token_events = tokens
        .into_stream()
        .map(|token| AskEvent::Token { token });
    let trailer = futures::stream::once(result.finish()).flat_map(|outcome| {
        let events = match outcome {
            Ok(answer) => vec![
                AskEvent::Citations {
                    citations: answer.citations,
                },
                AskEvent::Complete,
            ],
            Err(e) => {
                error!("Error processing ask request: {}", e);
                vec![AskEvent::Error {
                    message: e.to_string(),
                }]
            }
        };
        futures::stream::iter(events)
    });

    token_events.chain(trailer)
}

fn to_sse(event: &AskEvent) -> Event {
    match serde_json::to_string(event) {
        Ok(data) => Event::default().data(data),
        Err(e) => Event::default().data(format!(
            r#"{{"type":"error","message":"failed to encode event: {e}"}}"#
        )),
    }
}
