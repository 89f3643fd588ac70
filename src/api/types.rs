//! API request and response types

use serde::Deserialize;
use serde::Serialize;

use crate::models::Citation;
use crate::models::IndexStatus;

/// Body of `POST /api/ask`
#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// One server-sent event on the ask stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AskEvent {
    Token { token: String },
    Citations { citations: Vec<Citation> },
    Complete,
    Error { message: String },
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Status probe response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub index: IndexStatus,
}

/// Body of every non-2xx JSON response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}
