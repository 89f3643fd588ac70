//! Chat-completion clients
//!
//! `LlmService` talks to either an OpenAI-compatible `/chat/completions`
//! endpoint or Ollama's `/api/chat`, in blocking or streaming mode.

pub mod client;
pub mod prompts;
pub mod streaming;

use async_trait::async_trait;
pub use client::LlmProvider;
pub use client::LlmService;
pub use prompts::PromptTemplate;
use serde::Deserialize;
use serde::Serialize;
pub use streaming::StreamingResponse;

use crate::errors::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message of a chat-completion request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Chat-completion service
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Full answer in one call
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Answer as a stream of tokens; errors may arrive mid-stream
    async fn stream(&self, messages: &[ChatMessage]) -> Result<StreamingResponse>;
}
