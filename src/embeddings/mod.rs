//! Post embeddings over HTTP
//!
//! Two providers are supported, picked from the configured LLM endpoint:
//! OpenAI-compatible `/embeddings` (batched) and Ollama `/api/embeddings`
//! (one text per request, issued concurrently).
//!
//! ```rust,no_run
//! # async fn demo(config: &boardrag::AppConfig) -> boardrag::Result<()> {
//! use boardrag::embeddings::Embedder;
//! use boardrag::embeddings::EmbeddingService;
//!
//! let service = EmbeddingService::new(config)?;
//! let vector = service.embed("今日の天気は？").await?;
//! assert_eq!(vector.len(), service.dimension());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod generator;
pub mod text_preprocessing;

use async_trait::async_trait;
pub use client::EmbeddingClient;
pub use client::EmbeddingProvider;
pub use generator::EmbeddingService;
pub use text_preprocessing::preprocess_text_for_embedding;

use crate::errors::Result;

/// Texts per provider request
pub const MAX_BATCH_SIZE: usize = 100;

/// Text to fixed-size vector
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// One vector per input, same order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn dimension(&self) -> usize;
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimension: usize,
    pub endpoint: String,
    pub api_key: Option<String>,
}

impl EmbeddingConfig {
    pub fn from_app_config(config: &crate::config::AppConfig) -> Self {
        let provider = EmbeddingProvider::detect(config.llm_endpoint(), config.llm_key());

        Self {
            provider,
            model: config.embedding_model().to_string(),
            dimension: config.embedding_dimension(),
            endpoint: config.llm_endpoint().trim_end_matches('/').to_string(),
            api_key: (provider == EmbeddingProvider::OpenAI).then(|| config.llm_key().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppConfig;

    #[test]
    fn test_ollama_config_has_no_key() {
        let config = EmbeddingConfig::from_app_config(&AppConfig::default());
        assert_eq!(config.provider, EmbeddingProvider::Ollama);
        assert!(config.api_key.is_none());
        assert_eq!(config.dimension, 1536);
    }

    #[test]
    fn test_openai_config_carries_key() {
        let mut app = AppConfig::default();
        app.llm.llm_endpoint = "https://api.openai.com/v1/".to_string();
        app.llm.llm_key = "sk-test".to_string();

        let config = EmbeddingConfig::from_app_config(&app);
        assert_eq!(config.provider, EmbeddingProvider::OpenAI);
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.endpoint, "https://api.openai.com/v1");
    }
}
