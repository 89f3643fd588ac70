//! Embedding service: preprocessing, batch splitting and blank handling

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::client::EmbeddingClient;
use super::client::EmbeddingProvider;
use super::preprocess_text_for_embedding;
use super::Embedder;
use super::EmbeddingConfig;
use super::MAX_BATCH_SIZE;
use crate::errors::BoardRagError;
use crate::errors::Result;

/// Configured embedding provider behind the `Embedder` seam
pub struct EmbeddingService {
    client: Arc<EmbeddingClient>,
    config: EmbeddingConfig,
}

impl EmbeddingService {
    pub fn new(config: &crate::config::AppConfig) -> Result<Self> {
        Self::from_config(EmbeddingConfig::from_app_config(config))
    }

    pub fn from_config(config: EmbeddingConfig) -> Result<Self> {
        let client = EmbeddingClient::new(
            config.provider,
            config.model.clone(),
            config.endpoint.clone(),
            config.api_key.clone(),
        )?;

        Ok(Self {
            client: Arc::new(client),
            config,
        })
    }

    pub async fn generate(&self, text: &str) -> Result<Vec<f32>> {
        let processed_text = preprocess_text_for_embedding(text)?;
        self.client.generate(&processed_text).await
    }

    /// One vector per text, in order; blank texts get a zero vector
    pub async fn generate_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let prepared: Vec<Option<String>> = texts
            .iter()
            .enumerate()
            .map(|(i, text)| match preprocess_text_for_embedding(text) {
                Ok(processed) => Some(processed),
                Err(_) => {
                    warn!("Text at position {} is blank, using zero vector", i);
                    None
                }
            })
            .collect();

        let non_blank: Vec<&str> = prepared.iter().flatten().map(String::as_str).collect();
        let mut vectors = Vec::with_capacity(non_blank.len());
        for chunk in non_blank.chunks(MAX_BATCH_SIZE) {
            vectors.extend(self.client.generate_batch(chunk).await?);
        }

        place_vectors(&prepared, vectors, self.config.dimension)
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    #[must_use]
    pub const fn provider(&self) -> EmbeddingProvider {
        self.config.provider
    }
}

/// Put provider vectors back at the positions of the non-blank texts
fn place_vectors(
    prepared: &[Option<String>],
    vectors: Vec<Vec<f32>>,
    dimension: usize,
) -> Result<Vec<Vec<f32>>> {
    let expected = prepared.iter().flatten().count();
    if vectors.len() != expected {
        return Err(BoardRagError::EmbeddingError(format!(
            "Provider returned {} vectors for {} texts",
            vectors.len(),
            expected
        )));
    }

    let mut vectors = vectors.into_iter();
    Ok(prepared
        .iter()
        .map(|text| match text {
            Some(_) => vectors.next().unwrap_or_default(),
            None => vec![0.0; dimension],
        })
        .collect())
}

#[async_trait]
impl Embedder for EmbeddingService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.generate(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.generate_batch(texts).await
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }
}
