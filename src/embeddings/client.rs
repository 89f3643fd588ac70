//! HTTP clients for the OpenAI and Ollama embedding APIs

use std::time::Duration;

use futures::StreamExt;
use futures::TryStreamExt;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::errors::BoardRagError;
use crate::errors::Result;

/// Supported embedding providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingProvider {
    /// `OpenAI` embeddings API
    OpenAI,
    /// Ollama local embeddings
    Ollama,
}

impl EmbeddingProvider {
    /// Pick a provider from the shared LLM endpoint settings.
    /// Priority: key == "ollama", then the endpoint domain.
    #[must_use]
    pub fn detect(endpoint: &str, key: &str) -> Self {
        if key == "ollama" {
            Self::Ollama
        } else if endpoint.contains("api.openai.com") {
            Self::OpenAI
        } else if endpoint.contains("localhost") || !endpoint.contains("openai") {
            Self::Ollama
        } else {
            Self::OpenAI
        }
    }
}

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    input: &'a [&'a str],
    model: &'a str,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    data: Vec<OpenAIEmbedding>,
}

#[derive(Deserialize)]
struct OpenAIEmbedding {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct OllamaResponse {
    embedding: Vec<f32>,
}

/// Ollama has no batch endpoint; this bounds the fan-out
const OLLAMA_CONCURRENCY: usize = 16;

/// HTTP client for one embedding provider
pub struct EmbeddingClient {
    provider: EmbeddingProvider,
    model: String,
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

impl EmbeddingClient {
    pub fn new(
        provider: EmbeddingProvider,
        model: String,
        endpoint: String,
        api_key: Option<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .pool_max_idle_per_host(OLLAMA_CONCURRENCY * 2)
            .build()
            .map_err(|e| BoardRagError::HttpError(e.to_string()))?;

        Ok(Self {
            provider,
            model,
            endpoint,
            api_key,
            client,
        })
    }

    #[must_use]
    pub const fn provider(&self) -> EmbeddingProvider {
        self.provider
    }

    pub async fn generate(&self, text: &str) -> Result<Vec<f32>> {
        match self.provider {
            EmbeddingProvider::OpenAI => self
                .openai_batch(&[text])
                .await?
                .pop()
                .ok_or_else(|| BoardRagError::EmbeddingError("Empty embedding response".to_string())),
            EmbeddingProvider::Ollama => self.ollama_single(text).await,
        }
    }

    /// One vector per input, in input order
    pub async fn generate_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        match self.provider {
            EmbeddingProvider::OpenAI => self.openai_batch(texts).await,
            EmbeddingProvider::Ollama => {
                futures::stream::iter(texts.iter().map(|text| self.ollama_single(text)).collect::<Vec<_>>())
                    .buffered(OLLAMA_CONCURRENCY)
                    .try_collect()
                    .await
            }
        }
    }

    async fn openai_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| BoardRagError::ConfigError("OpenAI API key not provided".to_string()))?;

        debug!("Embedding {} texts with {}", texts.len(), self.model);
        let response: OpenAIResponse = self
            .post_json(
                "embeddings",
                &OpenAIRequest {
                    input: texts,
                    model: &self.model,
                },
                Some(api_key),
            )
            .await?;

        if response.data.len() != texts.len() {
            return Err(BoardRagError::EmbeddingError(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                response.data.len()
            )));
        }
        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }

    async fn ollama_single(&self, text: &str) -> Result<Vec<f32>> {
        let response: OllamaResponse = self
            .post_json(
                "api/embeddings",
                &OllamaRequest {
                    model: &self.model,
                    prompt: text,
                },
                None,
            )
            .await?;
        Ok(response.embedding)
    }

    /// POST `body` to `{endpoint}/{path}` and decode the JSON reply
    async fn post_json<B, R>(&self, path: &str, body: &B, bearer: Option<&str>) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}/{path}", self.endpoint);
        let mut request = self.client.post(&url).json(body);
        if let Some(key) = bearer {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BoardRagError::HttpError(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(BoardRagError::EmbeddingError(format!(
                "{url} returned {status}: {detail}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| BoardRagError::EmbeddingError(format!("Malformed response from {url}: {e}")))
    }
}
