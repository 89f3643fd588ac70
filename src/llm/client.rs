//! HTTP chat-completion client for OpenAI-compatible and Ollama endpoints

use std::collections::VecDeque;
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use futures::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;

use super::streaming::decode_ollama_line;
use super::streaming::decode_openai_line;
use super::streaming::LineBuffer;
use super::streaming::StreamEvent;
use super::ChatCompletion;
use super::ChatMessage;
use super::StreamingResponse;
use crate::config::AppConfig;
use crate::embeddings::EmbeddingProvider;
use crate::errors::BoardRagError;
use crate::errors::Result;

/// Wire protocol spoken by the completion endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    /// `/chat/completions`, SSE when streaming
    OpenAI,
    /// `/api/chat`, NDJSON when streaming
    Ollama,
}

impl LlmProvider {
    #[must_use]
    pub fn detect(endpoint: &str, key: &str) -> Self {
        match EmbeddingProvider::detect(endpoint, key) {
            EmbeddingProvider::OpenAI => Self::OpenAI,
            EmbeddingProvider::Ollama => Self::Ollama,
        }
    }
}

#[derive(Serialize)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Deserialize)]
struct OpenAIMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[derive(Deserialize)]
struct OllamaMessage {
    content: String,
}

/// LLM client shared by the RAG pipeline and the CLI
#[derive(Clone)]
pub struct LlmService {
    provider: LlmProvider,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    client: Client,
}

impl LlmService {
    /// Create a new LLM service from configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .map_err(|e| BoardRagError::HttpError(e.to_string()))?;

        let provider = LlmProvider::detect(config.llm_endpoint(), config.llm_key());
        info!(
            "LLM service configured: provider={:?}, model={}",
            provider,
            config.llm_model()
        );

        Ok(Self {
            provider,
            endpoint: config.llm_endpoint().trim_end_matches('/').to_string(),
            api_key: config.llm_key().to_string(),
            model: config.llm_model().to_string(),
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
            client,
        })
    }

    #[must_use]
    pub const fn provider(&self) -> LlmProvider {
        self.provider
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, messages: &[ChatMessage], stream: bool) -> Result<reqwest::Response> {
        let request = match self.provider {
            LlmProvider::OpenAI => {
                let url = format!("{}/chat/completions", self.endpoint);
                debug!("Calling chat completions API: {} (stream={})", url, stream);
                self.client
                    .post(url)
                    .header("Authorization", format!("Bearer {}", self.api_key))
                    .json(&OpenAIChatRequest {
                        model: &self.model,
                        messages,
                        temperature: self.temperature,
                        max_tokens: self.max_tokens,
                        stream,
                    })
            }
            LlmProvider::Ollama => {
                let url = format!("{}/api/chat", self.endpoint);
                debug!("Calling Ollama chat API: {} (stream={})", url, stream);
                self.client.post(url).json(&OllamaChatRequest {
                    model: &self.model,
                    messages,
                    stream,
                    options: OllamaOptions {
                        temperature: self.temperature,
                        num_predict: self.max_tokens,
                    },
                })
            }
        };

        let response = request
            .send()
            .await
            .map_err(|e| BoardRagError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(BoardRagError::Generation(format!(
                "LLM API error ({status}): {error_text}"
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl ChatCompletion for LlmService {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let response = self.send(messages, false).await?;

        match self.provider {
            LlmProvider::OpenAI => {
                let body: OpenAIChatResponse = response.json().await.map_err(|e| {
                    BoardRagError::Generation(format!("Failed to parse response: {e}"))
                })?;
                body.choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.message.content)
                    .ok_or_else(|| BoardRagError::Generation("No choices in response".to_string()))
            }
            LlmProvider::Ollama => {
                let body: OllamaChatResponse = response.json().await.map_err(|e| {
                    BoardRagError::Generation(format!("Failed to parse response: {e}"))
                })?;
                Ok(body.message.content)
            }
        }
    }

    async fn stream(&self, messages: &[ChatMessage]) -> Result<StreamingResponse> {
        let response = self.send(messages, true).await?;
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()));

        Ok(StreamingResponse::new(Box::pin(token_stream(
            self.provider,
            Box::pin(body),
        ))))
    }
}

type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<Vec<u8>>> + Send>>;

struct DecodeState {
    provider: LlmProvider,
    body: ByteStream,
    buffer: LineBuffer,
    queue: VecDeque<Result<String>>,
    done: bool,
}

impl DecodeState {
    fn enqueue(&mut self, lines: Result<Vec<String>>) {
        let lines = match lines {
            Ok(lines) => lines,
            Err(e) => {
                self.queue.push_back(Err(e));
                self.done = true;
                return;
            }
        };
        for line in lines {
            if self.done {
                break;
            }
            let event = match self.provider {
                LlmProvider::OpenAI => decode_openai_line(&line),
                LlmProvider::Ollama => decode_ollama_line(&line),
            };
            match event {
                Ok(StreamEvent::Token(token)) => self.queue.push_back(Ok(token)),
                Ok(StreamEvent::Done) => self.done = true,
                Ok(StreamEvent::Skip) => {}
                Err(e) => {
                    self.queue.push_back(Err(e));
                    self.done = true;
                }
            }
        }
    }
}

/// Turn a raw completion body into a token stream ending at the provider's
/// end marker, at end of body, or right after the first error
fn token_stream(
    provider: LlmProvider,
    body: ByteStream,
) -> impl Stream<Item = Result<String>> + Send {
    let state = DecodeState {
        provider,
        body,
        buffer: LineBuffer::default(),
        queue: VecDeque::new(),
        done: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.queue.pop_front() {
                return Some((item, state));
            }
            if state.done {
                return None;
            }
            match state.body.next().await {
                Some(Ok(bytes)) => {
                    let lines = state.buffer.push(&bytes);
                    state.enqueue(lines);
                }
                Some(Err(e)) => {
                    state.done = true;
                    return Some((
                        Err(BoardRagError::Generation(format!("Stream error: {e}"))),
                        state,
                    ));
                }
                None => {
                    let rest = state.buffer.finish().map(|rest| rest.into_iter().collect());
                    state.enqueue(rest);
                    state.done = true;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(chunks: &[&'static str]) -> ByteStream {
        let items: Vec<reqwest::Result<Vec<u8>>> =
            chunks.iter().map(|c| Ok(c.as_bytes().to_vec())).collect();
        Box::pin(futures::stream::iter(items))
    }

    #[tokio::test]
    async fn test_openai_stream_decodes_split_events() {
        let stream = token_stream(
            LlmProvider::OpenAI,
            body(&[
                "data: {\"choices\":[{\"delta\":{\"content\":\"No.\"}}]}\n\ndata: {\"choi",
                "ces\":[{\"delta\":{\"content\":\"42\"}}]}\n\n",
                "data: [DONE]\n\n",
                "data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n",
            ]),
        );
        let tokens: Vec<String> = stream.map(|t| t.unwrap()).collect().await;
        assert_eq!(tokens, vec!["No.", "42"]);
    }

    #[tokio::test]
    async fn test_ollama_stream_without_trailing_newline() {
        let stream = token_stream(
            LlmProvider::Ollama,
            body(&[
                "{\"message\":{\"content\":\"a\"},\"done\":false}\n",
                "{\"message\":{\"content\":\"b\"},\"done\":true}",
            ]),
        );
        let tokens: Vec<String> = stream.map(|t| t.unwrap()).collect().await;
        assert_eq!(tokens, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_japanese_token_split_between_chunks() {
        let raw = "data: {\"choices\":[{\"delta\":{\"content\":\"名無し\"}}]}\n\ndata: [DONE]\n\n"
            .as_bytes()
            .to_vec();
        let cut = raw.iter().position(|&b| b >= 0x80).unwrap() + 2;
        let items: Vec<reqwest::Result<Vec<u8>>> =
            vec![Ok(raw[..cut].to_vec()), Ok(raw[cut..].to_vec())];

        let stream = token_stream(LlmProvider::OpenAI, Box::pin(futures::stream::iter(items)));
        let tokens: Vec<String> = stream.map(|t| t.unwrap()).collect().await;
        assert_eq!(tokens, vec!["名無し"]);
    }

    #[tokio::test]
    async fn test_stream_ends_after_error() {
        let stream = token_stream(
            LlmProvider::Ollama,
            body(&["{\"message\":{\"content\":\"a\"}}\nnot json\n{\"message\":{\"content\":\"b\"}}\n"]),
        );
        let items: Vec<Result<String>> = stream.collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(BoardRagError::Generation(_))));
    }

    #[test]
    fn test_provider_follows_endpoint() {
        assert_eq!(
            LlmProvider::detect("https://api.openai.com/v1", "sk-x"),
            LlmProvider::OpenAI
        );
        assert_eq!(
            LlmProvider::detect("http://localhost:11434", "ollama"),
            LlmProvider::Ollama
        );
    }
}
