//! Streaming response handling

use std::pin::Pin;

use futures::Stream;
use futures::StreamExt;
use serde::Deserialize;

use crate::errors::BoardRagError;
use crate::errors::Result;

pub type TokenResultStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Streaming response from LLM
pub struct StreamingResponse {
    stream: TokenResultStream,
}

impl StreamingResponse {
    pub fn new(stream: TokenResultStream) -> Self {
        Self { stream }
    }

    /// Wrap an already-known token list, mostly for fakes and tests
    pub fn from_tokens<I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = Result<String>>,
        I::IntoIter: Send + 'static,
    {
        Self::new(Box::pin(futures::stream::iter(tokens)))
    }

    /// Collect all chunks into a single string
    pub async fn collect_all(mut self) -> Result<String> {
        let mut result = String::new();
        while let Some(chunk) = self.stream.next().await {
            result.push_str(&chunk?);
        }
        Ok(result)
    }

    /// Get the underlying stream
    pub fn into_stream(self) -> TokenResultStream {
        self.stream
    }
}

/// Reassembles newline-terminated lines from arbitrarily split byte chunks.
///
/// Bytes stay raw until a full line is present, so a multi-byte character
/// split across chunks decodes intact.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Feed a chunk and return every line it completed
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<String>> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = decode_line(raw)?;
            let line = line.trim_end_matches(['\n', '\r']);
            if !line.trim().is_empty() {
                lines.push(line.to_string());
            }
        }
        Ok(lines)
    }

    /// Whatever is left after the body ended without a trailing newline
    pub fn finish(&mut self) -> Result<Option<String>> {
        let rest = decode_line(std::mem::take(&mut self.pending))?;
        let rest = rest.trim();
        Ok((!rest.is_empty()).then(|| rest.to_string()))
    }
}

fn decode_line(raw: Vec<u8>) -> Result<String> {
    String::from_utf8(raw)
        .map_err(|e| BoardRagError::Generation(format!("Stream line is not valid UTF-8: {e}")))
}

/// Outcome of decoding one line of a streamed completion body
#[derive(Debug, PartialEq, Eq)]
pub enum StreamEvent {
    Token(String),
    Done,
    Skip,
}

#[derive(Deserialize)]
struct OpenAIChunk {
    choices: Vec<OpenAIChunkChoice>,
}

#[derive(Deserialize)]
struct OpenAIChunkChoice {
    #[serde(default)]
    delta: OpenAIDelta,
}

#[derive(Deserialize, Default)]
struct OpenAIDelta {
    content: Option<String>,
}

/// Decode one `data:` line of an OpenAI-compatible SSE body
pub fn decode_openai_line(line: &str) -> Result<StreamEvent> {
    let Some(data) = line.strip_prefix("data:") else {
        // comments and `event:` lines
        return Ok(StreamEvent::Skip);
    };
    let data = data.trim();
    if data == "[DONE]" {
        return Ok(StreamEvent::Done);
    }

    let chunk: OpenAIChunk = serde_json::from_str(data)
        .map_err(|e| BoardRagError::Generation(format!("Failed to parse stream chunk: {e}")))?;

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty())
        .map_or(StreamEvent::Skip, StreamEvent::Token))
}

#[derive(Deserialize)]
struct OllamaChunk {
    #[serde(default)]
    message: Option<OllamaChunkMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct OllamaChunkMessage {
    #[serde(default)]
    content: String,
}

/// Decode one NDJSON line of an Ollama `/api/chat` stream
pub fn decode_ollama_line(line: &str) -> Result<StreamEvent> {
    let chunk: OllamaChunk = serde_json::from_str(line)
        .map_err(|e| BoardRagError::Generation(format!("Failed to parse stream chunk: {e}")))?;

    if let Some(error) = chunk.error {
        return Err(BoardRagError::Generation(format!("Ollama stream error: {error}")));
    }

    let content = chunk.message.map(|m| m.content).unwrap_or_default();
    if !content.is_empty() {
        // Ollama may put the last token on the `done` line
        return Ok(StreamEvent::Token(content));
    }
    if chunk.done {
        return Ok(StreamEvent::Done);
    }
    Ok(StreamEvent::Skip)
}
