//! Text preprocessing utilities for embedding generation

use tracing::debug;

use crate::errors::BoardRagError;
use crate::errors::Result;

/// Character budget per embedded text; board posts rarely exceed it
pub const MAX_EMBED_CHARS: usize = 4000;

/// Normalize whitespace, drop control characters and cap the length.
///
/// Fails on text that is empty once cleaned, so callers can skip it.
pub fn preprocess_text_for_embedding(text: &str) -> Result<String> {
    let sanitized: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ");

    if sanitized.is_empty() {
        return Err(BoardRagError::EmbeddingError(
            "Text contains only whitespace after preprocessing".to_string(),
        ));
    }

    if sanitized.chars().count() > MAX_EMBED_CHARS {
        debug!(
            "Truncating text for embedding: {} -> {} chars",
            sanitized.chars().count(),
            MAX_EMBED_CHARS
        );
        return Ok(sanitized.chars().take(MAX_EMBED_CHARS).collect());
    }

    Ok(sanitized)
}
