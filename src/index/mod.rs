//! Vector index over synced posts
//!
//! Documents are keyed by post id, one live entry per post. The index
//! lives in a pgvector table; the checkpoint lives in a JSON file beside it.

pub mod checkpoint;
pub mod updater;
pub mod vector_store;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
pub use checkpoint::CheckpointStore;
use serde::Deserialize;
use serde::Serialize;
pub use updater::IndexMode;
pub use updater::IndexReport;
pub use updater::IndexUpdater;
pub use vector_store::PgVectorIndex;

use crate::models::Post;
use crate::Result;

/// Metadata stored alongside every indexed document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    #[serde(
        default,
        alias = "source_post_no",
        skip_serializing_if = "Option::is_none"
    )]
    pub source_sequence_no: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_no: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_no: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// What a match points back to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchReference {
    /// A single post by sequence number
    Post(i64),
    /// An inclusive sequence-number window
    Window { start: i64, end: i64 },
}

impl DocumentMetadata {
    /// Metadata for the document indexing `post`
    #[must_use]
    pub fn for_post(post: &Post) -> Self {
        Self {
            post_id: Some(post.post_id.to_string()),
            source_sequence_no: Some(post.source_sequence_no),
            timestamp: Some(post.timestamp),
            author: post.author.clone(),
            source: Some(format!("graphrag_post_{}", post.source_sequence_no)),
            ..Self::default()
        }
    }

    /// Exact post reference wins over a window; neither shape yields `None`
    #[must_use]
    pub fn reference(&self) -> Option<MatchReference> {
        if let Some(sequence_no) = self.source_sequence_no {
            return Some(MatchReference::Post(sequence_no));
        }
        match (self.start_no, self.end_no) {
            (Some(start), Some(end)) => Some(MatchReference::Window { start, end }),
            _ => None,
        }
    }
}

/// Document ready for embedding and upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDocument {
    pub doc_id: String,
    pub text: String,
    pub metadata: DocumentMetadata,
}

impl IndexDocument {
    /// The document for one post; its id is the post id
    #[must_use]
    pub fn from_post(post: &Post) -> Self {
        Self {
            doc_id: post.post_id.to_string(),
            text: post.content.clone(),
            metadata: DocumentMetadata::for_post(post),
        }
    }
}

/// One nearest-neighbor hit
#[derive(Debug, Clone, PartialEq)]
pub struct VectorMatch {
    pub doc_id: String,
    pub text: String,
    pub metadata: DocumentMetadata,
    /// Cosine similarity, higher is closer
    pub score: f64,
}

/// Vector index operations used by retrieval and the updater
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace documents by `doc_id`
    async fn upsert(&self, documents: &[IndexDocument]) -> Result<()>;

    /// Top `k` documents by similarity to `text`, best first
    async fn similarity_query(&self, text: &str, k: usize) -> Result<Vec<VectorMatch>>;

    async fn delete(&self, doc_ids: &[String]) -> Result<()>;

    /// Every stored `(doc_id, metadata)` pair
    async fn enumerate_metadata(&self) -> Result<Vec<(String, DocumentMetadata)>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_accepts_legacy_post_no() {
        let metadata: DocumentMetadata =
            serde_json::from_str(r#"{"post_id":"abc","source_post_no":42}"#).unwrap();
        assert_eq!(metadata.source_sequence_no, Some(42));
        assert_eq!(metadata.reference(), Some(MatchReference::Post(42)));
    }

    #[test]
    fn test_window_reference() {
        let metadata: DocumentMetadata =
            serde_json::from_str(r#"{"start_no":100,"end_no":130}"#).unwrap();
        assert_eq!(
            metadata.reference(),
            Some(MatchReference::Window {
                start: 100,
                end: 130
            })
        );
    }

    #[test]
    fn test_half_window_has_no_reference() {
        let metadata: DocumentMetadata = serde_json::from_str(r#"{"start_no":100}"#).unwrap();
        assert_eq!(metadata.reference(), None);
    }
}
