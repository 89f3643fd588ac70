use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::BoardRagError;

/// Post stored in the local GraphRAG database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub post_id: Uuid,
    pub source_sequence_no: i64,
    pub content: String,
    pub author: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Author name, or `anonymous` when the poster left it blank
    #[must_use]
    pub fn display_author<'a>(&'a self, anonymous: &'a str) -> &'a str {
        match self.author.as_deref() {
            Some(author) if !author.trim().is_empty() => author,
            _ => anonymous,
        }
    }
}

/// Insertable post produced from a source row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub source_sequence_no: i64,
    pub content: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
}

/// Row of the upstream board table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SourceRow {
    #[sqlx(rename = "no")]
    pub sequence_no: i64,
    #[sqlx(rename = "name_and_trip")]
    pub display_name: Option<String>,
    #[sqlx(rename = "datetime")]
    pub timestamp: DateTime<Utc>,
    #[sqlx(rename = "id")]
    pub opaque_id: Option<String>,
    #[sqlx(rename = "main_text")]
    pub text_body: String,
}

/// Relationship types between posts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipType {
    /// Later post on the same board within the link window
    #[serde(rename = "IS_SEQUENTIAL_TO")]
    Sequential,
}

impl RelationshipType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sequential => "IS_SEQUENTIAL_TO",
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipType {
    type Err = BoardRagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IS_SEQUENTIAL_TO" => Ok(Self::Sequential),
            other => Err(BoardRagError::Custom(format!(
                "Unknown relationship type: {other}"
            ))),
        }
    }
}

/// Directed, typed edge between two posts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub source_id: Uuid,
    pub target_id: Uuid,
    pub relationship_type: RelationshipType,
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl Relationship {
    /// Sequential edge from `source` to a later post; distance is the sequence gap
    #[must_use]
    pub fn sequential(source: &Post, target_id: Uuid, target_sequence_no: i64) -> Self {
        let mut properties = serde_json::Map::new();
        properties.insert(
            "distance".to_string(),
            serde_json::Value::from(target_sequence_no - source.source_sequence_no),
        );
        Self {
            source_id: source.post_id,
            target_id,
            relationship_type: RelationshipType::Sequential,
            properties,
        }
    }

    #[must_use]
    pub fn distance(&self) -> Option<i64> {
        self.properties.get("distance").and_then(serde_json::Value::as_i64)
    }
}

/// Source reference attached to a generated answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    #[serde(rename = "source_post_no")]
    pub source_sequence_no: i64,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "content_excerpt")]
    pub excerpt: String,
}

/// Persisted high-water mark of the vector index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexCheckpoint {
    #[serde(alias = "last_processed_post_no")]
    pub last_processed_sequence_no: i64,
    pub last_processed_timestamp: Option<DateTime<Utc>>,
    pub total_indexed: u64,
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
}

/// Snapshot of the post store used by the status probe
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStatus {
    pub total_posts: i64,
    pub min_seq: i64,
    pub max_seq: i64,
    pub last_sync_time: Option<DateTime<Utc>>,
}
