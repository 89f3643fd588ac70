use uuid::Uuid;

use super::Database;
use crate::models::Relationship;
use crate::Result;

/// Row shape of the `relationships` table
#[derive(Debug, sqlx::FromRow)]
pub(super) struct RelationshipRow {
    pub source_id: Uuid,
    pub target_id: Uuid,
    pub relationship_type: String,
    pub properties: sqlx::types::Json<serde_json::Map<String, serde_json::Value>>,
}

impl RelationshipRow {
    /// Rows with a type this build does not know about are dropped
    pub(super) fn into_relationship(self) -> Option<Relationship> {
        match self.relationship_type.parse() {
            Ok(relationship_type) => Some(Relationship {
                source_id: self.source_id,
                target_id: self.target_id,
                relationship_type,
                properties: self.properties.0,
            }),
            Err(e) => {
                tracing::debug!("Skipping relationship {} -> {}: {}", self.source_id, self.target_id, e);
                None
            }
        }
    }
}

impl Database {
    /// Edges leaving or entering any of the given posts
    pub async fn get_relationships_touching(&self, ids: &[Uuid]) -> Result<Vec<Relationship>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, RelationshipRow>(
            r"
            SELECT source_id, target_id, relationship_type, properties
            FROM relationships
            WHERE source_id = ANY($1) OR target_id = ANY($1)
            ",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(RelationshipRow::into_relationship)
            .collect())
    }

    pub async fn count_relationships(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM relationships")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
