use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::Postgres;
use sqlx::Transaction;
use uuid::Uuid;

use super::PostBatch;
use crate::models::NewPost;
use crate::models::Post;
use crate::models::Relationship;
use crate::BoardRagError;
use crate::Result;

fn commit_error(e: sqlx::Error) -> BoardRagError {
    BoardRagError::Commit(e.to_string())
}

/// Write batch backed by one Postgres transaction
pub struct PgPostBatch {
    tx: Transaction<'static, Postgres>,
}

impl PgPostBatch {
    pub(super) const fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl PostBatch for PgPostBatch {
    async fn insert_post(&mut self, post: NewPost) -> Result<Post> {
        let inserted = sqlx::query_as::<_, Post>(
            r"
            INSERT INTO posts (source_sequence_no, content, author, timestamp)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (source_sequence_no) DO UPDATE SET
                content = EXCLUDED.content,
                author = EXCLUDED.author,
                updated_at = CASE
                    WHEN (posts.content, posts.author) IS DISTINCT FROM (EXCLUDED.content, EXCLUDED.author)
                    THEN NOW()
                    ELSE posts.updated_at
                END
            RETURNING post_id, source_sequence_no, content, author, timestamp, created_at, updated_at
            ",
        )
        .bind(post.source_sequence_no)
        .bind(&post.content)
        .bind(&post.author)
        .bind(post.timestamp)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(commit_error)?;

        Ok(inserted)
    }

    async fn resolve_ids(&mut self, sequence_nos: &[i64]) -> Result<HashMap<i64, Uuid>> {
        if sequence_nos.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, (i64, Uuid)>(
            "SELECT source_sequence_no, post_id FROM posts WHERE source_sequence_no = ANY($1)",
        )
        .bind(sequence_nos)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(commit_error)?;

        Ok(rows.into_iter().collect())
    }

    async fn insert_relationship(&mut self, relationship: &Relationship) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO relationships (source_id, target_id, relationship_type, properties)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (source_id, target_id, relationship_type) DO NOTHING
            ",
        )
        .bind(relationship.source_id)
        .bind(relationship.target_id)
        .bind(relationship.relationship_type.as_str())
        .bind(sqlx::types::Json(&relationship.properties))
        .execute(&mut *self.tx)
        .await
        .map_err(commit_error)?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await.map_err(commit_error)
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await.map_err(commit_error)
    }
}
