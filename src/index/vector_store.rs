use std::sync::Arc;

use async_trait::async_trait;
use pgvector::Vector;
use sqlx::PgPool;
use tracing::debug;

use super::DocumentMetadata;
use super::IndexDocument;
use super::VectorIndex;
use super::VectorMatch;
use crate::embeddings::Embedder;
use crate::BoardRagError;
use crate::Result;

/// pgvector-backed index in the `post_embeddings` table
pub struct PgVectorIndex {
    pool: PgPool,
    embedder: Arc<dyn Embedder>,
}

impl PgVectorIndex {
    pub fn new(pool: PgPool, embedder: Arc<dyn Embedder>) -> Self {
        Self { pool, embedder }
    }

    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM post_embeddings")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn index_write_error(e: impl std::fmt::Display) -> BoardRagError {
    BoardRagError::IndexWrite(e.to_string())
}

#[async_trait]
impl VectorIndex for PgVectorIndex {
    async fn upsert(&self, documents: &[IndexDocument]) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        let embeddings = self
            .embedder
            .embed_batch(&texts)
            .await
            .map_err(index_write_error)?;

        if embeddings.len() != documents.len() {
            return Err(BoardRagError::IndexWrite(format!(
                "Expected {} embeddings, got {}",
                documents.len(),
                embeddings.len()
            )));
        }

        let mut tx = self.pool.begin().await.map_err(index_write_error)?;
        for (document, embedding) in documents.iter().zip(embeddings) {
            sqlx::query(
                r"
                INSERT INTO post_embeddings (doc_id, content, metadata, embedding)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (doc_id) DO UPDATE SET
                    content = EXCLUDED.content,
                    metadata = EXCLUDED.metadata,
                    embedding = EXCLUDED.embedding,
                    created_at = NOW()
                ",
            )
            .bind(&document.doc_id)
            .bind(&document.text)
            .bind(sqlx::types::Json(&document.metadata))
            .bind(Vector::from(embedding))
            .execute(&mut *tx)
            .await
            .map_err(index_write_error)?;
        }
        tx.commit().await.map_err(index_write_error)?;

        debug!("Upserted {} documents", documents.len());
        Ok(())
    }

    async fn similarity_query(&self, text: &str, k: usize) -> Result<Vec<VectorMatch>> {
        let embedding = self.embedder.embed(text).await?;

        let rows = sqlx::query_as::<_, (String, String, sqlx::types::Json<DocumentMetadata>, f64)>(
            r"
            SELECT doc_id, content, metadata, 1 - (embedding <=> $1) AS similarity
            FROM post_embeddings
            ORDER BY embedding <=> $1
            LIMIT $2
            ",
        )
        .bind(Vector::from(embedding))
        .bind(k as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(doc_id, text, metadata, score)| VectorMatch {
                doc_id,
                text,
                metadata: metadata.0,
                score,
            })
            .collect())
    }

    async fn delete(&self, doc_ids: &[String]) -> Result<()> {
        if doc_ids.is_empty() {
            return Ok(());
        }

        sqlx::query("DELETE FROM post_embeddings WHERE doc_id = ANY($1)")
            .bind(doc_ids)
            .execute(&self.pool)
            .await
            .map_err(index_write_error)?;
        Ok(())
    }

    async fn enumerate_metadata(&self) -> Result<Vec<(String, DocumentMetadata)>> {
        let rows = sqlx::query_as::<_, (String, sqlx::types::Json<DocumentMetadata>)>(
            "SELECT doc_id, metadata FROM post_embeddings",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(doc_id, metadata)| (doc_id, metadata.0))
            .collect())
    }
}
