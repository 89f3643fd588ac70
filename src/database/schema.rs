use super::Database;
use crate::BoardRagError;
use crate::Result;

const REQUIRED_TABLES: [&str; 3] = ["posts", "relationships", "post_embeddings"];

const SECONDARY_INDEXES: [&str; 3] = [
    "CREATE INDEX IF NOT EXISTS idx_posts_updated_at ON posts(updated_at)",
    "CREATE INDEX IF NOT EXISTS idx_relationships_target ON relationships(target_id)",
    "CREATE INDEX IF NOT EXISTS idx_post_embeddings_post_id \
     ON post_embeddings((metadata->>'post_id'))",
];

impl Database {
    /// True when every table this crate owns exists in `public`
    pub async fn is_schema_initialized(&self) -> Result<bool> {
        let present: Vec<String> = sqlx::query_scalar(
            r"
            SELECT table_name::text FROM information_schema.tables
            WHERE table_schema = 'public' AND table_name = ANY($1)
            ",
        )
        .bind(&REQUIRED_TABLES[..])
        .fetch_all(&self.pool)
        .await?;

        let missing: Vec<&str> = REQUIRED_TABLES
            .into_iter()
            .filter(|table| !present.iter().any(|p| p == table))
            .collect();
        if !missing.is_empty() {
            tracing::debug!("Missing tables: {}", missing.join(", "));
        }
        Ok(missing.is_empty())
    }

    /// Fail with a hint to run `boardrag init` when tables are missing
    pub async fn verify_schema_or_error(&self) -> Result<()> {
        if self.is_schema_initialized().await? {
            Ok(())
        } else {
            Err(BoardRagError::Custom(
                "Database schema is missing; run `boardrag init` first".to_string(),
            ))
        }
    }

    /// Initialize database schema; every statement is idempotent
    pub async fn init_schema(&self, embedding_dimension: usize) -> Result<()> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS posts (
                post_id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                source_sequence_no BIGINT UNIQUE NOT NULL,
                content TEXT NOT NULL,
                author TEXT,
                timestamp TIMESTAMPTZ NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS relationships (
                source_id UUID NOT NULL REFERENCES posts(post_id) ON DELETE CASCADE,
                target_id UUID NOT NULL REFERENCES posts(post_id) ON DELETE CASCADE,
                relationship_type TEXT NOT NULL,
                properties JSONB NOT NULL DEFAULT '{}'::jsonb,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                PRIMARY KEY (source_id, target_id, relationship_type)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // Dimension is a config value, not user input
        sqlx::query(&format!(
            r"
            CREATE TABLE IF NOT EXISTS post_embeddings (
                doc_id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                metadata JSONB NOT NULL DEFAULT '{{}}'::jsonb,
                embedding VECTOR({embedding_dimension}) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "
        ))
        .execute(&self.pool)
        .await?;

        self.create_indexes().await?;

        Ok(())
    }

    async fn create_indexes(&self) -> Result<()> {
        for statement in SECONDARY_INDEXES {
            sqlx::query(statement).execute(&self.pool).await?;
        }

        // HNSW needs pgvector >= 0.5; older servers fall back to sequential scans
        if let Err(e) = sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_post_embeddings_hnsw \
             ON post_embeddings USING hnsw (embedding vector_cosine_ops)",
        )
        .execute(&self.pool)
        .await
        {
            tracing::warn!("Skipping HNSW index on post_embeddings: {}", e);
        }
        Ok(())
    }

    /// Drop every table owned by this crate
    pub async fn drop_schema(&self) -> Result<()> {
        sqlx::query("DROP TABLE IF EXISTS post_embeddings, relationships, posts CASCADE")
            .execute(&self.pool)
            .await?;
        tracing::info!("Dropped boardrag tables");
        Ok(())
    }
}
