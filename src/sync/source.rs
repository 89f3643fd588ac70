//! Read-only access to the upstream board table

use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::SourceRow;
use crate::BoardRagError;
use crate::Result;

/// Append-only source of board rows
#[async_trait]
pub trait SourceStore: Send + Sync {
    /// Up to `limit` rows with sequence number > `cursor`, ascending
    async fn rows_after(&self, cursor: i64, limit: i64) -> Result<Vec<SourceRow>>;

    /// Sequence numbers of the next `limit` rows after `sequence_no`
    async fn sequence_numbers_after(&self, sequence_no: i64, limit: i64) -> Result<Vec<i64>>;
}

fn extract_error(e: sqlx::Error) -> BoardRagError {
    BoardRagError::SourceExtract(e.to_string())
}

/// Source backed by the board's Postgres `res` table
#[derive(Debug, Clone)]
pub struct PgSource {
    pool: PgPool,
}

impl PgSource {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to the source database from configuration
    pub async fn from_config(config: &crate::AppConfig) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.source.max_connections)
            .acquire_timeout(std::time::Duration::from_secs(config.connection_timeout()))
            .connect(config.source_url())
            .await
            .map_err(extract_error)?;

        tracing::info!(
            "Source pool configured: max_connections={}",
            config.source.max_connections
        );
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl SourceStore for PgSource {
    async fn rows_after(&self, cursor: i64, limit: i64) -> Result<Vec<SourceRow>> {
        sqlx::query_as::<_, SourceRow>(
            r"
            SELECT no, name_and_trip, datetime, id, main_text
            FROM public.res
            WHERE no > $1
            ORDER BY no ASC
            LIMIT $2
            ",
        )
        .bind(cursor)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(extract_error)
    }

    async fn sequence_numbers_after(&self, sequence_no: i64, limit: i64) -> Result<Vec<i64>> {
        sqlx::query_scalar::<_, i64>(
            "SELECT no FROM public.res WHERE no > $1 ORDER BY no ASC LIMIT $2",
        )
        .bind(sequence_no)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(extract_error)
    }
}
