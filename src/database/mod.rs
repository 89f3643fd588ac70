use std::collections::HashMap;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::IndexStatus;
use crate::models::NewPost;
use crate::models::Post;
use crate::models::Relationship;
use crate::Result;

mod batch;
mod posts;
mod relationships;
mod schema;

pub use batch::PgPostBatch;

/// Read side of the post+relationship store
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Highest synced source sequence number, `None` when the store is empty
    async fn max_sequence_no(&self) -> Result<Option<i64>>;

    async fn post_by_sequence_no(&self, sequence_no: i64) -> Result<Option<Post>>;

    /// Posts for the given ids, in no particular order
    async fn posts_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Post>>;

    /// Up to `limit` posts with `start <= seq <= end`, ascending
    async fn posts_in_range(&self, start: i64, end: i64, limit: i64) -> Result<Vec<Post>>;

    /// Up to `limit` posts with `seq > after`, ascending
    async fn posts_after(&self, after: i64, limit: i64) -> Result<Vec<Post>>;

    /// Posts with `seq <= through` edited after `since`, ascending
    async fn posts_updated_since(&self, through: i64, since: DateTime<Utc>) -> Result<Vec<Post>>;

    /// Every relationship with either endpoint in `ids`
    async fn relationships_touching(&self, ids: &[Uuid]) -> Result<Vec<Relationship>>;

    async fn status(&self) -> Result<IndexStatus>;

    /// Open an all-or-nothing write batch
    async fn begin_batch(&self) -> Result<Box<dyn PostBatch + '_>>;
}

/// Transactional writes; nothing is visible to readers until `commit`
#[async_trait]
pub trait PostBatch: Send {
    async fn insert_post(&mut self, post: NewPost) -> Result<Post>;

    /// Map of sequence number to post id for the numbers present locally,
    /// including rows inserted earlier in this batch
    async fn resolve_ids(&mut self, sequence_nos: &[i64]) -> Result<HashMap<i64, Uuid>>;

    /// Insert unless an edge with the same (source, target, type) exists
    async fn insert_relationship(&mut self, relationship: &Relationship) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Database connection pool wrapper
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new database instance from configuration
    pub async fn from_config(config: &crate::config::AppConfig) -> Result<Self> {
        let pool_options = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections())
            .min_connections(config.min_connections())
            .acquire_timeout(std::time::Duration::from_secs(config.connection_timeout()));

        let pool = pool_options.connect(config.database_url()).await?;

        tracing::info!(
            "Database pool configured: max_connections={}, min_connections={}",
            config.max_connections(),
            config.min_connections()
        );

        Ok(Self::new(pool))
    }

    /// Get a reference to the database pool for raw queries
    #[must_use]
    pub const fn pool(&self) -> &sqlx::PgPool {
        &self.pool
    }
}

#[async_trait]
impl PostStore for Database {
    async fn max_sequence_no(&self) -> Result<Option<i64>> {
        self.get_max_sequence_no().await
    }

    async fn post_by_sequence_no(&self, sequence_no: i64) -> Result<Option<Post>> {
        self.get_post_by_sequence_no(sequence_no).await
    }

    async fn posts_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Post>> {
        self.get_posts_by_ids(ids).await
    }

    async fn posts_in_range(&self, start: i64, end: i64, limit: i64) -> Result<Vec<Post>> {
        self.get_posts_in_range(start, end, limit).await
    }

    async fn posts_after(&self, after: i64, limit: i64) -> Result<Vec<Post>> {
        self.get_posts_after(after, limit).await
    }

    async fn posts_updated_since(&self, through: i64, since: DateTime<Utc>) -> Result<Vec<Post>> {
        self.get_posts_updated_since(through, since).await
    }

    async fn relationships_touching(&self, ids: &[Uuid]) -> Result<Vec<Relationship>> {
        self.get_relationships_touching(ids).await
    }

    async fn status(&self) -> Result<IndexStatus> {
        self.get_index_status().await
    }

    async fn begin_batch(&self) -> Result<Box<dyn PostBatch + '_>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgPostBatch::new(tx)))
    }
}
