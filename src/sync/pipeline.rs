//! Cursor-based ETL from the board source into the post store

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::source::SourceStore;
use super::types::BatchStats;
use super::types::SyncOptions;
use crate::database::PostBatch;
use crate::database::PostStore;
use crate::models::NewPost;
use crate::models::Post;
use crate::models::Relationship;
use crate::models::SourceRow;
use crate::BoardRagError;
use crate::Result;

/// Resumable copier; the cursor is the highest sequence number already stored
pub struct SyncPipeline {
    store: Arc<dyn PostStore>,
    source: Arc<dyn SourceStore>,
    options: SyncOptions,
}

impl SyncPipeline {
    pub fn new(
        store: Arc<dyn PostStore>,
        source: Arc<dyn SourceStore>,
        options: SyncOptions,
    ) -> Self {
        Self {
            store,
            source,
            options,
        }
    }

    #[must_use]
    pub const fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Fetch up to `limit` source rows after `cursor`
    pub async fn extract(&self, cursor: i64, limit: i64) -> Result<Vec<SourceRow>> {
        self.source
            .rows_after(cursor, limit)
            .await
            .map_err(|e| match e {
                BoardRagError::SourceExtract(_) => e,
                other => BoardRagError::SourceExtract(other.to_string()),
            })
    }

    /// Map a source row onto an insertable post
    #[must_use]
    pub fn translate(row: SourceRow) -> NewPost {
        NewPost {
            source_sequence_no: row.sequence_no,
            content: row.text_body,
            author: row.display_name.unwrap_or_default(),
            timestamp: row.timestamp,
        }
    }

    /// Create sequential edges from `post` to following posts already
    /// visible in the batch. Returns the number of edges written.
    pub async fn link(&self, batch: &mut (dyn PostBatch + '_), post: &Post) -> Result<usize> {
        let following = self
            .source
            .sequence_numbers_after(post.source_sequence_no, i64::from(self.options.link_window))
            .await?;
        if following.is_empty() {
            return Ok(0);
        }

        let present = batch.resolve_ids(&following).await?;
        let mut created = 0;
        for sequence_no in following {
            if let Some(target_id) = present.get(&sequence_no) {
                let relationship = Relationship::sequential(post, *target_id, sequence_no);
                batch.insert_relationship(&relationship).await?;
                created += 1;
            }
        }
        Ok(created)
    }

    /// Sync one batch; returns the number of posts copied, 0 when caught up
    pub async fn sync_batch(&self) -> Result<usize> {
        Ok(self.sync_batch_with_stats().await?.posts)
    }

    pub async fn sync_batch_with_stats(&self) -> Result<BatchStats> {
        let cursor = self.store.max_sequence_no().await?.unwrap_or(0);
        let rows = self
            .extract(cursor, i64::from(self.options.batch_size))
            .await?;
        if rows.is_empty() {
            debug!("No source rows after No.{}", cursor);
            return Ok(BatchStats::default());
        }

        let mut batch = self.store.begin_batch().await?;
        match self.write_batch(batch.as_mut(), rows).await {
            Ok(stats) => {
                batch.commit().await?;
                info!(
                    "Synced {} posts ({} relationships) through No.{}",
                    stats.posts,
                    stats.relationships,
                    stats.last_sequence_no.unwrap_or(cursor)
                );
                Ok(stats)
            }
            Err(e) => {
                error!("Sync batch after No.{} failed, rolling back: {}", cursor, e);
                if let Err(rollback_err) = batch.rollback().await {
                    warn!("Rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }

    async fn write_batch(
        &self,
        batch: &mut (dyn PostBatch + '_),
        rows: Vec<SourceRow>,
    ) -> Result<BatchStats> {
        let mut posts = Vec::with_capacity(rows.len());
        for row in rows {
            posts.push(batch.insert_post(Self::translate(row)).await?);
        }

        // Link after every row is in so forward edges within the batch resolve
        let mut relationships = 0;
        for post in &posts {
            relationships += self.link(batch, post).await?;
        }

        Ok(BatchStats {
            posts: posts.len(),
            relationships,
            last_sequence_no: posts.last().map(|p| p.source_sequence_no),
        })
    }

    /// Sync until the source has nothing new; returns total posts copied
    pub async fn sync_all(&self) -> Result<usize> {
        let mut total = 0;
        loop {
            let count = self.sync_batch().await?;
            if count == 0 {
                break;
            }
            total += count;
        }
        info!("Sync complete: {} posts", total);
        Ok(total)
    }

    /// Sync forever, sleeping between batches, until `stop` fires.
    /// Batch failures are logged and retried after the error backoff.
    pub async fn run_continuous(&self, stop: CancellationToken) -> Result<usize> {
        info!(
            "Starting continuous sync (interval {:?}, error backoff {:?})",
            self.options.interval, self.options.error_backoff
        );

        let mut total = 0;
        loop {
            if stop.is_cancelled() {
                break;
            }

            let pause = match self.sync_batch().await {
                Ok(count) => {
                    total += count;
                    self.options.interval
                }
                Err(e) => {
                    error!("Sync batch failed: {}", e);
                    self.options.error_backoff
                }
            };

            if !Self::sleep_or_stop(pause, &stop).await {
                break;
            }
        }

        info!("Continuous sync stopped after {} posts", total);
        Ok(total)
    }

    /// Returns false when `stop` fired during the sleep
    async fn sleep_or_stop(pause: Duration, stop: &CancellationToken) -> bool {
        tokio::select! {
            () = stop.cancelled() => false,
            () = tokio::time::sleep(pause) => true,
        }
    }
}
