//! Incremental vector index maintenance

use std::collections::HashMap;
use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;
use tracing::info;

use super::CheckpointStore;
use super::IndexDocument;
use super::VectorIndex;
use crate::database::PostStore;
use crate::models::IndexCheckpoint;
use crate::models::Post;
use crate::BoardRagError;
use crate::Result;

/// How posts are selected for indexing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMode {
    /// New posts past the checkpoint plus posts edited since it
    Incremental,
    /// Every post, ignoring the checkpoint
    Force,
}

/// Result of one updater run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub new_indexed: usize,
    pub updated: usize,
    pub total_indexed: u64,
}

impl IndexReport {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.new_indexed + self.updated
    }
}

fn into_index_write(e: BoardRagError) -> BoardRagError {
    match e {
        BoardRagError::IndexWrite(_) => e,
        other => BoardRagError::IndexWrite(other.to_string()),
    }
}

/// post_id -> doc_ids currently stored for it
type IndexedPosts = HashMap<String, Vec<String>>;

/// Keeps the vector index at one entry per post
pub struct IndexUpdater {
    store: Arc<dyn PostStore>,
    index: Arc<dyn VectorIndex>,
    checkpoints: CheckpointStore,
    batch_size: usize,
}

impl IndexUpdater {
    pub fn new(
        store: Arc<dyn PostStore>,
        index: Arc<dyn VectorIndex>,
        checkpoints: CheckpointStore,
        batch_size: usize,
    ) -> Self {
        Self {
            store,
            index,
            checkpoints,
            batch_size: batch_size.max(1),
        }
    }

    /// Index new and edited posts, then advance the checkpoint
    pub async fn run(&self, mode: IndexMode) -> Result<IndexReport> {
        let persisted = self.checkpoints.load()?;
        let selection = match mode {
            IndexMode::Force => {
                info!("Force reindex mode: will reindex all posts");
                IndexCheckpoint::default()
            }
            IndexMode::Incremental => {
                info!(
                    "Incremental update from post No.{}",
                    persisted.last_processed_sequence_no + 1
                );
                persisted.clone()
            }
        };

        let mut indexed = self.scan_index().await?;
        info!("Found {} posts already indexed", indexed.len());

        let mut max_updated_at: Option<DateTime<Utc>> = None;
        let mut report = IndexReport::default();

        if let Some(since) = selection.last_processed_timestamp {
            let edited = self
                .store
                .posts_updated_since(selection.last_processed_sequence_no, since)
                .await
                .map_err(into_index_write)?;

            if !edited.is_empty() {
                info!("Found {} updated posts to reindex", edited.len());
            }
            for chunk in edited.chunks(self.batch_size) {
                self.index_posts(chunk, &mut indexed).await?;
                report.updated += chunk.len();
                max_updated_at = max_updated_at.max(latest_update(chunk));
            }
        }

        let mut cursor = selection.last_processed_sequence_no;
        loop {
            let posts = self
                .store
                .posts_after(cursor, self.batch_size as i64)
                .await
                .map_err(into_index_write)?;
            let Some(last) = posts.last() else {
                break;
            };
            cursor = last.source_sequence_no;

            self.index_posts(&posts, &mut indexed).await?;
            report.new_indexed += posts.len();
            max_updated_at = max_updated_at.max(latest_update(&posts));
            info!(
                "Progress: {} new posts indexed (through No.{})",
                report.new_indexed, cursor
            );

            if posts.len() < self.batch_size {
                break;
            }
        }

        if report.total() == 0 {
            info!("No new or updated posts to index");
            report.total_indexed = persisted.total_indexed;
            return Ok(report);
        }

        let checkpoint = IndexCheckpoint {
            last_processed_sequence_no: persisted.last_processed_sequence_no.max(cursor),
            last_processed_timestamp: persisted.last_processed_timestamp.max(max_updated_at),
            total_indexed: indexed.len() as u64,
            last_update: Some(Utc::now()),
        };
        self.checkpoints.save(&checkpoint)?;

        report.total_indexed = checkpoint.total_indexed;
        info!(
            "Index update completed: {} new, {} updated, {} total in index",
            report.new_indexed, report.updated, report.total_indexed
        );
        Ok(report)
    }

    async fn scan_index(&self) -> Result<IndexedPosts> {
        let entries = self
            .index
            .enumerate_metadata()
            .await
            .map_err(|e| BoardRagError::IndexWrite(format!("Failed to scan index metadata: {e}")))?;

        let mut indexed = IndexedPosts::new();
        for (doc_id, metadata) in entries {
            if let Some(post_id) = metadata.post_id {
                indexed.entry(post_id).or_default().push(doc_id);
            }
        }
        Ok(indexed)
    }

    /// Drop every stored entry for these posts, then upsert fresh ones
    async fn index_posts(&self, posts: &[Post], indexed: &mut IndexedPosts) -> Result<()> {
        let stale: Vec<String> = posts
            .iter()
            .filter_map(|post| indexed.get(&post.post_id.to_string()))
            .flatten()
            .cloned()
            .collect();

        if !stale.is_empty() {
            self.index.delete(&stale).await.map_err(into_index_write)?;
            info!("Deleted {} old document versions", stale.len());
        }

        let documents: Vec<IndexDocument> = posts.iter().map(IndexDocument::from_post).collect();
        self.index
            .upsert(&documents)
            .await
            .map_err(into_index_write)?;

        for document in documents {
            indexed.insert(document.doc_id.clone(), vec![document.doc_id]);
        }
        Ok(())
    }
}

fn latest_update(posts: &[Post]) -> Option<DateTime<Utc>> {
    posts.iter().map(|post| post.updated_at).max()
}
