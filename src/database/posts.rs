use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use super::Database;
use crate::models::IndexStatus;
use crate::models::Post;
use crate::Result;

const POST_COLUMNS: &str =
    "post_id, source_sequence_no, content, author, timestamp, created_at, updated_at";

impl Database {
    /// Highest synced sequence number
    pub async fn get_max_sequence_no(&self) -> Result<Option<i64>> {
        let max = sqlx::query_scalar::<_, Option<i64>>(
            "SELECT MAX(source_sequence_no) FROM posts",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(max)
    }

    /// Get a post by its source sequence number
    pub async fn get_post_by_sequence_no(&self, sequence_no: i64) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE source_sequence_no = $1"
        ))
        .bind(sequence_no)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    pub async fn get_posts_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Post>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let posts = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE post_id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    /// Posts inside an inclusive sequence window, ascending
    pub async fn get_posts_in_range(&self, start: i64, end: i64, limit: i64) -> Result<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            r"
            SELECT {POST_COLUMNS} FROM posts
            WHERE source_sequence_no BETWEEN $1 AND $2
            ORDER BY source_sequence_no ASC
            LIMIT $3
            "
        ))
        .bind(start)
        .bind(end)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    /// Keyset page of posts after a sequence number
    pub async fn get_posts_after(&self, after: i64, limit: i64) -> Result<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            r"
            SELECT {POST_COLUMNS} FROM posts
            WHERE source_sequence_no > $1
            ORDER BY source_sequence_no ASC
            LIMIT $2
            "
        ))
        .bind(after)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    /// Already-indexed posts edited after `since`
    pub async fn get_posts_updated_since(
        &self,
        through: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            r"
            SELECT {POST_COLUMNS} FROM posts
            WHERE source_sequence_no <= $1 AND updated_at > $2
            ORDER BY source_sequence_no ASC
            "
        ))
        .bind(through)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    /// Post counts and sequence bounds for the status probe
    pub async fn get_index_status(&self) -> Result<IndexStatus> {
        let (total_posts, min_seq, max_seq, last_sync_time) = sqlx::query_as::<
            _,
            (i64, Option<i64>, Option<i64>, Option<DateTime<Utc>>),
        >(
            r"
            SELECT COUNT(*), MIN(source_sequence_no), MAX(source_sequence_no), MAX(created_at)
            FROM posts
            ",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(IndexStatus {
            total_posts,
            min_seq: min_seq.unwrap_or(0),
            max_seq: max_seq.unwrap_or(0),
            last_sync_time,
        })
    }
}
