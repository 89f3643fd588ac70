//! Post store tests against a real PostgreSQL with pgvector.
//!
//! Run with `cargo test -- --ignored` after pointing config.toml at a
//! disposable database.

use boardrag::database::Database;
use boardrag::database::PostBatch;
use boardrag::database::PostStore;
use boardrag::models::NewPost;
use boardrag::models::Relationship;
use boardrag::models::RelationshipType;
use boardrag::AppConfig;
use boardrag::Result;
use chrono::TimeZone;
use chrono::Utc;

/// Sequence numbers far above anything a real board produces
const BASE: i64 = 9_000_000_000;

async fn setup_test_db() -> Result<Database> {
    let config = AppConfig::load()?;
    let db = Database::from_config(&config).await?;
    db.init_schema(config.embedding_dimension()).await?;
    cleanup(&db).await?;
    Ok(db)
}

async fn cleanup(db: &Database) -> Result<()> {
    sqlx::query("DELETE FROM posts WHERE source_sequence_no >= $1")
        .bind(BASE)
        .execute(db.pool())
        .await?;
    Ok(())
}

fn new_post(offset: i64) -> NewPost {
    NewPost {
        source_sequence_no: BASE + offset,
        content: format!("integration post {offset}"),
        author: String::new(),
        timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL with pgvector"]
async fn test_rolled_back_batch_leaves_no_rows() -> Result<()> {
    let db = setup_test_db().await?;

    let mut batch = db.begin_batch().await?;
    batch.insert_post(new_post(1)).await?;
    batch.insert_post(new_post(2)).await?;
    batch.rollback().await?;

    assert!(db.post_by_sequence_no(BASE + 1).await?.is_none());
    Ok(())
}

#[tokio::test]
#[ignore = "requires PostgreSQL with pgvector"]
async fn test_committed_batch_with_relationship() -> Result<()> {
    let db = setup_test_db().await?;

    let mut batch = db.begin_batch().await?;
    let first = batch.insert_post(new_post(1)).await?;
    let second = batch.insert_post(new_post(3)).await?;

    let ids = batch.resolve_ids(&[BASE + 3, BASE + 4]).await?;
    assert_eq!(ids.len(), 1);
    assert_eq!(ids[&(BASE + 3)], second.post_id);

    let edge = Relationship::sequential(&first, second.post_id, BASE + 3);
    batch.insert_relationship(&edge).await?;
    // Duplicate edges are ignored
    batch.insert_relationship(&edge).await?;
    batch.commit().await?;

    let stored = db.post_by_sequence_no(BASE + 1).await?.unwrap();
    assert_eq!(stored.post_id, first.post_id);
    assert_eq!(stored.author.as_deref(), Some(""));

    let relationships = db.relationships_touching(&[first.post_id]).await?;
    assert_eq!(relationships.len(), 1);
    assert_eq!(relationships[0].relationship_type, RelationshipType::Sequential);
    assert_eq!(relationships[0].distance(), Some(2));

    let range = db.posts_in_range(BASE, BASE + 10, 5).await?;
    let numbers: Vec<i64> = range.iter().map(|p| p.source_sequence_no).collect();
    assert_eq!(numbers, vec![BASE + 1, BASE + 3]);

    assert_eq!(db.max_sequence_no().await?, Some(BASE + 3));

    cleanup(&db).await?;
    Ok(())
}

#[tokio::test]
#[ignore = "requires PostgreSQL with pgvector"]
async fn test_reinserted_post_bumps_updated_at_only_on_change() -> Result<()> {
    let db = setup_test_db().await?;

    let mut batch = db.begin_batch().await?;
    let first = batch.insert_post(new_post(5)).await?;
    batch.commit().await?;

    let mut batch = db.begin_batch().await?;
    let same = batch.insert_post(new_post(5)).await?;
    batch.commit().await?;
    assert_eq!(same.post_id, first.post_id);
    assert_eq!(same.updated_at, first.updated_at);

    let mut edited = new_post(5);
    edited.content = "integration post 5 (edited)".to_string();
    let mut batch = db.begin_batch().await?;
    let changed = batch.insert_post(edited).await?;
    batch.commit().await?;
    assert_eq!(changed.post_id, first.post_id);
    assert!(changed.updated_at > first.updated_at);

    cleanup(&db).await?;
    Ok(())
}
