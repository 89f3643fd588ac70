//! In-memory stand-ins for the stores and services, plus pipeline tests
//! that run end to end without Postgres or a model server.


use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Duration;
use chrono::TimeZone;
use chrono::Utc;
use uuid::Uuid;

use crate::database::PostBatch;
use crate::database::PostStore;
use crate::index::DocumentMetadata;
use crate::index::IndexDocument;
use crate::index::VectorIndex;
use crate::index::VectorMatch;
use crate::llm::ChatCompletion;
use crate::llm::ChatMessage;
use crate::llm::StreamingResponse;
use crate::models::IndexStatus;
use crate::models::NewPost;
use crate::models::Post;
use crate::models::Relationship;
use crate::models::SourceRow;
use crate::sync::SourceStore;
use crate::BoardRagError;
use crate::Result;

/// Fixed base time so timestamps are reproducible
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

/// A post as the sync would have stored it
pub fn make_post(sequence_no: i64, content: &str, author: Option<&str>) -> Post {
    let timestamp = base_time() + Duration::minutes(sequence_no);
    Post {
        post_id: Uuid::new_v4(),
        source_sequence_no: sequence_no,
        content: content.to_string(),
        author: author.map(str::to_string),
        timestamp,
        created_at: timestamp,
        updated_at: timestamp,
    }
}

pub fn source_row(sequence_no: i64) -> SourceRow {
    SourceRow {
        sequence_no,
        display_name: (sequence_no % 2 == 0).then(|| format!("user{sequence_no}")),
        timestamp: base_time() + Duration::minutes(sequence_no),
        opaque_id: Some(format!("ID:{sequence_no:04}")),
        text_body: format!("本文 {sequence_no}"),
    }
}

// ====== Post store ======

#[derive(Default)]
struct StoreState {
    posts: BTreeMap<i64, Post>,
    relationships: Vec<Relationship>,
}

/// `PostStore` over a `BTreeMap`; batches stage writes until commit
#[derive(Default)]
pub struct FakeStore {
    state: Mutex<StoreState>,
    fail_insert_at: Mutex<Option<i64>>,
    fail_reads: Mutex<bool>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_posts(posts: Vec<Post>) -> Self {
        let store = Self::new();
        for post in posts {
            store.put(post);
        }
        store
    }

    pub fn put(&self, post: Post) {
        let mut state = self.state.lock().unwrap();
        state.posts.insert(post.source_sequence_no, post);
    }

    pub fn add_relationship(&self, relationship: Relationship) {
        self.state.lock().unwrap().relationships.push(relationship);
    }

    /// Simulate an upstream edit after ingest
    pub fn edit(&self, sequence_no: i64, content: &str, updated_at: DateTime<Utc>) {
        let mut state = self.state.lock().unwrap();
        let post = state.posts.get_mut(&sequence_no).unwrap();
        post.content = content.to_string();
        post.updated_at = updated_at;
    }

    /// Make `insert_post` fail for this sequence number
    pub fn fail_insert_at(&self, sequence_no: Option<i64>) {
        *self.fail_insert_at.lock().unwrap() = sequence_no;
    }

    pub fn fail_reads(&self, fail: bool) {
        *self.fail_reads.lock().unwrap() = fail;
    }

    pub fn sequence_numbers(&self) -> Vec<i64> {
        self.state.lock().unwrap().posts.keys().copied().collect()
    }

    pub fn post(&self, sequence_no: i64) -> Post {
        self.state.lock().unwrap().posts[&sequence_no].clone()
    }

    pub fn posts(&self) -> Vec<Post> {
        self.state.lock().unwrap().posts.values().cloned().collect()
    }

    pub fn relationships(&self) -> Vec<Relationship> {
        self.state.lock().unwrap().relationships.clone()
    }

    /// Target sequence numbers of every edge leaving `sequence_no`
    pub fn linked_from(&self, sequence_no: i64) -> Vec<i64> {
        let state = self.state.lock().unwrap();
        let source_id = state.posts[&sequence_no].post_id;
        let by_id: HashMap<Uuid, i64> = state
            .posts
            .values()
            .map(|p| (p.post_id, p.source_sequence_no))
            .collect();
        let mut targets: Vec<i64> = state
            .relationships
            .iter()
            .filter(|r| r.source_id == source_id)
            .filter_map(|r| by_id.get(&r.target_id).copied())
            .collect();
        targets.sort_unstable();
        targets
    }

    fn check_reads(&self) -> Result<()> {
        if *self.fail_reads.lock().unwrap() {
            return Err(BoardRagError::Custom("post store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PostStore for FakeStore {
    async fn max_sequence_no(&self) -> Result<Option<i64>> {
        self.check_reads()?;
        Ok(self.state.lock().unwrap().posts.keys().next_back().copied())
    }

    async fn post_by_sequence_no(&self, sequence_no: i64) -> Result<Option<Post>> {
        self.check_reads()?;
        Ok(self.state.lock().unwrap().posts.get(&sequence_no).cloned())
    }

    async fn posts_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Post>> {
        self.check_reads()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .posts
            .values()
            .filter(|p| ids.contains(&p.post_id))
            .cloned()
            .collect())
    }

    async fn posts_in_range(&self, start: i64, end: i64, limit: i64) -> Result<Vec<Post>> {
        self.check_reads()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .posts
            .range(start..=end)
            .take(limit as usize)
            .map(|(_, p)| p.clone())
            .collect())
    }

    async fn posts_after(&self, after: i64, limit: i64) -> Result<Vec<Post>> {
        self.check_reads()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .posts
            .range(after + 1..)
            .take(limit as usize)
            .map(|(_, p)| p.clone())
            .collect())
    }

    async fn posts_updated_since(&self, through: i64, since: DateTime<Utc>) -> Result<Vec<Post>> {
        self.check_reads()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .posts
            .range(..=through)
            .map(|(_, p)| p)
            .filter(|p| p.updated_at > since)
            .cloned()
            .collect())
    }

    async fn relationships_touching(&self, ids: &[Uuid]) -> Result<Vec<Relationship>> {
        self.check_reads()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .relationships
            .iter()
            .filter(|r| ids.contains(&r.source_id) || ids.contains(&r.target_id))
            .cloned()
            .collect())
    }

    async fn status(&self) -> Result<IndexStatus> {
        self.check_reads()?;
        let state = self.state.lock().unwrap();
        Ok(IndexStatus {
            total_posts: state.posts.len() as i64,
            min_seq: state.posts.keys().next().copied().unwrap_or(0),
            max_seq: state.posts.keys().next_back().copied().unwrap_or(0),
            last_sync_time: state.posts.values().map(|p| p.created_at).max(),
        })
    }

    async fn begin_batch(&self) -> Result<Box<dyn PostBatch + '_>> {
        Ok(Box::new(FakeBatch {
            store: self,
            posts: BTreeMap::new(),
            relationships: Vec::new(),
        }))
    }
}

/// Staged writes; dropped on rollback
pub struct FakeBatch<'a> {
    store: &'a FakeStore,
    posts: BTreeMap<i64, Post>,
    relationships: Vec<Relationship>,
}

#[async_trait]
impl PostBatch for FakeBatch<'_> {
    async fn insert_post(&mut self, post: NewPost) -> Result<Post> {
        if *self.store.fail_insert_at.lock().unwrap() == Some(post.source_sequence_no) {
            return Err(BoardRagError::Commit(format!(
                "insert of No.{} rejected",
                post.source_sequence_no
            )));
        }

        let now = Utc::now();
        let existing = self.posts.get(&post.source_sequence_no).cloned().or_else(|| {
            let state = self.store.state.lock().unwrap();
            let committed = state.posts.get(&post.source_sequence_no).cloned();
            committed
        });
        let author = Some(post.author);
        let stored = match existing {
            // Re-delivered row: same id, `updated_at` moves only on a real change
            Some(previous) => Post {
                updated_at: if previous.content == post.content && previous.author == author {
                    previous.updated_at
                } else {
                    now
                },
                content: post.content,
                author,
                ..previous
            },
            None => Post {
                post_id: Uuid::new_v4(),
                source_sequence_no: post.source_sequence_no,
                content: post.content,
                author,
                timestamp: post.timestamp,
                created_at: now,
                updated_at: now,
            },
        };
        self.posts.insert(stored.source_sequence_no, stored.clone());
        Ok(stored)
    }

    async fn resolve_ids(&mut self, sequence_nos: &[i64]) -> Result<HashMap<i64, Uuid>> {
        let state = self.store.state.lock().unwrap();
        Ok(sequence_nos
            .iter()
            .filter_map(|no| {
                self.posts
                    .get(no)
                    .or_else(|| state.posts.get(no))
                    .map(|p| (*no, p.post_id))
            })
            .collect())
    }

    async fn insert_relationship(&mut self, relationship: &Relationship) -> Result<()> {
        let duplicate = |r: &Relationship| {
            r.source_id == relationship.source_id
                && r.target_id == relationship.target_id
                && r.relationship_type == relationship.relationship_type
        };
        let exists = self.relationships.iter().any(duplicate)
            || self.store.state.lock().unwrap().relationships.iter().any(duplicate);
        if !exists {
            self.relationships.push(relationship.clone());
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let FakeBatch {
            store,
            posts,
            relationships,
        } = *self;
        let mut state = store.state.lock().unwrap();
        state.posts.extend(posts);
        state.relationships.extend(relationships);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

// ====== Board source ======

/// Append-only source; failures can be switched on and off
#[derive(Default)]
pub struct FakeSource {
    rows: Mutex<Vec<SourceRow>>,
    fail: Mutex<bool>,
}

impl FakeSource {
    pub fn with_range(first: i64, last: i64) -> Self {
        let source = Self::default();
        source.append(first, last);
        source
    }

    pub fn append(&self, first: i64, last: i64) {
        self.rows
            .lock()
            .unwrap()
            .extend((first..=last).map(source_row));
    }

    pub fn fail(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    fn check(&self) -> Result<()> {
        if *self.fail.lock().unwrap() {
            return Err(BoardRagError::SourceExtract("source offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SourceStore for FakeSource {
    async fn rows_after(&self, cursor: i64, limit: i64) -> Result<Vec<SourceRow>> {
        self.check()?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.sequence_no > cursor)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn sequence_numbers_after(&self, sequence_no: i64, limit: i64) -> Result<Vec<i64>> {
        self.check()?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.sequence_no)
            .filter(|no| *no > sequence_no)
            .take(limit as usize)
            .collect())
    }
}

// ====== Vector index ======

/// Map-backed index; similarity results are scripted per test
#[derive(Default)]
pub struct FakeVectorIndex {
    documents: Mutex<BTreeMap<String, IndexDocument>>,
    matches: Mutex<Vec<VectorMatch>>,
    upserts_before_failure: Mutex<Option<usize>>,
    fail_scan: Mutex<bool>,
    fail_query: Mutex<bool>,
    upsert_calls: AtomicUsize,
}

impl FakeVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document directly, bypassing upsert accounting
    pub fn seed(&self, doc_id: &str, metadata: DocumentMetadata) {
        self.documents.lock().unwrap().insert(
            doc_id.to_string(),
            IndexDocument {
                doc_id: doc_id.to_string(),
                text: String::new(),
                metadata,
            },
        );
    }

    pub fn script_matches(&self, matches: Vec<VectorMatch>) {
        *self.matches.lock().unwrap() = matches;
    }

    /// Let `n` upsert calls succeed, then fail every later one
    pub fn fail_upserts_after(&self, n: usize) {
        *self.upserts_before_failure.lock().unwrap() = Some(n);
    }

    pub fn fail_scan(&self, fail: bool) {
        *self.fail_scan.lock().unwrap() = fail;
    }

    pub fn fail_query(&self, fail: bool) {
        *self.fail_query.lock().unwrap() = fail;
    }

    pub fn len(&self) -> usize {
        self.documents.lock().unwrap().len()
    }

    pub fn text_of(&self, doc_id: &str) -> Option<String> {
        self.documents
            .lock()
            .unwrap()
            .get(doc_id)
            .map(|d| d.text.clone())
    }

    /// Number of stored documents pointing at `post_id`
    pub fn entries_for(&self, post_id: Uuid) -> usize {
        let post_id = post_id.to_string();
        self.documents
            .lock()
            .unwrap()
            .values()
            .filter(|d| d.metadata.post_id.as_deref() == Some(post_id.as_str()))
            .count()
    }
}

/// A match that points at one post by sequence number
pub fn post_match(sequence_no: i64, score: f64) -> VectorMatch {
    VectorMatch {
        doc_id: format!("doc-{sequence_no}"),
        text: String::new(),
        metadata: DocumentMetadata {
            source_sequence_no: Some(sequence_no),
            ..DocumentMetadata::default()
        },
        score,
    }
}

/// A match that points at a sequence window
pub fn window_match(start: i64, end: i64, score: f64) -> VectorMatch {
    VectorMatch {
        doc_id: format!("window-{start}-{end}"),
        text: String::new(),
        metadata: DocumentMetadata {
            start_no: Some(start),
            end_no: Some(end),
            ..DocumentMetadata::default()
        },
        score,
    }
}

#[async_trait]
impl VectorIndex for FakeVectorIndex {
    async fn upsert(&self, documents: &[IndexDocument]) -> Result<()> {
        let call = self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(limit) = *self.upserts_before_failure.lock().unwrap() {
            if call >= limit {
                return Err(BoardRagError::EmbeddingError("embedding service down".to_string()));
            }
        }
        let mut stored = self.documents.lock().unwrap();
        for document in documents {
            stored.insert(document.doc_id.clone(), document.clone());
        }
        Ok(())
    }

    async fn similarity_query(&self, _text: &str, k: usize) -> Result<Vec<VectorMatch>> {
        if *self.fail_query.lock().unwrap() {
            return Err(BoardRagError::Custom("vector index unavailable".to_string()));
        }
        Ok(self.matches.lock().unwrap().iter().take(k).cloned().collect())
    }

    async fn delete(&self, doc_ids: &[String]) -> Result<()> {
        let mut stored = self.documents.lock().unwrap();
        for doc_id in doc_ids {
            stored.remove(doc_id);
        }
        Ok(())
    }

    async fn enumerate_metadata(&self) -> Result<Vec<(String, DocumentMetadata)>> {
        if *self.fail_scan.lock().unwrap() {
            return Err(BoardRagError::Custom("metadata scan failed".to_string()));
        }
        Ok(self
            .documents
            .lock()
            .unwrap()
            .values()
            .map(|d| (d.doc_id.clone(), d.metadata.clone()))
            .collect())
    }
}

// ====== Chat ======

/// Scripted chat model that records the prompts it saw
#[derive(Default)]
pub struct FakeChat {
    tokens: Vec<String>,
    /// Fail after emitting this many tokens
    fail_after: Option<usize>,
    prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl FakeChat {
    pub fn answering(tokens: &[&str]) -> Self {
        Self {
            tokens: tokens.iter().map(|t| (*t).to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn failing_after(tokens: &[&str], fail_after: usize) -> Self {
        Self {
            fail_after: Some(fail_after),
            ..Self::answering(tokens)
        }
    }

    pub fn prompts(&self) -> Vec<Vec<ChatMessage>> {
        self.prompts.lock().unwrap().clone()
    }

    fn scripted(&self) -> Vec<Result<String>> {
        let mut out: Vec<Result<String>> = Vec::new();
        for (i, token) in self.tokens.iter().enumerate() {
            if self.fail_after == Some(i) {
                out.push(Err(BoardRagError::HttpError("connection reset".to_string())));
                return out;
            }
            out.push(Ok(token.clone()));
        }
        if self.fail_after.is_some_and(|n| n >= self.tokens.len()) {
            out.push(Err(BoardRagError::HttpError("connection reset".to_string())));
        }
        out
    }
}

#[async_trait]
impl ChatCompletion for FakeChat {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        let mut answer = String::new();
        for token in self.scripted() {
            answer.push_str(&token?);
        }
        Ok(answer)
    }

    async fn stream(&self, messages: &[ChatMessage]) -> Result<StreamingResponse> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        Ok(StreamingResponse::from_tokens(self.scripted()))
    }
}

/// Shared handles for a store, index and chat wired into one service
pub struct Harness {
    pub store: Arc<FakeStore>,
    pub index: Arc<FakeVectorIndex>,
    pub chat: Arc<FakeChat>,
}

impl Harness {
    pub fn new(store: FakeStore, chat: FakeChat) -> Self {
        Self {
            store: Arc::new(store),
            index: Arc::new(FakeVectorIndex::new()),
            chat: Arc::new(chat),
        }
    }

    pub fn rag_service(&self) -> Arc<crate::rag::RagService> {
        let config = crate::config::RagConfig {
            token_poll_interval_ms: 10,
            ..crate::config::RagConfig::default()
        };
        Arc::new(crate::rag::RagService::from_services(
            self.store.clone(),
            self.index.clone(),
            self.chat.clone(),
            &config,
        ))
    }
}
