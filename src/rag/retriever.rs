//! Vector retrieval of seed posts

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::database::PostStore;
use crate::index::MatchReference;
use crate::index::VectorIndex;
use crate::BoardRagError;
use crate::Result;

fn retrieval_error(e: BoardRagError) -> BoardRagError {
    match e {
        BoardRagError::Retrieval(_) => e,
        other => BoardRagError::Retrieval(other.to_string()),
    }
}

/// Resolves nearest-neighbor matches to stored post ids
pub struct VectorRetriever {
    index: Arc<dyn VectorIndex>,
    store: Arc<dyn PostStore>,
    top_k: usize,
    window_posts: usize,
}

impl VectorRetriever {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        store: Arc<dyn PostStore>,
        top_k: usize,
        window_posts: usize,
    ) -> Self {
        Self {
            index,
            store,
            top_k,
            window_posts,
        }
    }

    /// Post ids for the top matches, in match order, without duplicates
    pub async fn retrieve(&self, question: &str) -> Result<Vec<Uuid>> {
        let matches = self
            .index
            .similarity_query(question, self.top_k)
            .await
            .map_err(retrieval_error)?;
        debug!("Vector search returned {} matches", matches.len());

        let mut seen = HashSet::new();
        let mut post_ids = Vec::new();

        for found in matches {
            match found.metadata.reference() {
                Some(MatchReference::Post(sequence_no)) => {
                    let post = self
                        .store
                        .post_by_sequence_no(sequence_no)
                        .await
                        .map_err(retrieval_error)?;
                    match post {
                        Some(post) if seen.insert(post.post_id) => post_ids.push(post.post_id),
                        Some(_) => {}
                        None => debug!("Matched No.{} is not in the post store", sequence_no),
                    }
                }
                Some(MatchReference::Window { start, end }) => {
                    let posts = self
                        .store
                        .posts_in_range(start, end, self.window_posts as i64)
                        .await
                        .map_err(retrieval_error)?;
                    for post in posts {
                        if seen.insert(post.post_id) {
                            post_ids.push(post.post_id);
                        }
                    }
                }
                None => debug!("Skipping match {} without a post reference", found.doc_id),
            }
        }

        Ok(post_ids)
    }
}
