//! Bounded graph expansion around seed posts

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use super::GraphContext;
use super::GraphStats;
use crate::database::PostStore;
use crate::models::RelationshipType;
use crate::BoardRagError;
use crate::Result;

/// Expands seed posts into a contextual neighborhood
#[async_trait]
pub trait GraphContextBuilder: Send + Sync {
    async fn build(&self, seeds: &[Uuid], max_depth: usize, max_nodes: usize)
        -> Result<GraphContext>;
}

fn traversal_error(e: BoardRagError) -> BoardRagError {
    match e {
        BoardRagError::Traversal(_) => e,
        other => BoardRagError::Traversal(other.to_string()),
    }
}

/// Breadth-first walk over stored relationships, both directions
pub struct RelationshipGraphBuilder {
    store: Arc<dyn PostStore>,
}

impl RelationshipGraphBuilder {
    pub fn new(store: Arc<dyn PostStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl GraphContextBuilder for RelationshipGraphBuilder {
    async fn build(
        &self,
        seeds: &[Uuid],
        max_depth: usize,
        max_nodes: usize,
    ) -> Result<GraphContext> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        for &seed in seeds {
            if order.len() >= max_nodes {
                break;
            }
            if seen.insert(seed) {
                order.push(seed);
            }
        }

        let mut traversed: HashSet<(Uuid, Uuid, RelationshipType)> = HashSet::new();
        let mut depth_reached = 0;
        let mut frontier = order.clone();

        for depth in 1..=max_depth {
            if frontier.is_empty() || order.len() >= max_nodes {
                break;
            }

            let relationships = self
                .store
                .relationships_touching(&frontier)
                .await
                .map_err(traversal_error)?;
            let in_frontier: HashSet<Uuid> = frontier.iter().copied().collect();
            let mut next = Vec::new();

            for relationship in relationships {
                for (from, to) in [
                    (relationship.source_id, relationship.target_id),
                    (relationship.target_id, relationship.source_id),
                ] {
                    if !in_frontier.contains(&from) || seen.contains(&to) {
                        continue;
                    }
                    if order.len() >= max_nodes {
                        break;
                    }
                    traversed.insert((
                        relationship.source_id,
                        relationship.target_id,
                        relationship.relationship_type,
                    ));
                    seen.insert(to);
                    order.push(to);
                    next.push(to);
                }
            }

            if !next.is_empty() {
                depth_reached = depth;
            }
            frontier = next;
        }

        let mut by_id: HashMap<Uuid, _> = self
            .store
            .posts_by_ids(&order)
            .await
            .map_err(traversal_error)?
            .into_iter()
            .map(|post| (post.post_id, post))
            .collect();
        let posts: Vec<_> = order.iter().filter_map(|id| by_id.remove(id)).collect();

        let seed_ids: HashSet<&Uuid> = seeds.iter().collect();
        let stats = GraphStats {
            total_posts: posts.len(),
            seed_posts: posts.iter().filter(|p| seed_ids.contains(&p.post_id)).count(),
            relationships_traversed: traversed.len(),
            depth_reached,
        };
        debug!(
            "Graph context: {} posts ({} seeds), {} relationships, depth {}",
            stats.total_posts, stats.seed_posts, stats.relationships_traversed, stats.depth_reached
        );

        Ok(GraphContext { posts, stats })
    }
}
