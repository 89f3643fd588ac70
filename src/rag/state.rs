//! Per-query state threaded through the pipeline stages

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use super::TokenSink;
use crate::models::Citation;
use crate::models::Post;

/// Aggregate numbers describing a graph expansion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_posts: usize,
    pub seed_posts: usize,
    pub relationships_traversed: usize,
    pub depth_reached: usize,
}

/// Neighborhood of the seed posts, in discovery order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphContext {
    pub posts: Vec<Post>,
    pub stats: GraphStats,
}

/// Final result of one question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RagAnswer {
    pub answer: String,
    pub citations: Vec<Citation>,
    pub stats: GraphStats,
}

/// Immutable request state; each stage consumes it and returns the next one
#[derive(Debug)]
pub struct RequestState {
    question: String,
    vector_results: Vec<Uuid>,
    graph_context: GraphContext,
    formatted_context: String,
    answer: String,
    citations: Vec<Citation>,
    token_sink: Option<TokenSink>,
}

impl RequestState {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            vector_results: Vec::new(),
            graph_context: GraphContext::default(),
            formatted_context: String::new(),
            answer: String::new(),
            citations: Vec::new(),
            token_sink: None,
        }
    }

    #[must_use]
    pub fn with_token_sink(self, sink: TokenSink) -> Self {
        Self {
            token_sink: Some(sink),
            ..self
        }
    }

    #[must_use]
    pub fn with_vector_results(self, vector_results: Vec<Uuid>) -> Self {
        Self {
            vector_results,
            ..self
        }
    }

    #[must_use]
    pub fn with_graph_context(self, graph_context: GraphContext) -> Self {
        Self {
            graph_context,
            ..self
        }
    }

    #[must_use]
    pub fn with_formatted_context(self, formatted_context: String) -> Self {
        Self {
            formatted_context,
            ..self
        }
    }

    #[must_use]
    pub fn with_answer(self, answer: String) -> Self {
        Self { answer, ..self }
    }

    #[must_use]
    pub fn with_citations(self, citations: Vec<Citation>) -> Self {
        Self { citations, ..self }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn vector_results(&self) -> &[Uuid] {
        &self.vector_results
    }

    pub const fn graph_context(&self) -> &GraphContext {
        &self.graph_context
    }

    pub fn formatted_context(&self) -> &str {
        &self.formatted_context
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn citations(&self) -> &[Citation] {
        &self.citations
    }

    pub const fn token_sink(&self) -> Option<&TokenSink> {
        self.token_sink.as_ref()
    }

    #[must_use]
    pub fn into_answer(self) -> RagAnswer {
        RagAnswer {
            answer: self.answer,
            citations: self.citations,
            stats: self.graph_context.stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stages_replace_only_their_field() {
        let id = Uuid::new_v4();
        let state = RequestState::new("q")
            .with_vector_results(vec![id])
            .with_formatted_context("ctx".to_string())
            .with_answer("a".to_string());

        assert_eq!(state.question(), "q");
        assert_eq!(state.vector_results(), &[id]);
        assert_eq!(state.formatted_context(), "ctx");
        assert!(state.token_sink().is_none());

        let answer = state.into_answer();
        assert_eq!(answer.answer, "a");
        assert!(answer.citations.is_empty());
    }
}
