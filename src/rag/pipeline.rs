//! Complete GraphRAG pipeline: Retrieve -> Expand -> Synthesize -> Generate -> Cite

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing::info_span;
use tracing::Instrument;

use super::streaming::token_channel;
use super::AnswerTask;
use super::CitationExtractor;
use super::ContextSynthesizer;
use super::GraphContextBuilder;
use super::RagAnswer;
use super::RelationshipGraphBuilder;
use super::RequestState;
use super::ResponseGenerator;
use super::StreamingAnswer;
use super::VectorRetriever;
use crate::config::RagConfig;
use crate::database::PostStore;
use crate::errors::Result;
use crate::index::VectorIndex;
use crate::llm::ChatCompletion;
use crate::BoardRagError;

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    VectorRetrieval,
    GraphExpansion,
    ContextSynthesis,
    ResponseGeneration,
    CitationExtraction,
}

impl Stage {
    pub const ORDER: [Self; 5] = [
        Self::VectorRetrieval,
        Self::GraphExpansion,
        Self::ContextSynthesis,
        Self::ResponseGeneration,
        Self::CitationExtraction,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::VectorRetrieval => "vector_retrieval",
            Self::GraphExpansion => "graph_expansion",
            Self::ContextSynthesis => "context_synthesis",
            Self::ResponseGeneration => "response_generation",
            Self::CitationExtraction => "citation_extraction",
        }
    }
}

/// Complete RAG service
pub struct RagService {
    retriever: VectorRetriever,
    graph: Arc<dyn GraphContextBuilder>,
    synthesizer: ContextSynthesizer,
    generator: ResponseGenerator,
    citations: CitationExtractor,
    max_depth: usize,
    max_nodes: usize,
    poll_interval: Duration,
}

impl RagService {
    /// Create from existing services
    pub fn from_services(
        store: Arc<dyn PostStore>,
        index: Arc<dyn VectorIndex>,
        llm: Arc<dyn ChatCompletion>,
        config: &RagConfig,
    ) -> Self {
        let graph = Arc::new(RelationshipGraphBuilder::new(Arc::clone(&store)));
        Self::with_graph_builder(store, index, llm, graph, config)
    }

    /// Same as `from_services` with a custom graph expansion
    pub fn with_graph_builder(
        store: Arc<dyn PostStore>,
        index: Arc<dyn VectorIndex>,
        llm: Arc<dyn ChatCompletion>,
        graph: Arc<dyn GraphContextBuilder>,
        config: &RagConfig,
    ) -> Self {
        Self {
            retriever: VectorRetriever::new(
                index,
                Arc::clone(&store),
                config.top_k,
                config.window_posts,
            ),
            graph,
            synthesizer: ContextSynthesizer::new(config.anonymous_author.clone()),
            generator: ResponseGenerator::new(llm),
            citations: CitationExtractor::new(
                store,
                config.citation_limit,
                config.citation_scan,
                config.anonymous_author.clone(),
            ),
            max_depth: config.max_depth,
            max_nodes: config.max_nodes,
            poll_interval: Duration::from_millis(config.token_poll_interval_ms),
        }
    }

    /// Answer a question, blocking until the whole pipeline has run
    pub async fn answer(&self, question: &str) -> Result<RagAnswer> {
        let state = self.run(RequestState::new(question)).await?;
        Ok(state.into_answer())
    }

    /// Answer a question, streaming tokens while the pipeline runs
    pub fn answer_streaming(self: &Arc<Self>, question: impl Into<String>) -> StreamingAnswer {
        let (sink, tokens) = token_channel(self.poll_interval, CancellationToken::new());
        let service = Arc::clone(self);
        let state = RequestState::new(question).with_token_sink(sink.clone());

        let handle = tokio::spawn(async move {
            let result = service.run(state).await;
            // Covers failures before the generation stage
            sink.finish();
            result.map(RequestState::into_answer)
        });

        StreamingAnswer {
            tokens,
            result: AnswerTask::new(handle),
        }
    }

    async fn run(&self, mut state: RequestState) -> Result<RequestState> {
        if state.question().trim().is_empty() {
            return Err(BoardRagError::Retrieval("Question must not be empty".to_string()));
        }

        info!("Processing RAG query: {}", state.question());
        for stage in Stage::ORDER {
            state = self
                .run_stage(stage, state)
                .instrument(info_span!("rag_stage", stage = stage.name()))
                .await?;
        }
        info!(
            "RAG query completed: {} citations, {} context posts",
            state.citations().len(),
            state.graph_context().stats.total_posts
        );
        Ok(state)
    }

    async fn run_stage(&self, stage: Stage, state: RequestState) -> Result<RequestState> {
        match stage {
            Stage::VectorRetrieval => {
                let ids = self.retriever.retrieve(state.question()).await?;
                Ok(state.with_vector_results(ids))
            }
            Stage::GraphExpansion => {
                let context = self
                    .graph
                    .build(state.vector_results(), self.max_depth, self.max_nodes)
                    .await?;
                Ok(state.with_graph_context(context))
            }
            Stage::ContextSynthesis => {
                let text = self.synthesizer.synthesize(&state.graph_context().posts);
                Ok(state.with_formatted_context(text))
            }
            Stage::ResponseGeneration => {
                let answer = self.generator.generate(&state).await?;
                Ok(state.with_answer(answer))
            }
            Stage::CitationExtraction => {
                let citations = self
                    .citations
                    .extract(state.answer(), &state.graph_context().posts)
                    .await;
                Ok(state.with_citations(citations))
            }
        }
    }
}
