//! GraphRAG (Retrieval-Augmented Generation) over board posts
//!
//! A question flows through five stages in fixed order:
//! - vector retrieval of seed posts
//! - bounded graph expansion along stored relationships
//! - context synthesis into one text block
//! - LLM answer generation, optionally streamed token by token
//! - citation extraction from the answer
//!
//! # Examples
//!
//! ```rust,no_run
//! use boardrag::app::BoardRag;
//! use boardrag::config::AppConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let app = BoardRag::new(&config).await?;
//!
//!     let response = app.rag_service().answer("昨日のスレの結論は？").await?;
//!     println!("Answer: {}", response.answer);
//!     println!("Citations: {}", response.citations.len());
//!
//!     Ok(())
//! }
//! ```

pub mod citations;
pub mod context;
pub mod generator;
pub mod graph;
pub mod pipeline;
pub mod retriever;
pub mod state;
pub mod streaming;

pub use citations::CitationExtractor;
pub use context::ContextSynthesizer;
pub use generator::ResponseGenerator;
pub use graph::GraphContextBuilder;
pub use graph::RelationshipGraphBuilder;
pub use pipeline::RagService;
pub use pipeline::Stage;
pub use retriever::VectorRetriever;
pub use state::GraphContext;
pub use state::GraphStats;
pub use state::RagAnswer;
pub use state::RequestState;
pub use streaming::AnswerTask;
pub use streaming::StreamingAnswer;
pub use streaming::TokenSink;
pub use streaming::TokenStream;
