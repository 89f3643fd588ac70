//! Board synchronization, vector indexing and GraphRAG question answering

pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod database;
pub mod embeddings;
pub mod errors;
pub mod index;
pub mod llm;
pub mod logging;
pub mod models;
pub mod rag;
pub mod sync;

#[cfg(test)]
mod errors_tests;
#[cfg(test)]
pub mod tests;

pub use app::BoardRag;
pub use config::AppConfig;
pub use errors::*;
