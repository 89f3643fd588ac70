//! CLI command handlers module
//!
//! This module is organized by functional domains:
//! - init: Database initialization
//! - sync: Board synchronization
//! - index: Vector index maintenance
//! - ask: Streamed question answering
//! - serve: API server
//! - info: Information display (status, config)

pub mod ask;
pub mod index;
pub mod info;
pub mod init;
pub mod serve;
pub mod sync;

// Re-export all public handlers
pub use ask::*;
pub use index::*;
pub use info::*;
pub use init::*;
pub use serve::*;
pub use sync::*;
