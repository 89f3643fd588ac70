//! Board synchronization module
//!
//! Copies new rows from the upstream board table into the local
//! post+relationship store, one transactional batch at a time.

pub mod pipeline;
pub mod source;
pub mod types;

pub use pipeline::SyncPipeline;
pub use source::PgSource;
pub use source::SourceStore;
pub use types::*;
