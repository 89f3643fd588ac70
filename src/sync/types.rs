//! Types for board synchronization

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

/// Sync tunables resolved from the application config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOptions {
    /// Source rows per transactional batch
    pub batch_size: u32,
    /// Following source rows inspected when linking a post
    pub link_window: u32,
    /// Sleep between batches in continuous mode
    pub interval: Duration,
    /// Sleep after a failed batch in continuous mode
    pub error_backoff: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            batch_size: 100,
            link_window: 20,
            interval: Duration::from_secs(60),
            error_backoff: Duration::from_secs(60),
        }
    }
}

impl SyncOptions {
    /// Create SyncOptions from AppConfig
    pub fn from_app_config(app_config: &crate::AppConfig) -> Self {
        Self {
            batch_size: app_config.sync.batch_size,
            link_window: app_config.sync.link_window,
            interval: Duration::from_secs(app_config.sync.interval_secs),
            error_backoff: Duration::from_secs(app_config.sync_error_backoff_secs()),
        }
    }

    #[must_use]
    pub fn with_batch_size(self, batch_size: u32) -> Self {
        Self {
            batch_size: batch_size.max(1),
            ..self
        }
    }

    #[must_use]
    pub fn with_interval(self, interval: Duration) -> Self {
        Self { interval, ..self }
    }
}

/// Counters for one sync batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub posts: usize,
    pub relationships: usize,
    pub last_sequence_no: Option<i64>,
}
