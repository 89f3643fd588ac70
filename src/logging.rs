//! Console and daily-rolling file logging

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

use crate::config::AppConfig;
use crate::Result;

const LOG_DIR: &str = "logs";
const LOG_FILE: &str = "boardrag.log";

/// Install the global subscriber at the configured level.
///
/// `RUST_LOG` overrides the level when set. The returned guard flushes the
/// file writer on drop, so keep it alive for the whole process.
pub fn init_logging(config: &AppConfig, verbose: bool) -> Result<WorkerGuard> {
    let level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| level_filter(level));

    if config.logging.backtrace && std::env::var_os("RUST_BACKTRACE").is_none() {
        std::env::set_var("RUST_BACKTRACE", "1");
    }

    std::fs::create_dir_all(Path::new(LOG_DIR))?;
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(LOG_DIR, LOG_FILE));

    Registry::default()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_line_number(true)
                .with_writer(std::io::stderr),
        )
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .try_init()
        .map_err(|e| crate::BoardRagError::ConfigError(format!("logging already set: {e}")))?;

    tracing::debug!("Logging to stderr and {LOG_DIR}/{LOG_FILE}.<date> at level {level}");
    Ok(guard)
}

fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!("{level},boardrag={level}"))
}
