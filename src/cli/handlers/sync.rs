//! Synchronization handlers

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::app::BoardRag;
use crate::cli::commands::SyncArgs;
use crate::cli::commands::SyncCommands;
use crate::cli::output::print_info;
use crate::cli::output::print_success;
use crate::sync::SyncOptions;
use crate::Result;

pub async fn handle_sync_command(
    app: &BoardRag,
    sync_command: SyncCommands,
    shutdown: CancellationToken,
) -> Result<()> {
    app.database().verify_schema_or_error().await?;

    match sync_command {
        SyncCommands::Once { args } => {
            let pipeline = app.sync_pipeline(sync_options(app, &args)).await?;
            let count = pipeline.sync_batch().await?;
            if count == 0 {
                print_info("Already up to date");
            } else {
                print_success(&format!("Synced {count} posts"));
            }
        }
        SyncCommands::All { args } => {
            print_info("Starting full synchronization...");
            let pipeline = app.sync_pipeline(sync_options(app, &args)).await?;
            let total = pipeline.sync_all().await?;
            print_success(&format!("Synced {total} posts"));
        }
        SyncCommands::Watch { args } => {
            let options = sync_options(app, &args);
            print_info(&format!(
                "Watching for new posts every {}s (Ctrl-C to stop)...",
                options.interval.as_secs()
            ));
            let pipeline = app.sync_pipeline(options).await?;
            let total = pipeline.run_continuous(shutdown).await?;
            print_success(&format!("Sync stopped after {total} posts"));
        }
    }

    Ok(())
}

/// Config values with command-line overrides applied
fn sync_options(app: &BoardRag, args: &SyncArgs) -> SyncOptions {
    let mut options = SyncOptions::from_app_config(app.config());
    if let Some(batch_size) = args.batch_size {
        options = options.with_batch_size(batch_size);
    }
    if let Some(interval) = args.interval {
        options = options.with_interval(Duration::from_secs(interval));
    }
    options
}
