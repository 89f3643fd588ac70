//! Vector index maintenance handler

use crate::app::BoardRag;
use crate::cli::output::print_index_report;
use crate::cli::output::print_info;
use crate::index::IndexMode;
use crate::Result;

pub async fn handle_index_command(
    app: &BoardRag,
    batch_size: Option<usize>,
    force_reindex: bool,
) -> Result<()> {
    app.database().verify_schema_or_error().await?;

    let batch_size = batch_size.unwrap_or(app.config().index.batch_size).max(1);
    let mode = if force_reindex {
        print_info("Force reindex: every post will be re-embedded");
        IndexMode::Force
    } else {
        IndexMode::Incremental
    };

    let report = app.index_updater(batch_size).run(mode).await?;
    if report.total() == 0 {
        print_info("Index already up to date");
    } else {
        print_index_report(&report);
    }
    Ok(())
}
