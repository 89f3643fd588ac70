//! Database initialization handler

use crate::app::BoardRag;
use crate::cli::output::print_info;
use crate::cli::output::print_success;
use crate::cli::output::print_warning;
use crate::Result;

/// Handle database initialization command
pub async fn handle_init_command(app: &BoardRag, force: bool) -> Result<()> {
    if force {
        print_warning("Dropping existing posts, relationships, embeddings and index checkpoint...");
        app.reset_database().await?;
    } else if app.database().is_schema_initialized().await? {
        print_info("Schema already initialized; ensuring indexes exist");
    }

    print_info("🗄️  Initializing BoardRAG database...");
    app.init_database().await?;

    print_success("Tables posts, relationships and post_embeddings ready");
    print_success(&format!(
        "Vector column configured with dimension {}",
        app.config().embedding_dimension()
    ));
    println!();
    print_info("To start syncing data, run:");
    println!("   boardrag sync all");

    Ok(())
}
