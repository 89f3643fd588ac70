//! Information display handlers (status, config)

use crate::app::BoardRag;
use crate::cli::output::print_config;
use crate::cli::output::print_status;
use crate::AppConfig;
use crate::Result;

pub async fn handle_status_command(app: &BoardRag) -> Result<()> {
    let status = app.status().await?;
    print_status(&status);

    let embedded = app.vector_index().count().await?;
    let relationships = app.database().count_relationships().await?;
    println!("  Relationships: {relationships}");
    println!("  Embedded posts: {embedded}");
    Ok(())
}

pub fn handle_config_command(config: &AppConfig) {
    print_config(config);
}
