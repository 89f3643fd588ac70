use anyhow::Context;
use boardrag::app::BoardRag;
use boardrag::cli::handle_ask_command;
use boardrag::cli::handle_config_command;
use boardrag::cli::handle_index_command;
use boardrag::cli::handle_init_command;
use boardrag::cli::handle_serve_api;
use boardrag::cli::handle_status_command;
use boardrag::cli::handle_sync_command;
use boardrag::cli::Cli;
use boardrag::cli::Commands;
use boardrag::AppConfig;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing::warn;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load().context("failed to load configuration")?;

    let _log_guard = boardrag::logging::init_logging(&config, cli.verbose)?;
    info!("Configuration loaded successfully");

    if matches!(cli.command, Commands::Config) {
        handle_config_command(&config);
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    spawn_ctrl_c_handler(shutdown.clone());

    let app = BoardRag::new(&config)
        .await
        .context("failed to initialize services")?;

    // Execute the requested command
    match cli.command {
        Commands::Init { force } => handle_init_command(&app, force).await?,
        Commands::Sync(sync_command) => handle_sync_command(&app, sync_command, shutdown).await?,
        Commands::Index {
            batch_size,
            force_reindex,
        } => handle_index_command(&app, batch_size, force_reindex).await?,
        Commands::Ask { question } => handle_ask_command(&app, question).await?,
        Commands::Status => handle_status_command(&app).await?,
        Commands::Serve { host, port, cors } => {
            handle_serve_api(&app, host, port, cors, shutdown).await?;
        }
        Commands::Config => handle_config_command(&config),
    }

    Ok(())
}

fn spawn_ctrl_c_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl-C, shutting down...");
                shutdown.cancel();
            }
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
    });
}
