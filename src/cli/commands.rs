//! CLI command definitions and argument parsing

use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(name = "boardrag")]
#[command(about = "BoardRAG CLI tool for board synchronization, indexing and GraphRAG queries")]
#[command(version)]
pub struct Cli {
    /// Enable verbose debug logging (default: info level)
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize database schema and indexes
    Init {
        /// Drop and recreate the schema
        #[arg(short, long)]
        force: bool,
    },
    /// Synchronization commands
    #[command(subcommand)]
    Sync(SyncCommands),
    /// Embed new and edited posts into the vector index
    Index {
        /// Posts per embedding batch (default: from config)
        #[arg(short, long)]
        batch_size: Option<usize>,
        /// Ignore the checkpoint and reindex every post
        #[arg(long)]
        force_reindex: bool,
    },
    /// Ask a question about the board
    Ask {
        /// The question to ask
        question: String,
    },
    /// Show index status
    Status,
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (default: from config)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to (default: from config)
        #[arg(short, long)]
        port: Option<u16>,
        /// Enable CORS
        #[arg(long)]
        cors: bool,
    },
    /// Show current configuration
    Config,
}

#[derive(Subcommand)]
pub enum SyncCommands {
    /// Sync a single batch
    Once {
        #[command(flatten)]
        args: SyncArgs,
    },
    /// Sync until the source is exhausted
    All {
        #[command(flatten)]
        args: SyncArgs,
    },
    /// Sync continuously until interrupted
    Watch {
        #[command(flatten)]
        args: SyncArgs,
    },
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct SyncArgs {
    /// Source rows per batch (default: from config)
    #[arg(long)]
    pub batch_size: Option<u32>,
    /// Seconds between batches in watch mode (default: from config)
    #[arg(long)]
    pub interval: Option<u64>,
}
