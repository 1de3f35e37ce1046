use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "adaptest", about = "Run adaptive assessment sessions")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Catalog JSON file (overrides config)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Session store directory (overrides config)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage sessions
    Session(commands::session::SessionArgs),
    /// Show the next task for a session
    Next {
        /// Session ID
        session_id: String,
    },
    /// Show the candidate scores behind the next selection
    Explain {
        /// Session ID
        session_id: String,
    },
    /// Record a response
    Respond(commands::respond::RespondArgs),
    /// Show effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let overrides = commands::Overrides {
        catalog: cli.catalog,
        store: cli.store,
    };

    match cli.command {
        Commands::Session(args) => commands::session::run(args, overrides).await,
        Commands::Next { session_id } => commands::select::next(&session_id, overrides).await,
        Commands::Explain { session_id } => {
            commands::select::explain(&session_id, overrides).await
        }
        Commands::Respond(args) => commands::respond::run(args, overrides).await,
        Commands::Config => commands::show_config(overrides),
    }
}
