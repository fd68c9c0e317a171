//! TillSync CLI
//!
//! Runs a node of either kind and offers one-shot sync tools.
//!
//! # Commands
//!
//! - `edge` - Run the background sync worker until Ctrl-C
//! - `cloud` - Serve the sync API until Ctrl-C
//! - `sync-once` - Run a single push/pull cycle and print the report
//! - `ping` - Check the Cloud is reachable and accepts the token
//! - `status` - Show local row counts and pull cursors
//!
//! Settings come from the environment (`CLOUD_SYNC_BASE_URL`,
//! `SYNC_API_TOKEN`, `EDGE_MODE`, ...); flags override the database path
//! and bind address.

mod commands;

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// TillSync Edge/Cloud synchronization.
#[derive(Parser)]
#[command(name = "tillsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the SQLite database file
    #[arg(global = true, short, long)]
    database: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the Edge sync worker until interrupted
    Edge,

    /// Serve the Cloud sync API until interrupted
    Cloud {
        /// Address to listen on
        #[arg(short, long, env = "CLOUD_BIND_ADDR")]
        bind: Option<SocketAddr>,
    },

    /// Run one sync cycle
    SyncOnce {
        /// Push only, skip the pull phase
        #[arg(long)]
        no_pull: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Check connectivity and credentials against the Cloud
    Ping,

    /// Show local row counts and pull cursors
    Status {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Edge => commands::edge::run(cli.database)?,
        Commands::Cloud { bind } => commands::cloud::run(cli.database, bind)?,
        Commands::SyncOnce { no_pull, format } => {
            commands::sync_once::run(cli.database, !no_pull, &format)?
        }
        Commands::Ping => commands::ping::run()?,
        Commands::Status { format } => commands::status::run(cli.database, &format)?,
    }

    Ok(())
}
