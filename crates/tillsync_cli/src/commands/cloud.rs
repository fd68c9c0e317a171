//! Cloud command implementation.

use std::net::SocketAddr;
use std::path::PathBuf;
use tillsync_sync_server::{ServerConfig, SyncServer};
use tracing::{error, info};

/// Serves the sync API until Ctrl-C.
pub fn run(
    database: Option<PathBuf>,
    bind: Option<SocketAddr>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ServerConfig::from_env()?;
    if let Some(path) = database {
        config = config.with_database_path(path);
    }
    if let Some(addr) = bind {
        config.bind_addr = addr;
    }

    let server = SyncServer::new(config)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(server.serve(shutdown_signal()))?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for ctrl-c");
        return;
    }
    info!("shutdown requested");
}
