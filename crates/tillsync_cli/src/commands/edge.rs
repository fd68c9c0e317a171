//! Edge command implementation.

use std::path::PathBuf;
use std::sync::Arc;
use tillsync_sync_engine::{SyncError, SyncWorker, WorkerConfig};
use tracing::{error, info, warn};

/// Runs the sync worker until Ctrl-C.
///
/// Missing or invalid sync settings disable sync with an error log; the
/// command then exits cleanly rather than failing the node.
pub fn run(database: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let worker_config = match WorkerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "invalid worker settings, sync disabled");
            return Ok(());
        }
    };
    if !worker_config.edge_mode {
        warn!("EDGE_MODE is not enabled, sync worker not started");
        return Ok(());
    }

    let sync = match super::edge_config(database).and_then(|config| super::open_edge(&config)) {
        Ok(sync) => sync,
        Err(SyncError::Configuration(message)) => {
            error!(error = %message, "invalid sync settings, sync disabled");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let worker = SyncWorker::new(Arc::new(sync), worker_config);
    worker.start()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(tokio::signal::ctrl_c())?;
    info!("shutdown requested");

    if !worker.stop() {
        warn!("sync worker still busy at exit");
    }
    let status = worker.status();
    info!(
        cycles = status.cycle_count,
        errors = status.error_count,
        "edge stopped"
    );
    Ok(())
}
