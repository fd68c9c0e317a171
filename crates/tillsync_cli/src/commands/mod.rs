//! CLI command implementations.

pub mod cloud;
pub mod edge;
pub mod ping;
pub mod status;
pub mod sync_once;

use std::path::PathBuf;
use std::sync::Arc;
use tillsync_store::{ModelRegistry, Store};
use tillsync_sync_engine::{EdgeConfig, EdgeSync, HttpTransport, SyncResult};
use tracing::debug;

/// Reads the Edge configuration, applying a `--database` override.
pub fn edge_config(database: Option<PathBuf>) -> SyncResult<EdgeConfig> {
    let config = EdgeConfig::from_env()?;
    Ok(match database {
        Some(path) => config.with_database_path(path),
        None => config,
    })
}

/// Opens the Edge store and wires it to the Cloud over HTTP.
pub fn open_edge(config: &EdgeConfig) -> SyncResult<EdgeSync<HttpTransport>> {
    let transport = HttpTransport::new(config)?;
    let store = Store::open(&config.database_path)?;
    debug!(?config, "edge sync ready");
    Ok(EdgeSync::new(
        Arc::new(store),
        ModelRegistry::with_defaults(),
        transport,
    ))
}
