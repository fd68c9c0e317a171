//! Ping command implementation.

use tillsync_sync_engine::{EdgeConfig, HttpTransport, SyncTransport};

/// Pings the Cloud with the configured token.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = EdgeConfig::from_env()?;
    let transport = HttpTransport::new(&config)?;
    let response = transport.ping()?;
    println!(
        "{} {}",
        transport.base_url(),
        response.status.as_deref().unwrap_or("ok")
    );
    Ok(())
}
