//! Server configuration.

use crate::error::{ServerError, ServerResult};
use std::net::SocketAddr;
use std::path::PathBuf;
use tillsync_sync_protocol::PULL_BATCH_LIMIT;

/// Listen address.
pub const BIND_ADDR_VAR: &str = "CLOUD_BIND_ADDR";
/// Cloud database file.
pub const DATABASE_PATH_VAR: &str = "CLOUD_DATABASE_PATH";
/// Shared secret expected from Edges.
pub const TOKEN_VAR: &str = "SYNC_API_TOKEN";

/// Largest push batch accepted by default.
pub const DEFAULT_MAX_PUSH_RECORDS: usize = 500;

/// Configuration for the sync server.
#[derive(Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Database file.
    pub database_path: PathBuf,
    /// Shared secret. Without one every authenticated endpoint answers 401.
    pub token: Option<String>,
    /// Maximum records per push request.
    pub max_push_records: usize,
    /// Maximum records per pull response.
    pub max_pull_records: usize,
}

impl ServerConfig {
    /// Creates a new server configuration.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            database_path: PathBuf::from("cloud.sqlite3"),
            token: None,
            max_push_records: DEFAULT_MAX_PUSH_RECORDS,
            max_pull_records: PULL_BATCH_LIMIT,
        }
    }

    /// Sets the shared secret.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the database file.
    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = path.into();
        self
    }

    /// Sets the maximum push batch size.
    pub fn with_max_push_records(mut self, max: usize) -> Self {
        self.max_push_records = max;
        self
    }

    /// Sets the maximum pull batch size.
    pub fn with_max_pull_records(mut self, max: usize) -> Self {
        self.max_pull_records = max;
        self
    }

    /// Reads the configuration from the process environment.
    pub fn from_env() -> ServerResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ServerResult<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();
        if let Some(addr) = get(BIND_ADDR_VAR) {
            config.bind_addr = addr.parse().map_err(|e| {
                ServerError::Configuration(format!("{BIND_ADDR_VAR} is not a socket address: {e}"))
            })?;
        }
        if let Some(path) = get(DATABASE_PATH_VAR) {
            config.database_path = PathBuf::from(path);
        }
        config.token = get(TOKEN_VAR);
        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([0, 0, 0, 0], 8080)))
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_addr", &self.bind_addr)
            .field("database_path", &self.database_path)
            .field("token_len", &self.token.as_ref().map(String::len))
            .field("max_push_records", &self.max_push_records)
            .field("max_pull_records", &self.max_pull_records)
            .finish()
    }
}
