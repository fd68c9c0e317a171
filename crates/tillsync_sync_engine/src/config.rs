//! Configuration for the Edge side of sync.
//!
//! Both config types can be built in code or read from the environment.
//! `from_lookup` takes the variable source as a closure so tests never
//! touch the process environment.

use crate::error::{SyncError, SyncResult};
use std::path::PathBuf;
use std::time::Duration;

/// Cloud base URL.
pub const BASE_URL_VAR: &str = "CLOUD_SYNC_BASE_URL";
/// Shared secret sent to the Cloud.
pub const TOKEN_VAR: &str = "SYNC_API_TOKEN";
/// Gate for the background worker.
pub const EDGE_MODE_VAR: &str = "EDGE_MODE";
/// Seconds between cycles.
pub const INTERVAL_VAR: &str = "EDGE_SYNC_INTERVAL_SECONDS";
/// Pull on every n-th cycle.
pub const PULL_EVERY_VAR: &str = "EDGE_SYNC_PULL_EVERY";
/// Edge database file.
pub const DATABASE_PATH_VAR: &str = "EDGE_DATABASE_PATH";

/// Connection settings for talking to the Cloud.
#[derive(Clone)]
pub struct EdgeConfig {
    /// Cloud base URL, without a trailing slash.
    pub base_url: String,
    /// Shared secret.
    pub token: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Local database file.
    pub database_path: PathBuf,
}

impl EdgeConfig {
    /// Creates a configuration.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim().trim_end_matches('/').to_string(),
            token: token.into().trim().to_string(),
            timeout: Duration::from_secs(30),
            database_path: PathBuf::from("edge.sqlite3"),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the local database file.
    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = path.into();
        self
    }

    /// Reads the configuration from the process environment.
    pub fn from_env() -> SyncResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> SyncResult<Self> {
        let base_url = non_empty(&lookup, BASE_URL_VAR)
            .ok_or_else(|| SyncError::configuration(format!("{BASE_URL_VAR} is not set")))?;
        let token = non_empty(&lookup, TOKEN_VAR)
            .ok_or_else(|| SyncError::configuration(format!("{TOKEN_VAR} is not set")))?;

        let mut config = Self::new(base_url, token);
        if let Some(path) = non_empty(&lookup, DATABASE_PATH_VAR) {
            config.database_path = PathBuf::from(path);
        }
        config.validate()?;
        Ok(config)
    }

    /// Checks that the URL and token are usable.
    pub fn validate(&self) -> SyncResult<()> {
        if self.base_url.is_empty() {
            return Err(SyncError::configuration("base URL is empty"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(SyncError::configuration(format!(
                "base URL must start with http:// or https://, got {}",
                self.base_url
            )));
        }
        if self.token.is_empty() {
            return Err(SyncError::configuration("sync token is empty"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for EdgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgeConfig")
            .field("base_url", &self.base_url)
            .field("token_len", &self.token.len())
            .field("timeout", &self.timeout)
            .field("database_path", &self.database_path)
            .finish()
    }
}

/// Scheduling settings for the background worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Whether this process is an Edge node. The worker never starts otherwise.
    pub edge_mode: bool,
    /// Wait between cycles.
    pub interval: Duration,
    /// Pull on every n-th cycle; 1 pulls every cycle.
    pub pull_every: u32,
    /// How long `stop` waits for the worker thread.
    pub join_timeout: Duration,
}

impl WorkerConfig {
    /// Creates a configuration with defaults and the given mode.
    pub fn new(edge_mode: bool) -> Self {
        Self {
            edge_mode,
            interval: Duration::from_secs(30),
            pull_every: 1,
            join_timeout: Duration::from_secs(5),
        }
    }

    /// Sets the wait between cycles.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the pull cadence.
    pub fn with_pull_every(mut self, cycles: u32) -> Self {
        self.pull_every = cycles.max(1);
        self
    }

    /// Sets the join timeout.
    pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = timeout;
        self
    }

    /// Reads the configuration from the process environment.
    pub fn from_env() -> SyncResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> SyncResult<Self> {
        let edge_mode = non_empty(&lookup, EDGE_MODE_VAR)
            .map(|value| parse_flag(&value))
            .unwrap_or(false);
        let mut config = Self::new(edge_mode);

        if let Some(value) = non_empty(&lookup, INTERVAL_VAR) {
            let secs = parse_positive(INTERVAL_VAR, &value)?;
            config.interval = Duration::from_secs(secs);
        }
        if let Some(value) = non_empty(&lookup, PULL_EVERY_VAR) {
            let cycles = parse_positive(PULL_EVERY_VAR, &value)?;
            config.pull_every = u32::try_from(cycles).unwrap_or(u32::MAX);
        }
        Ok(config)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::new(false)
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_positive(key: &str, value: &str) -> SyncResult<u64> {
    match value.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(SyncError::configuration(format!(
            "{key} must be a positive integer, got {value:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn edge_config_builder() {
        let config = EdgeConfig::new("https://cloud.example.com/", " secret ")
            .with_timeout(Duration::from_secs(5))
            .with_database_path("/tmp/edge.db");

        assert_eq!(config.base_url, "https://cloud.example.com");
        assert_eq!(config.token, "secret");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.database_path, PathBuf::from("/tmp/edge.db"));
    }

    #[test]
    fn edge_config_requires_url_and_token() {
        let err = EdgeConfig::from_lookup(env(&[(TOKEN_VAR, "t")])).unwrap_err();
        assert!(err.to_string().contains(BASE_URL_VAR));

        let err = EdgeConfig::from_lookup(env(&[(BASE_URL_VAR, "https://c"), (TOKEN_VAR, "  ")]))
            .unwrap_err();
        assert!(err.to_string().contains(TOKEN_VAR));

        let err = EdgeConfig::from_lookup(env(&[(BASE_URL_VAR, "ftp://c"), (TOKEN_VAR, "t")]))
            .unwrap_err();
        assert_eq!(err.kind(), "configuration");
    }

    #[test]
    fn debug_output_hides_token() {
        let config = EdgeConfig::new("https://c", "super-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("token_len: 12"));
    }

    #[test]
    fn worker_config_defaults() {
        let config = WorkerConfig::from_lookup(env(&[])).unwrap();
        assert!(!config.edge_mode);
        assert_eq!(config.interval, Duration::from_secs(30));
        assert_eq!(config.pull_every, 1);
        assert_eq!(config.join_timeout, Duration::from_secs(5));
    }

    #[test]
    fn worker_config_from_env() {
        let config = WorkerConfig::from_lookup(env(&[
            (EDGE_MODE_VAR, "True"),
            (INTERVAL_VAR, "120"),
            (PULL_EVERY_VAR, "4"),
        ]))
        .unwrap();
        assert!(config.edge_mode);
        assert_eq!(config.interval, Duration::from_secs(120));
        assert_eq!(config.pull_every, 4);

        assert!(WorkerConfig::from_lookup(env(&[(INTERVAL_VAR, "0")])).is_err());
        assert!(WorkerConfig::from_lookup(env(&[(INTERVAL_VAR, "soon")])).is_err());
    }

    #[test]
    fn pull_every_is_at_least_one() {
        assert_eq!(WorkerConfig::new(true).with_pull_every(0).pull_every, 1);
    }
}
