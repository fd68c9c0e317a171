//! Error types for the sync engine.

use thiserror::Error;
use tillsync_store::StoreError;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Sync is not configured (missing URL or token, bad value).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The Cloud could not be reached.
    #[error("network error: {message}")]
    Network {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// The Cloud rejected the token.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The request is invalid before it is sent (unknown model, wrong direction).
    #[error("validation error: {0}")]
    Validation(String),

    /// Local store error.
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),

    /// The Cloud answered with a body that is not a valid message.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The Cloud answered `success: false`.
    #[error("rejected by server: {0}")]
    Rejected(String),

    /// The Cloud answered with an unexpected HTTP status.
    #[error("server returned {status}: {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Error message from the body, if any.
        message: String,
    },

    /// Another sync cycle is already running.
    #[error("a sync cycle is already in progress")]
    CycleInProgress,
}

impl SyncError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates a retryable network error.
    pub fn network_retryable(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable network error.
    pub fn network_fatal(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            retryable: false,
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Returns true if the next cycle may succeed without intervention.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Network { retryable, .. } => *retryable,
            SyncError::Server { status, .. } => *status >= 500 || *status == 429,
            SyncError::CycleInProgress => true,
            _ => false,
        }
    }

    /// Short category label, used in logs and cycle reports.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Configuration(_) => "configuration",
            SyncError::Network { .. } => "network",
            SyncError::Auth(_) => "auth",
            SyncError::Validation(_) => "validation",
            SyncError::Persistence(_) => "persistence",
            SyncError::Protocol(_) => "protocol",
            SyncError::Rejected(_) => "rejected",
            SyncError::Server { .. } => "server",
            SyncError::CycleInProgress => "busy",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(SyncError::network_retryable("connection refused").is_retryable());
        assert!(!SyncError::network_fatal("invalid certificate").is_retryable());
        assert!(SyncError::Server {
            status: 503,
            message: String::new()
        }
        .is_retryable());
        assert!(!SyncError::Server {
            status: 400,
            message: "unknown model".into()
        }
        .is_retryable());
        assert!(!SyncError::Auth("invalid token".into()).is_retryable());
        assert!(!SyncError::validation("Category is not pushable").is_retryable());
    }

    #[test]
    fn kinds() {
        assert_eq!(SyncError::configuration("x").kind(), "configuration");
        assert_eq!(SyncError::Auth("x".into()).kind(), "auth");
        assert_eq!(
            SyncError::from(StoreError::corrupt("x")).kind(),
            "persistence"
        );
    }

    #[test]
    fn error_display() {
        let err = SyncError::Server {
            status: 500,
            message: "commit failed".into(),
        };
        assert_eq!(err.to_string(), "server returned 500: commit failed");
    }
}
