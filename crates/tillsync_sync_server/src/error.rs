//! Error types for the sync server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tillsync_store::StoreError;
use tillsync_sync_protocol::ErrorResponse;
use tracing::error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the sync server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Missing or wrong token, or no token configured.
    #[error("unauthorized")]
    Unauthorized,

    /// Invalid request format.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The model name is not registered.
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    /// Store error; the batch was not committed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Invalid server configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Returns the HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServerError::InvalidRequest(_) | ServerError::UnknownModel(_) => StatusCode::BAD_REQUEST,
            ServerError::Store(_)
            | ServerError::Configuration(_)
            | ServerError::Internal(_)
            | ServerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "request failed");
        }
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classification() {
        assert!(ServerError::InvalidRequest("bad".into()).is_client_error());
        assert!(ServerError::UnknownModel("AuditLog".into()).is_client_error());
        assert!(ServerError::Internal("oops".into()).is_server_error());
        assert!(!ServerError::InvalidRequest("bad".into()).is_server_error());
        assert_eq!(ServerError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ServerError::from(StoreError::corrupt("x")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_display() {
        assert_eq!(ServerError::Unauthorized.to_string(), "unauthorized");
        assert_eq!(
            ServerError::UnknownModel("AuditLog".into()).to_string(),
            "Unknown model: AuditLog"
        );
    }

    #[test]
    fn response_status() {
        let response = ServerError::UnknownModel("AuditLog".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
