//! Error types for the store.

use thiserror::Error;
use tillsync_codec::CodecError;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while reading or writing the store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite reported an error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A record could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// A stored row could not be read back.
    #[error("corrupt row: {message}")]
    Corrupt {
        /// Description of the problem.
        message: String,
    },

    /// The database was created by a different schema version.
    #[error("schema version mismatch: expected {expected}, found {actual}")]
    SchemaVersionMismatch {
        /// Version this build understands.
        expected: u32,
        /// Version found on disk.
        actual: u32,
    },

    /// An update targeted a row that does not exist.
    #[error("{model} row {id} not found")]
    NotFound {
        /// Model name.
        model: &'static str,
        /// Local id.
        id: i64,
    },

    /// The operation needs a stored row, or an unstored one, and got the other.
    #[error("invalid operation on {model}: {message}")]
    InvalidOperation {
        /// Model name.
        model: &'static str,
        /// Description of the problem.
        message: String,
    },
}

impl StoreError {
    /// Creates a corrupt row error.
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid(model: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            model,
            message: message.into(),
        }
    }

    /// Returns true if this error was caused by the record itself rather
    /// than the database.
    pub fn is_record_error(&self) -> bool {
        matches!(self, StoreError::Codec(_) | StoreError::InvalidOperation { .. })
    }

    /// Returns true if SQLite rejected a write because of a uniqueness or
    /// other constraint.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            StoreError::Sqlite(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(StoreError::from(CodecError::missing_field("external_id")).is_record_error());
        assert!(!StoreError::corrupt("bad json").is_record_error());
        assert!(!StoreError::corrupt("bad json").is_constraint_violation());
    }

    #[test]
    fn display() {
        let err = StoreError::SchemaVersionMismatch {
            expected: 1,
            actual: 3,
        };
        assert_eq!(err.to_string(), "schema version mismatch: expected 1, found 3");
    }
}
