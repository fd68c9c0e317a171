//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding wire records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A string did not match any value of a fixed enumeration.
    #[error("unknown {type_name} value: {value:?}")]
    UnknownEnumValue {
        /// Name of the enumeration.
        type_name: &'static str,
        /// The rejected wire value.
        value: String,
    },

    /// A field was present but had the wrong shape.
    #[error("invalid field `{field}`: {message}")]
    InvalidField {
        /// Field name.
        field: String,
        /// Description of the problem.
        message: String,
    },

    /// A required field was absent.
    #[error("missing field `{field}`")]
    MissingField {
        /// Field name.
        field: String,
    },

    /// A value had the wrong type (no field context yet).
    #[error("invalid value: {message}")]
    InvalidValue {
        /// Description of the problem.
        message: String,
    },

    /// The record itself was malformed.
    #[error("invalid record structure: {message}")]
    InvalidStructure {
        /// Description of the structural error.
        message: String,
    },
}

impl CodecError {
    /// Create an unknown enum value error.
    pub fn unknown_enum(type_name: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownEnumValue {
            type_name,
            value: value.into(),
        }
    }

    /// Create an invalid value error.
    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::InvalidValue {
            message: message.into(),
        }
    }

    /// Create a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create an invalid structure error.
    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }

    /// Attaches a field name to context-free value errors.
    ///
    /// `UnknownEnumValue` is left untouched so callers can still match on it.
    pub fn in_field(self, field: &str) -> Self {
        match self {
            Self::InvalidValue { message } => Self::InvalidField {
                field: field.to_string(),
                message,
            },
            other => other,
        }
    }

    /// Returns true if this is an unknown enum value error.
    pub fn is_unknown_enum(&self) -> bool {
        matches!(self, Self::UnknownEnumValue { .. })
    }
}
