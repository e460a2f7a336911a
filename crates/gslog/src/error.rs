//! Error types for gslog

use std::io;

use gslog_rotate::RotateError;
use thiserror::Error;

use crate::value::Kind;

/// Result type for gslog operations
pub type Result<T> = std::result::Result<T, LogError>;

/// Errors that can occur while building loggers or handling entries
#[derive(Debug, Error)]
pub enum LogError {
    /// A typed accessor was called on a field value of another kind
    #[error("field value is {actual}, not {expected}")]
    KindMismatch {
        /// Kind the caller asked for
        expected: Kind,
        /// Kind the value actually holds
        actual: Kind,
    },

    /// A level name did not parse
    #[error("invalid log level: {0:?}")]
    InvalidLevel(String),

    /// A time layout contains an unknown format specifier
    #[error("invalid time layout: {0:?}")]
    InvalidTimeLayout(String),

    /// I/O error from a sink
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error from the rotating file sink
    #[error("rotating file error: {0}")]
    Rotate(#[from] RotateError),

    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The tracing subscriber could not be installed
    #[error("subscriber error: {0}")]
    Subscriber(String),
}

impl LogError {
    /// Create a new KindMismatch error
    pub fn kind_mismatch(expected: Kind, actual: Kind) -> Self {
        Self::KindMismatch { expected, actual }
    }

    /// Create a new Subscriber error
    pub fn subscriber(message: impl Into<String>) -> Self {
        Self::Subscriber(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mismatch_display() {
        let err = LogError::kind_mismatch(Kind::I64, Kind::Str);
        assert_eq!(err.to_string(), "field value is string, not int64");
    }

    #[test]
    fn test_rotate_error_converts() {
        let err: LogError = RotateError::Closed.into();
        assert!(matches!(err, LogError::Rotate(RotateError::Closed)));
    }
}
