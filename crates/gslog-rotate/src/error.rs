//! Error types for gslog-rotate
//!
//! Write-path errors ([`RotateError`]) are returned to the caller
//! synchronously. Retention errors are collected per file into
//! [`RetentionErrors`], logged by the background worker or returned from
//! [`RotatingFile::run_retention`](crate::RotatingFile::run_retention).

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for rotating file operations
pub type Result<T> = std::result::Result<T, RotateError>;

/// Errors that can occur while writing to or rotating a log file
#[derive(Debug, Error)]
pub enum RotateError {
    /// A single write is larger than the configured maximum file size
    #[error("write length {len} exceeds maximum file size {max}")]
    OversizedWrite {
        /// Length of the rejected write
        len: u64,
        /// Configured maximum file size in bytes
        max: u64,
    },

    /// I/O error while opening, rotating or writing the active file
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The rotating file has been closed
    #[error("rotating file is closed")]
    Closed,

    /// The background retention worker could not be started
    #[error("retention worker error: {0}")]
    Worker(String),

    /// One or more backups could not be removed or compressed
    #[error(transparent)]
    Retention(#[from] RetentionErrors),
}

impl RotateError {
    /// Create a new Worker error
    pub fn worker(message: impl Into<String>) -> Self {
        Self::Worker(message.into())
    }
}

impl From<RotateError> for io::Error {
    fn from(err: RotateError) -> Self {
        match err {
            RotateError::Io(e) => e,
            RotateError::OversizedWrite { .. } => {
                io::Error::new(io::ErrorKind::InvalidInput, err.to_string())
            }
            RotateError::Closed => io::Error::new(io::ErrorKind::BrokenPipe, err.to_string()),
            other => io::Error::other(other.to_string()),
        }
    }
}

/// What the retention pass was doing when a file failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionAction {
    /// Listing the log directory
    Scan,
    /// Deleting an expired or excess backup
    Remove,
    /// Gzipping a retained backup
    Compress,
}

impl fmt::Display for RetentionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetentionAction::Scan => write!(f, "scan"),
            RetentionAction::Remove => write!(f, "remove"),
            RetentionAction::Compress => write!(f, "compress"),
        }
    }
}

/// A single backup that the retention pass failed to process
#[derive(Debug, Error)]
#[error("failed to {action} {}: {source}", .path.display())]
pub struct RetentionFailure {
    /// Backup file involved
    pub path: PathBuf,
    /// Operation that failed
    pub action: RetentionAction,
    /// Underlying I/O error
    #[source]
    pub source: io::Error,
}

/// Every failure collected during one retention pass
#[derive(Debug, Default)]
pub struct RetentionErrors {
    failures: Vec<RetentionFailure>,
}

impl RetentionErrors {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure and keep going
    pub fn push(&mut self, path: PathBuf, action: RetentionAction, source: io::Error) {
        self.failures.push(RetentionFailure {
            path,
            action,
            source,
        });
    }

    /// Whether nothing failed
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of failed files
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// The individual failures, in the order they happened
    pub fn failures(&self) -> &[RetentionFailure] {
        &self.failures
    }

    /// `Ok(())` if empty, otherwise `Err(self)`
    pub fn into_result(self) -> std::result::Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for RetentionErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RetentionErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oversized_write_message() {
        let err = RotateError::OversizedWrite { len: 10, max: 5 };
        assert_eq!(err.to_string(), "write length 10 exceeds maximum file size 5");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: RotateError = io_err.into();
        assert!(matches!(err, RotateError::Io(_)));

        let back: io::Error = err.into();
        assert_eq!(back.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_oversized_into_io_error() {
        let err: io::Error = RotateError::OversizedWrite { len: 2, max: 1 }.into();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_retention_errors_join() {
        let mut errors = RetentionErrors::new();
        assert!(errors.is_empty());

        errors.push(
            PathBuf::from("/tmp/a.log"),
            RetentionAction::Remove,
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        errors.push(
            PathBuf::from("/tmp/b.log"),
            RetentionAction::Compress,
            io::Error::other("disk full"),
        );

        assert_eq!(errors.len(), 2);
        let message = errors.to_string();
        let lines: Vec<&str> = message.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("remove /tmp/a.log"));
        assert!(lines[1].contains("compress /tmp/b.log"));
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_empty_retention_errors_is_ok() {
        assert!(RetentionErrors::new().into_result().is_ok());
    }
}
