//! Custom error types for the logger.
//!
//! This module defines the primary error type, `LoggerError`, for the whole crate.
//! Using the `thiserror` crate, it provides a centralized and consistent way to report
//! everything that can go wrong between a caller handing over a record and that record
//! landing on the storage volume.
//!
//! ## Error Hierarchy
//!
//! - **`MountNotFound`**: the mount point could not be stat'ed when the logger was built.
//!   Fatal to construction. The logger never tries to mount storage itself, so recovery
//!   (re-inserting the card, re-mounting the volume) belongs to the caller.
//! - **`InvalidRecord`**: a record contains a line break and would corrupt line framing.
//!   Rejected before it touches the buffer or the file.
//! - **`Io`**: wraps `std::io::Error` from the storage volume (device full, write failure,
//!   handle failure). A failed flush keeps the buffered records so the caller may retry.
//! - **`InvalidCapacity`** / **`InvalidHeader`**: construction-time argument checks.
//! - **`Closed`**: the logger has been closed and accepts no more writes.
//! - **`LockPoisoned`**: a producer panicked while holding a `SharedLogger`.
//! - **`Config`** / **`Configuration`**: loading or validating `LoggerConfig`.
//!
//! By using `#[from]`, `LoggerError` can be created from the underlying I/O and figment
//! errors with the `?` operator.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias for results using the logger error type.
pub type LoggerResult<T> = std::result::Result<T, LoggerError>;

/// Everything that can go wrong in the crate; see the module docs.
#[derive(Error, Debug)]
pub enum LoggerError {
    /// The mount point does not exist on the volume.
    #[error("Mount point '{}' not found", mount_point.display())]
    MountNotFound {
        /// Mount point that was checked.
        mount_point: PathBuf,
    },

    /// A record would span more than one line.
    #[error("Invalid record: {reason}")]
    InvalidRecord {
        /// What is wrong with it.
        reason: &'static str,
    },

    /// A header column would break the header line.
    #[error("Invalid header column '{column}': {reason}")]
    InvalidHeader {
        /// The offending column.
        column: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// `buffer_capacity` was 0.
    #[error("Buffer capacity must be at least 1")]
    InvalidCapacity,

    /// The volume failed an operation.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The logger was closed.
    #[error("Logger is closed")]
    Closed,

    /// A writer panicked while holding a [`SharedLogger`](crate::SharedLogger).
    #[error("Logger lock poisoned by a panicking writer")]
    LockPoisoned,

    /// The configuration could not be loaded or parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    /// An option or configuration value was rejected.
    #[error("Configuration validation error: {0}")]
    Configuration(String),
}

impl LoggerError {
    /// Whether the failed operation may succeed if retried without changing its input.
    ///
    /// I/O failures are transient from the logger's point of view (the buffer is kept),
    /// everything else needs the caller to change something first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LoggerError::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn mount_not_found_names_the_mount_point() {
        let err = LoggerError::MountNotFound {
            mount_point: PathBuf::from("/sd"),
        };
        assert_eq!(err.to_string(), "Mount point '/sd' not found");
    }

    #[test]
    fn io_errors_convert_and_are_retryable() {
        let err: LoggerError = io::Error::new(io::ErrorKind::Other, "card full").into();
        assert!(matches!(err, LoggerError::Io(_)));
        assert!(err.is_retryable());
        assert!(err.to_string().contains("card full"));
    }

    #[test]
    fn validation_errors_are_not_retryable() {
        let record = LoggerError::InvalidRecord {
            reason: "record cannot contain line breaks",
        };
        assert!(!record.is_retryable());
        assert!(!LoggerError::Closed.is_retryable());
        assert!(!LoggerError::InvalidCapacity.is_retryable());
    }
}
