//! Error handling for shardlog
//!
//! This module provides error types and result aliases for shardlog operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::shard::ShardError;

/// Message journaled for failures outside the shard error taxonomy
pub const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

/// Errors that can occur in shardlog operations
#[derive(Error, Debug)]
pub enum Error {
    /// Expected, client-facing shard outcomes
    #[error(transparent)]
    Shard(#[from] ShardError),

    /// Unclassified failure at the request boundary (e.g. unreadable payload)
    #[error("internal error: {0}")]
    Internal(String),

    /// Errors related to I/O operations
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The event logger has been closed and accepts no more entries
    #[error("event logger is closed")]
    LoggerClosed,

    /// A non-blocking record found its queue at capacity
    #[error("event logger queue is full")]
    QueueFull,

    /// Another process holds the lock on the log sink
    #[error("log sink {0:?} is locked by another writer")]
    SinkLocked(PathBuf),

    /// A log line could not be parsed back into an entry
    #[error("malformed log entry: {0}")]
    MalformedEntry(String),
}

/// Result type for shardlog operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this is a key-not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Shard(ShardError::KeyNotFound))
    }

    /// Check if this is a key-already-exists error
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::Shard(ShardError::KeyAlreadyExists))
    }

    /// Check if this is an I/O error
    pub fn is_io_error(&self) -> bool {
        matches!(self, Self::Io(_))
    }

    /// Check if the error belongs in the unclassified internal bucket
    pub fn is_internal(&self) -> bool {
        !matches!(self, Self::Shard(_))
    }

    /// Message written to the log sink when this error is recorded.
    ///
    /// Shard errors keep their own text; everything else collapses to
    /// [`INTERNAL_ERROR_MESSAGE`] so internals never leak into the audit log.
    pub fn audit_message(&self) -> String {
        match self {
            Self::Shard(err) => err.to_string(),
            _ => INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }

    /// Get a user-friendly suggestion for resolving the error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::Io(err) if err.kind() == io::ErrorKind::PermissionDenied => {
                Some("You don't have permission to write the log file".to_string())
            }
            Self::SinkLocked(_) => {
                Some("Stop the other process or point log_path at a different file".to_string())
            }
            Self::QueueFull => Some("Retry, or use the blocking record call".to_string()),
            Self::Config(_) => Some("Check the configuration file and environment overrides".to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let err = Error::from(ShardError::KeyNotFound);
        assert!(err.is_not_found());
        assert!(!err.is_internal());
        assert_eq!(err.to_string(), "key not found");

        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let err = Error::from(io_err);
        assert!(err.is_io_error());
        assert!(err.is_internal());
    }

    #[test]
    fn test_audit_messages() {
        assert_eq!(
            Error::from(ShardError::KeyAlreadyExists).audit_message(),
            "key already exists"
        );
        assert_eq!(
            Error::internal("body was not valid UTF-8").audit_message(),
            INTERNAL_ERROR_MESSAGE
        );
        assert_eq!(Error::LoggerClosed.audit_message(), INTERNAL_ERROR_MESSAGE);
    }

    #[test]
    fn test_error_suggestion() {
        let err = Error::SinkLocked(PathBuf::from("tmp.log"));
        assert!(err.suggestion().unwrap().contains("log_path"));
        assert!(Error::from(ShardError::KeyNotFound).suggestion().is_none());
    }
}
