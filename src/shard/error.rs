//! Error types for the shard module
//!
//! Defines the two expected, client-facing outcomes of a shard operation.

use thiserror::Error;

/// Errors that can occur during shard operations
///
/// The `Display` text of each variant is also the message journaled when the
/// failure is recorded by the event logger.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShardError {
    /// The key is not present in its shard
    #[error("key not found")]
    KeyNotFound,

    /// The key is already present; `put` never overwrites
    #[error("key already exists")]
    KeyAlreadyExists,
}

/// Result type for shard operations
pub type ShardResult<T> = std::result::Result<T, ShardError>;

impl ShardError {
    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound)
    }

    /// Check if this is an already exists error
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::KeyAlreadyExists)
    }

    /// Short machine-friendly name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::KeyNotFound => "key_not_found",
            Self::KeyAlreadyExists => "key_already_exists",
        }
    }
}
