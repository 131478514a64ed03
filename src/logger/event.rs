//! Records submitted to the event logger

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Store operation being journaled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Get,
    Put,
    Delete,
}

impl Action {
    /// Wire name of the action
    pub fn name(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Self::Get),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            _ => Err(Error::internal(format!("unknown action: {}", s))),
        }
    }
}

/// A successful store operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub action: Action,
    pub key: String,
    /// Absent for operations that carry no value (delete)
    pub value: Option<String>,
}

impl Event {
    /// Create an event carrying a value
    pub fn new(action: Action, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            action,
            key: key.into(),
            value: Some(value.into()),
        }
    }

    /// A successful get that returned `value`
    pub fn get(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(Action::Get, key, value)
    }

    /// A successful put of `value`
    pub fn put(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(Action::Put, key, value)
    }

    /// A successful delete
    pub fn delete(key: impl Into<String>) -> Self {
        Self {
            action: Action::Delete,
            key: key.into(),
            value: None,
        }
    }
}

/// A failure surfaced to a client, journaled by its message only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub message: String,
}

impl ErrorEvent {
    /// Create an error event from a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<&Error> for ErrorEvent {
    fn from(err: &Error) -> Self {
        Self::new(err.audit_message())
    }
}

impl From<crate::shard::ShardError> for ErrorEvent {
    fn from(err: crate::shard::ShardError) -> Self {
        Self::new(err.to_string())
    }
}
