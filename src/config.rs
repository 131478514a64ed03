//! Configuration for shardlog
//!
//! This module provides configuration options for the sharded store, the
//! event logger and the HTTP front end.

use std::path::{Path, PathBuf};
use serde::{Serialize, Deserialize};

use crate::error::{Result, Error};
use crate::shard::DEFAULT_SHARD_COUNT;

/// Default capacity of each logger queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// How the logger queues events and errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum QueueMode {
    /// One bounded queue for both; a producer's entries keep their order
    Merged,
    /// Separate bounded queues for events and errors, no priority between
    /// them. One producer's event and its next error may swap places.
    Split,
}

impl Default for QueueMode {
    fn default() -> Self {
        Self::Merged
    }
}

impl std::fmt::Display for QueueMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl QueueMode {
    /// Parse a queue mode from a string
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "split" => Ok(Self::Split),
            "merged" => Ok(Self::Merged),
            _ => Err(Error::config(format!("Unknown queue mode: {}", s))),
        }
    }

    /// Get the name of the queue mode
    pub fn name(&self) -> &'static str {
        match self {
            Self::Split => "split",
            Self::Merged => "merged",
        }
    }
}

/// Configuration options for a shardlog instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct StoreConfig {
    // Storage configuration
    /// Number of shards (fixed for the lifetime of the store)
    pub shard_count: usize,

    // Logger configuration
    /// Capacity of the event queue and of the error queue
    pub queue_capacity: usize,
    /// Whether events and errors share one queue
    pub queue_mode: QueueMode,
    /// Path of the append-only log file
    pub log_path: PathBuf,
    /// Whether to sync every log line to disk
    pub sync_writes: bool,
    /// Whether to take an exclusive advisory lock on the log file
    pub lock_sink: bool,

    // Server configuration
    /// Address the HTTP server binds to
    pub bind_addr: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            shard_count: DEFAULT_SHARD_COUNT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            queue_mode: QueueMode::default(),
            log_path: PathBuf::from("tmp.log"),
            sync_writes: false,
            lock_sink: true,
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

impl StoreConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of shards
    pub fn with_shard_count(mut self, count: usize) -> Self {
        self.shard_count = count;
        self
    }

    /// Set the capacity of each logger queue
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the queue mode
    pub fn with_queue_mode(mut self, mode: QueueMode) -> Self {
        self.queue_mode = mode;
        self
    }

    /// Set the log file path
    pub fn with_log_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.log_path = path.as_ref().to_path_buf();
        self
    }

    /// Set whether to sync every log line to disk
    pub fn with_sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }

    /// Set whether to lock the log file exclusively
    pub fn with_lock_sink(mut self, lock: bool) -> Self {
        self.lock_sink = lock;
        self
    }

    /// Set the HTTP bind address
    pub fn with_bind_addr(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.shard_count < 1 {
            return Err(Error::config("Shard count must be at least 1"));
        }

        // A zero-capacity queue would turn every record into a rendezvous
        if self.queue_capacity < 1 {
            return Err(Error::config("Queue capacity must be at least 1"));
        }

        if self.log_path.as_os_str().is_empty() {
            return Err(Error::config("Log path must not be empty"));
        }

        if self.bind_addr.trim().is_empty() {
            return Err(Error::config("Bind address must not be empty"));
        }

        Ok(())
    }

    /// Create a human-readable string representation of the configuration
    pub fn to_string_pretty(&self) -> String {
        let mut result = String::new();

        result.push_str("=== shardlog Configuration ===\n\n");

        result.push_str("Storage Configuration:\n");
        result.push_str(&format!("  Shard Count: {}\n", self.shard_count));

        result.push_str("\nLogger Configuration:\n");
        result.push_str(&format!("  Queue Capacity: {}\n", self.queue_capacity));
        result.push_str(&format!("  Queue Mode: {}\n", self.queue_mode));
        result.push_str(&format!("  Log Path: {:?}\n", self.log_path));
        result.push_str(&format!("  Sync Writes: {}\n", self.sync_writes));
        result.push_str(&format!("  Lock Sink: {}\n", self.lock_sink));

        result.push_str("\nServer Configuration:\n");
        result.push_str(&format!("  Bind Address: {}\n", self.bind_addr));

        result
    }

    /// Load configuration from a TOML file
    #[cfg(feature = "toml")]
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        use std::fs::read_to_string;
        use toml::from_str;

        let content = read_to_string(path)?;
        let config: Self = from_str(&content)
            .map_err(|e| Error::config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    #[cfg(feature = "toml")]
    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        use std::fs::write;
        use toml::to_string_pretty;

        let content = to_string_pretty(self)
            .map_err(|e| Error::config(format!("Failed to serialize to TOML: {}", e)))?;

        write(path, content)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();

        assert_eq!(config.shard_count, 7);
        assert_eq!(config.queue_capacity, 100);
        assert_eq!(config.queue_mode, QueueMode::Merged);
        assert_eq!(config.log_path, PathBuf::from("tmp.log"));
        assert!(!config.sync_writes);
        assert!(config.lock_sink);
        assert_eq!(config.bind_addr, "0.0.0.0:8080");

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = StoreConfig::new()
            .with_shard_count(16)
            .with_queue_capacity(8)
            .with_log_path("/var/log/shardlog.log")
            .with_sync_writes(true)
            .with_bind_addr("127.0.0.1:9000");

        assert_eq!(config.shard_count, 16);
        assert_eq!(config.queue_capacity, 8);
        assert_eq!(config.log_path, PathBuf::from("/var/log/shardlog.log"));
        assert!(config.sync_writes);
        assert_eq!(config.bind_addr, "127.0.0.1:9000");

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let invalid_configs = vec![
            StoreConfig::new().with_shard_count(0),
            StoreConfig::new().with_queue_capacity(0),
            StoreConfig::new().with_log_path(""),
            StoreConfig::new().with_bind_addr("  "),
        ];

        for config in invalid_configs {
            assert!(config.validate().is_err());
        }
    }

    #[test]
    fn test_queue_mode() {
        assert_eq!(QueueMode::Split.to_string(), "split");
        assert_eq!(QueueMode::from_str("MERGED").unwrap(), QueueMode::Merged);
        assert!(QueueMode::from_str("fifo").is_err());

        let config: StoreConfig = serde_json::from_str(r#"{"queue_mode": "split"}"#).unwrap();
        assert_eq!(config.queue_mode, QueueMode::Split);
    }

    #[test]
    fn test_config_json_partial() {
        // Missing fields fall back to defaults
        let config: StoreConfig = serde_json::from_str(r#"{"shard_count": 3}"#).unwrap();
        assert_eq!(config.shard_count, 3);
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn test_config_pretty_string() {
        let pretty = StoreConfig::new().to_string_pretty();

        assert!(pretty.contains("Storage Configuration:"));
        assert!(pretty.contains("Logger Configuration:"));
        assert!(pretty.contains("Shard Count: 7"));
        assert!(pretty.contains("Queue Capacity: 100"));
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shardlog.toml");

        let config = StoreConfig::new().with_shard_count(11);
        config.to_toml_file(&path).unwrap();

        assert_eq!(StoreConfig::from_toml_file(&path).unwrap(), config);
    }
}
