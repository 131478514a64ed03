//! Sharded in-memory key/value store with an asynchronous mutation log
//!
//! Keys are routed to a fixed set of independently locked shards by a
//! deterministic string hash. Every completed operation, successful or not,
//! is handed to a background logger that numbers it and appends it to a
//! plain-text log file.
//!
//! ```no_run
//! use shardlog::{KvService, StoreConfig};
//!
//! # fn main() -> shardlog::Result<()> {
//! let service = KvService::open(&StoreConfig::new().with_log_path("shardlog.log"))?;
//! service.put("user:42", "alice")?;
//! assert_eq!(service.get("user:42")?, "alice");
//! service.close()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod logger;
pub mod metrics;
pub mod service;
pub mod shard;

#[cfg(feature = "server")]
pub mod server;

pub use config::{QueueMode, StoreConfig};
pub use error::{Error, Result};
pub use logger::{Action, ErrorEvent, Event, EventLogger, LogEntry};
pub use metrics::MetricsCollector;
pub use service::{KvService, ServiceStats};
pub use shard::{ShardError, ShardRouter, ShardSet};
