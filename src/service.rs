//! Request handling on top of the shard set and the event logger
//!
//! Each call applies the store operation first and journals its outcome
//! afterwards. The journal entry therefore happens-after the mutation, but
//! entries from concurrent requests may land in the log in a different order
//! than their mutations were applied.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::config::StoreConfig;
use crate::error::{Error, Result, INTERNAL_ERROR_MESSAGE};
use crate::logger::{Action, ErrorEvent, Event, EventLogger};
use crate::metrics::{MetricsCollector, MetricsSnapshot};
use crate::shard::{ShardError, ShardSet, ShardStats};

/// Store plus journal, shared by every request handler
#[derive(Debug)]
pub struct KvService {
    shards: Arc<ShardSet>,
    logger: Arc<EventLogger>,
    metrics: Arc<MetricsCollector>,
}

/// Serializable view of the service state
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub shards: ShardStats,
    pub metrics: MetricsSnapshot,
    pub last_sequence_id: u64,
    pub pending_entries: usize,
}

impl KvService {
    /// Assemble a service from already constructed parts
    pub fn new(
        shards: Arc<ShardSet>,
        logger: Arc<EventLogger>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            shards,
            logger,
            metrics,
        }
    }

    /// Build the shard set and open the log file described by `config`
    pub fn open(config: &StoreConfig) -> Result<Self> {
        config.validate()?;

        let metrics = Arc::new(MetricsCollector::new());
        let logger = Arc::new(EventLogger::open(config, metrics.clone())?);
        let shards = Arc::new(ShardSet::new(config.shard_count));

        tracing::info!(shard_count = shards.shard_count(), "shard set ready");

        Ok(Self::new(shards, logger, metrics))
    }

    /// Read `key`, journaling a GET event or the failure
    pub fn get(&self, key: &str) -> Result<String> {
        match self.shards.get(key) {
            Ok(value) => {
                self.succeed(Event::get(key, value.as_str()));
                Ok(value)
            }
            Err(err) => self.fail(err),
        }
    }

    /// Insert `key`, journaling a PUT event or the failure
    pub fn put(&self, key: &str, value: &str) -> Result<()> {
        match self.shards.put(key, value) {
            Ok(()) => {
                self.succeed(Event::put(key, value));
                Ok(())
            }
            Err(err) => self.fail(err),
        }
    }

    /// Remove `key`, journaling a DELETE event or the failure
    pub fn delete(&self, key: &str) -> Result<()> {
        match self.shards.delete(key) {
            Ok(()) => {
                self.succeed(Event::delete(key));
                Ok(())
            }
            Err(err) => self.fail(err),
        }
    }

    /// Journal a failure that happened outside the store, such as an
    /// unreadable request payload. The log only sees the generic message.
    pub fn record_internal(&self, context: impl fmt::Display) -> Error {
        self.metrics.increment_internal_errors();
        tracing::error!(error = %context, "internal failure while handling request");
        self.journal_error(ErrorEvent::new(INTERNAL_ERROR_MESSAGE));

        Error::internal(context.to_string())
    }

    fn succeed(&self, event: Event) {
        self.metrics.record_operation(event.action);
        if let Err(e) = self.logger.record(event) {
            tracing::warn!(error = %e, "could not journal event");
        }
    }

    fn fail<T>(&self, err: ShardError) -> Result<T> {
        self.metrics.record_shard_error(err);
        self.journal_error(err.into());
        Err(err.into())
    }

    fn journal_error(&self, event: ErrorEvent) {
        if let Err(e) = self.logger.record_error(event) {
            tracing::warn!(error = %e, "could not journal error");
        }
    }

    /// The underlying shard set
    pub fn shards(&self) -> &Arc<ShardSet> {
        &self.shards
    }

    /// The event logger
    pub fn logger(&self) -> &Arc<EventLogger> {
        &self.logger
    }

    /// The shared metrics collector
    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    /// Snapshot of shard occupancy, counters and logger progress
    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            shards: self.shards.stats(),
            metrics: self.metrics.snapshot(),
            last_sequence_id: self.logger.last_sequence_id(),
            pending_entries: self.logger.pending(),
        }
    }

    /// Drain and stop the logger; returns the last sequence id written
    pub fn close(&self) -> Result<u64> {
        self.logger.close()
    }

    /// Count of successful operations of `action` so far
    pub fn operation_count(&self, action: Action) -> usize {
        self.metrics.get_operation_count(action)
    }
}
