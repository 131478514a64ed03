use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::logger::Action;
use crate::shard::ShardError;

/// Operational counters for the store and the event logger
#[derive(Debug)]
pub struct MetricsCollector {
    // Operation counts
    /// Number of successful get operations
    get_count: AtomicUsize,
    /// Number of successful put operations
    put_count: AtomicUsize,
    /// Number of successful delete operations
    delete_count: AtomicUsize,

    // Error counts
    /// Number of key-not-found outcomes
    not_found_count: AtomicUsize,
    /// Number of key-already-exists outcomes
    already_exists_count: AtomicUsize,
    /// Number of unclassified internal failures
    internal_error_count: AtomicUsize,

    // Logger metrics
    /// Event entries written to the sink
    events_logged: AtomicUsize,
    /// Error entries written to the sink
    errors_logged: AtomicUsize,
    /// Bytes appended to the sink
    sink_bytes_written: AtomicUsize,
    /// Lines that could not be written to the sink
    sink_write_failures: AtomicUsize,
    /// Number of records that had to wait for queue capacity
    backpressure_stalls: AtomicUsize,
    /// Total time producers spent waiting for queue capacity
    backpressure_wait_ns: AtomicU64,

    // Internal state
    /// Start time of the metrics collector
    start_time: Instant,
    /// Wall-clock start time, for reporting
    started_at: DateTime<Utc>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            get_count: AtomicUsize::new(0),
            put_count: AtomicUsize::new(0),
            delete_count: AtomicUsize::new(0),

            not_found_count: AtomicUsize::new(0),
            already_exists_count: AtomicUsize::new(0),
            internal_error_count: AtomicUsize::new(0),

            events_logged: AtomicUsize::new(0),
            errors_logged: AtomicUsize::new(0),
            sink_bytes_written: AtomicUsize::new(0),
            sink_write_failures: AtomicUsize::new(0),
            backpressure_stalls: AtomicUsize::new(0),
            backpressure_wait_ns: AtomicU64::new(0),

            start_time: Instant::now(),
            started_at: Utc::now(),
        }
    }

    // Operation count methods

    /// Count a successful store operation
    pub fn record_operation(&self, action: Action) {
        let counter = match action {
            Action::Get => &self.get_count,
            Action::Put => &self.put_count,
            Action::Delete => &self.delete_count,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a failed shard operation
    pub fn record_shard_error(&self, err: ShardError) {
        let counter = match err {
            ShardError::KeyNotFound => &self.not_found_count,
            ShardError::KeyAlreadyExists => &self.already_exists_count,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Count an unclassified internal failure
    pub fn increment_internal_errors(&self) {
        self.internal_error_count.fetch_add(1, Ordering::Relaxed);
    }

    // Logger metrics methods

    /// Count an event entry written to the sink
    pub fn record_event_logged(&self, bytes: usize) {
        self.events_logged.fetch_add(1, Ordering::Relaxed);
        self.sink_bytes_written.fetch_add(bytes, Ordering::Relaxed);

        #[cfg(feature = "metrics")]
        ::metrics::increment_counter!("shardlog_events_logged_total");
    }

    /// Count an error entry written to the sink
    pub fn record_error_logged(&self, bytes: usize) {
        self.errors_logged.fetch_add(1, Ordering::Relaxed);
        self.sink_bytes_written.fetch_add(bytes, Ordering::Relaxed);

        #[cfg(feature = "metrics")]
        ::metrics::increment_counter!("shardlog_errors_logged_total");
    }

    /// Count a line that could not be written to the sink
    pub fn increment_sink_write_failures(&self) {
        self.sink_write_failures.fetch_add(1, Ordering::Relaxed);

        #[cfg(feature = "metrics")]
        ::metrics::increment_counter!("shardlog_sink_write_failures_total");
    }

    /// Record a producer that blocked on a full queue for `duration`
    pub fn record_backpressure(&self, duration: Duration) {
        self.backpressure_stalls.fetch_add(1, Ordering::Relaxed);
        self.backpressure_wait_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);

        #[cfg(feature = "metrics")]
        ::metrics::increment_counter!("shardlog_backpressure_stalls_total");
    }

    // Getters

    /// Get the count of successful operations of `action`
    pub fn get_operation_count(&self, action: Action) -> usize {
        match action {
            Action::Get => self.get_count.load(Ordering::Relaxed),
            Action::Put => self.put_count.load(Ordering::Relaxed),
            Action::Delete => self.delete_count.load(Ordering::Relaxed),
        }
    }

    /// Get the count of `err` outcomes
    pub fn get_shard_error_count(&self, err: ShardError) -> usize {
        match err {
            ShardError::KeyNotFound => self.not_found_count.load(Ordering::Relaxed),
            ShardError::KeyAlreadyExists => self.already_exists_count.load(Ordering::Relaxed),
        }
    }

    /// Get the count of internal failures
    pub fn get_internal_error_count(&self) -> usize {
        self.internal_error_count.load(Ordering::Relaxed)
    }

    /// Get the count of event entries written
    pub fn get_events_logged(&self) -> usize {
        self.events_logged.load(Ordering::Relaxed)
    }

    /// Get the count of error entries written
    pub fn get_errors_logged(&self) -> usize {
        self.errors_logged.load(Ordering::Relaxed)
    }

    /// Get the bytes appended to the sink
    pub fn get_sink_bytes_written(&self) -> usize {
        self.sink_bytes_written.load(Ordering::Relaxed)
    }

    /// Get the count of failed sink writes
    pub fn get_sink_write_failures(&self) -> usize {
        self.sink_write_failures.load(Ordering::Relaxed)
    }

    /// Get the number of producers that blocked on a full queue
    pub fn get_backpressure_stalls(&self) -> usize {
        self.backpressure_stalls.load(Ordering::Relaxed)
    }

    /// Get the total time producers spent blocked
    pub fn get_backpressure_wait(&self) -> Duration {
        Duration::from_nanos(self.backpressure_wait_ns.load(Ordering::Relaxed))
    }

    /// Get the uptime of the metrics collector
    pub fn get_uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Reset all counters
    pub fn reset(&self) {
        for counter in [
            &self.get_count,
            &self.put_count,
            &self.delete_count,
            &self.not_found_count,
            &self.already_exists_count,
            &self.internal_error_count,
            &self.events_logged,
            &self.errors_logged,
            &self.sink_bytes_written,
            &self.sink_write_failures,
            &self.backpressure_stalls,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        self.backpressure_wait_ns.store(0, Ordering::Relaxed);
    }

    /// Take a serializable snapshot of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            started_at: self.started_at,
            uptime_secs: self.get_uptime().as_secs(),
            gets: self.get_operation_count(Action::Get),
            puts: self.get_operation_count(Action::Put),
            deletes: self.get_operation_count(Action::Delete),
            not_found: self.get_shard_error_count(ShardError::KeyNotFound),
            already_exists: self.get_shard_error_count(ShardError::KeyAlreadyExists),
            internal_errors: self.get_internal_error_count(),
            events_logged: self.get_events_logged(),
            errors_logged: self.get_errors_logged(),
            sink_bytes_written: self.get_sink_bytes_written(),
            sink_write_failures: self.get_sink_write_failures(),
            backpressure_stalls: self.get_backpressure_stalls(),
            backpressure_wait_ms: self.get_backpressure_wait().as_millis() as u64,
        }
    }

    /// Get a report of all metrics
    pub fn get_report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== shardlog Metrics Report ===\n\n");

        report.push_str(&format!("Started: {}\n", self.started_at.to_rfc3339()));
        report.push_str(&format!("Uptime: {:?}\n\n", self.get_uptime()));

        report.push_str("Operation Counts:\n");
        report.push_str(&format!("  Gets: {}\n", self.get_operation_count(Action::Get)));
        report.push_str(&format!("  Puts: {}\n", self.get_operation_count(Action::Put)));
        report.push_str(&format!("  Deletes: {}\n\n", self.get_operation_count(Action::Delete)));

        report.push_str("Error Counts:\n");
        report.push_str(&format!("  Key Not Found: {}\n", self.get_shard_error_count(ShardError::KeyNotFound)));
        report.push_str(&format!("  Key Already Exists: {}\n", self.get_shard_error_count(ShardError::KeyAlreadyExists)));
        report.push_str(&format!("  Internal: {}\n\n", self.get_internal_error_count()));

        report.push_str("Logger Metrics:\n");
        report.push_str(&format!("  Events Logged: {}\n", self.get_events_logged()));
        report.push_str(&format!("  Errors Logged: {}\n", self.get_errors_logged()));
        report.push_str(&format!("  Bytes Written: {}\n", self.get_sink_bytes_written()));
        report.push_str(&format!("  Write Failures: {}\n", self.get_sink_write_failures()));
        report.push_str(&format!("  Backpressure Stalls: {}\n", self.get_backpressure_stalls()));
        report.push_str(&format!("  Backpressure Wait: {:?}\n", self.get_backpressure_wait()));

        report
    }
}

/// Serializable view of [`MetricsCollector`]
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
    pub gets: usize,
    pub puts: usize,
    pub deletes: usize,
    pub not_found: usize,
    pub already_exists: usize,
    pub internal_errors: usize,
    pub events_logged: usize,
    pub errors_logged: usize,
    pub sink_bytes_written: usize,
    pub sink_write_failures: usize,
    pub backpressure_stalls: usize,
    pub backpressure_wait_ms: u64,
}
