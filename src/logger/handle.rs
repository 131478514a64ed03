//! Producer-side handle: queues, backpressure and shutdown

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam::channel::{bounded, never, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};

use crate::config::{QueueMode, StoreConfig};
use crate::error::{Error, Result};
use crate::metrics::MetricsCollector;

use super::consumer::{self, Queues, SinkWriter};
use super::{EntryBody, ErrorEvent, Event, FileSink, LogSink};

/// Asynchronous, sequence-numbered journal of store outcomes.
///
/// Producers hand events and errors to bounded queues; one background
/// thread numbers them and appends them to the sink in the order it
/// dequeues them. Sequence ids are global across queues, start at 1
/// and have no gaps. They reflect consumption order, which under
/// concurrency need not match the order the store applied the mutations.
///
/// A full queue blocks the producer (no timeout) rather than dropping data.
///
/// With [`QueueMode::Merged`] (the default) both kinds share one queue, so
/// entries from a single producer keep their submission order.
/// [`QueueMode::Split`] gives each kind its own queue with no priority
/// between them.
pub struct EventLogger {
    events: Sender<EntryBody>,
    errors: Sender<EntryBody>,
    /// Set once by `close`; senders hold the read side across their send
    closed: RwLock<bool>,
    shutdown: Mutex<Option<Sender<()>>>,
    handle: Mutex<Option<JoinHandle<u64>>>,
    last_sequence_id: Arc<AtomicU64>,
    metrics: Arc<MetricsCollector>,
    capacity: usize,
    mode: QueueMode,
}

impl EventLogger {
    /// Open the log file named by `config` and start the logger thread
    pub fn open(config: &StoreConfig, metrics: Arc<MetricsCollector>) -> Result<Self> {
        config.validate()?;

        let sink = FileSink::from_config(config)?;
        tracing::info!(
            path = %sink.path().display(),
            capacity = config.queue_capacity,
            mode = %config.queue_mode,
            sync_writes = config.sync_writes,
            "opened log sink"
        );

        Self::with_sink(sink, config.queue_capacity, config.queue_mode, metrics)
    }

    /// Start a logger writing to `sink`, with `capacity` slots per queue
    pub fn with_sink<S: LogSink>(
        sink: S,
        capacity: usize,
        mode: QueueMode,
        metrics: Arc<MetricsCollector>,
    ) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::config("Queue capacity must be at least 1"));
        }

        let (event_tx, event_rx) = bounded(capacity);
        let (error_tx, error_rx) = match mode {
            QueueMode::Split => bounded(capacity),
            QueueMode::Merged => (event_tx.clone(), never()),
        };
        let (shutdown_tx, shutdown_rx) = bounded(1);

        let last_sequence_id = Arc::new(AtomicU64::new(0));
        let writer = SinkWriter::new(sink, last_sequence_id.clone(), metrics.clone());
        let queues = Queues {
            events: event_rx,
            errors: error_rx,
            shutdown: shutdown_rx,
        };

        let handle = thread::Builder::new()
            .name("shardlog-logger".to_string())
            .spawn(move || consumer::run(queues, writer))?;

        Ok(Self {
            events: event_tx,
            errors: error_tx,
            closed: RwLock::new(false),
            shutdown: Mutex::new(Some(shutdown_tx)),
            handle: Mutex::new(Some(handle)),
            last_sequence_id,
            metrics,
            capacity,
            mode,
        })
    }

    /// Queue a successful operation, blocking while the event queue is full
    pub fn record(&self, event: Event) -> Result<()> {
        self.send_blocking(&self.events, EntryBody::Event(event))
    }

    /// Queue a client-facing failure, blocking while its queue is full
    pub fn record_error(&self, err: impl Into<ErrorEvent>) -> Result<()> {
        self.send_blocking(&self.errors, EntryBody::Error(err.into()))
    }

    /// Queue an event without blocking; fails with `QueueFull` at capacity
    pub fn try_record(&self, event: Event) -> Result<()> {
        self.send_now(&self.events, EntryBody::Event(event))
    }

    /// Queue an error without blocking; fails with `QueueFull` at capacity
    pub fn try_record_error(&self, err: impl Into<ErrorEvent>) -> Result<()> {
        self.send_now(&self.errors, EntryBody::Error(err.into()))
    }

    fn send_now(&self, queue: &Sender<EntryBody>, item: EntryBody) -> Result<()> {
        let closed = self.closed.read();
        if *closed {
            return Err(Error::LoggerClosed);
        }

        queue.try_send(item).map_err(|e| match e {
            TrySendError::Full(_) => Error::QueueFull,
            TrySendError::Disconnected(_) => Error::LoggerClosed,
        })
    }

    fn send_blocking(&self, queue: &Sender<EntryBody>, item: EntryBody) -> Result<()> {
        let closed = self.closed.read();
        if *closed {
            return Err(Error::LoggerClosed);
        }

        match queue.try_send(item) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(item)) => {
                // Backpressure: wait for the consumer to free a slot
                let start = Instant::now();
                queue.send(item).map_err(|_| Error::LoggerClosed)?;
                self.metrics.record_backpressure(start.elapsed());
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(Error::LoggerClosed),
        }
    }

    /// Sequence id of the last entry written, 0 before the first
    pub fn last_sequence_id(&self) -> u64 {
        self.last_sequence_id.load(Ordering::Acquire)
    }

    /// Capacity of each queue
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Queueing mode
    pub fn mode(&self) -> QueueMode {
        self.mode
    }

    /// Entries queued but not yet consumed
    pub fn pending(&self) -> usize {
        match self.mode {
            QueueMode::Split => self.events.len() + self.errors.len(),
            QueueMode::Merged => self.events.len(),
        }
    }

    /// Check if the logger has been closed
    pub fn is_closed(&self) -> bool {
        *self.closed.read()
    }

    /// Stop the logger thread after draining everything already queued.
    ///
    /// Returns the last sequence id written. Every record accepted before
    /// this call is written; records submitted after it fail with
    /// `LoggerClosed`. Closing twice is a no-op.
    pub fn close(&self) -> Result<u64> {
        // Waits out in-flight sends, so everything accepted is queued
        *self.closed.write() = true;

        // Dropping the only sender disconnects the shutdown channel
        drop(self.shutdown.lock().take());

        let handle = match self.handle.lock().take() {
            Some(handle) => handle,
            None => return Ok(self.last_sequence_id()),
        };

        let last = handle
            .join()
            .map_err(|_| Error::internal("event logger thread panicked"))?;

        tracing::info!(last_sequence_id = last, "event logger closed");
        Ok(last)
    }
}

impl Drop for EventLogger {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "error closing event logger");
        }
    }
}

impl std::fmt::Debug for EventLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLogger")
            .field("capacity", &self.capacity)
            .field("mode", &self.mode)
            .field("pending", &self.pending())
            .field("last_sequence_id", &self.last_sequence_id())
            .finish()
    }
}
