//! Asynchronous, sequence-numbered event logging
//!
//! Request threads submit [`Event`]s and [`ErrorEvent`]s; a single background
//! consumer owns the sequence counter and is the only writer to the sink.
//! The log is append-only and write-only: nothing here replays it.

mod consumer;
mod entry;
mod event;
mod handle;
mod sink;

pub use entry::{EntryBody, LogEntry, NULL_FIELD};
pub use event::{Action, ErrorEvent, Event};
pub use handle::EventLogger;
pub use sink::{FileSink, LogSink, MemorySink};
