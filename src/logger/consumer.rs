//! Background loop that owns the sequence counter and the sink

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam::channel::{select, Receiver};

use crate::metrics::MetricsCollector;

use super::{EntryBody, LogEntry, LogSink};

/// Receiving ends of the logger queues.
///
/// In merged mode `errors` is a `never()` receiver and everything arrives
/// through `events`.
pub(crate) struct Queues {
    pub(crate) events: Receiver<EntryBody>,
    pub(crate) errors: Receiver<EntryBody>,
    /// Never carries a message; disconnection is the stop signal
    pub(crate) shutdown: Receiver<()>,
}

/// Single writer of the sink. Nothing else touches `sequence_id`.
pub(crate) struct SinkWriter<S: LogSink> {
    sink: S,
    sequence_id: u64,
    /// Read-only mirror of `sequence_id` for observers
    published: Arc<AtomicU64>,
    metrics: Arc<MetricsCollector>,
    line: String,
    dirty: bool,
}

impl<S: LogSink> SinkWriter<S> {
    pub(crate) fn new(sink: S, published: Arc<AtomicU64>, metrics: Arc<MetricsCollector>) -> Self {
        Self {
            sink,
            sequence_id: 0,
            published,
            metrics,
            line: String::with_capacity(128),
            dirty: false,
        }
    }

    /// Number the entry and append it.
    ///
    /// The counter advances once any byte of the line reached the sink. A
    /// write that fails before accepting anything leaves no trace and its id
    /// is reused, so the sink has no gaps. A line cut short is terminated with
    /// a best-effort newline and keeps its id, so the next entry always starts
    /// a fresh line. Failures are logged and counted, never reported back to
    /// the producer.
    fn append(&mut self, body: EntryBody) {
        let is_error = matches!(body, EntryBody::Error(_));
        let entry = LogEntry {
            sequence_id: self.sequence_id + 1,
            body,
        };

        self.line.clear();
        entry.write_line(&mut self.line);

        let (accepted, written) = self.write_line();
        if accepted > 0 {
            self.sequence_id = entry.sequence_id;
            self.published.store(self.sequence_id, Ordering::Release);
            self.dirty = true;
        }

        match written {
            Ok(()) => {
                if is_error {
                    self.metrics.record_error_logged(self.line.len());
                } else {
                    self.metrics.record_event_logged(self.line.len());
                }
            }
            Err(e) => {
                self.metrics.increment_sink_write_failures();
                tracing::error!(
                    sequence_id = entry.sequence_id,
                    accepted_bytes = accepted,
                    error = %e,
                    "failed to append log entry"
                );
            }
        }
    }

    /// Write the pending line and commit it, returning how many bytes the
    /// sink accepted alongside the outcome.
    fn write_line(&mut self) -> (usize, io::Result<()>) {
        let bytes = self.line.as_bytes();
        let mut accepted = 0;

        while accepted < bytes.len() {
            match self.sink.write(&bytes[accepted..]) {
                Ok(0) => {
                    return (accepted, Self::cut(&mut self.sink, accepted, io::ErrorKind::WriteZero.into()));
                }
                Ok(n) => accepted += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return (accepted, Self::cut(&mut self.sink, accepted, e)),
            }
        }

        (accepted, self.sink.commit())
    }

    /// Close off a partially written line
    fn cut(sink: &mut S, accepted: usize, err: io::Error) -> io::Result<()> {
        if accepted > 0 {
            if let Err(e) = sink.write_all(b"\n") {
                tracing::warn!(error = %e, "could not terminate partial log line");
            }
        }
        Err(err)
    }

    fn flush(&mut self) {
        if !self.dirty {
            return;
        }
        self.dirty = false;

        if let Err(e) = self.sink.flush() {
            self.metrics.increment_sink_write_failures();
            tracing::error!(
                last_sequence_id = self.sequence_id,
                error = %e,
                "failed to flush log sink"
            );
        }
    }
}

/// Consume both queues until shutdown, then drain and return the last
/// sequence id written.
///
/// When both queues are ready `select!` picks one at random; there is no
/// priority between events and errors.
pub(crate) fn run<S: LogSink>(queues: Queues, mut writer: SinkWriter<S>) -> u64 {
    let Queues {
        events,
        errors,
        shutdown,
    } = queues;

    tracing::debug!("event logger started");

    loop {
        select! {
            recv(events) -> msg => match msg {
                Ok(body) => writer.append(body),
                Err(_) => break,
            },
            recv(errors) -> msg => match msg {
                Ok(body) => writer.append(body),
                Err(_) => break,
            },
            recv(shutdown) -> _ => break,
        }

        // Batch flushes: only when caught up
        if events.is_empty() && errors.is_empty() {
            writer.flush();
        }
    }

    // Drain what was queued before the stop, alternating queues
    loop {
        let mut progressed = false;

        if let Ok(body) = events.try_recv() {
            writer.append(body);
            progressed = true;
        }
        if let Ok(body) = errors.try_recv() {
            writer.append(body);
            progressed = true;
        }

        if !progressed {
            break;
        }
    }
    writer.flush();

    tracing::debug!(last_sequence_id = writer.sequence_id, "event logger stopped");
    writer.sequence_id
}
