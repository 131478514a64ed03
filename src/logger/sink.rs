//! Append-only destinations for log lines

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs2::FileExt;
use parking_lot::Mutex;

use crate::config::StoreConfig;
use crate::error::{Error, Result};

/// Destination the logger thread appends lines to.
///
/// `commit` is called after every complete line; sinks that need per-line
/// durability do their syncing there.
pub trait LogSink: Write + Send + 'static {
    /// Make the most recent line durable, if the sink supports it
    fn commit(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogSink for Vec<u8> {}

impl LogSink for io::Sink {}

impl<S: LogSink + ?Sized> LogSink for Box<S> {
    fn commit(&mut self) -> io::Result<()> {
        (**self).commit()
    }
}

/// Log file opened in append mode, created if absent
#[derive(Debug)]
pub struct FileSink {
    writer: BufWriter<File>,
    path: PathBuf,
    sync_writes: bool,
}

impl FileSink {
    /// Open (or create) `path` for appending.
    ///
    /// With `lock` set, an exclusive advisory lock is taken so that a second
    /// logger pointed at the same file fails fast instead of interleaving.
    pub fn open<P: AsRef<Path>>(path: P, lock: bool, sync_writes: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)?;

        if lock {
            file.try_lock_exclusive().map_err(|e| {
                if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() {
                    Error::SinkLocked(path.clone())
                } else {
                    Error::Io(e)
                }
            })?;
        }

        Ok(Self {
            writer: BufWriter::new(file),
            path,
            sync_writes,
        })
    }

    /// Open the sink described by `config`
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        Self::open(&config.log_path, config.lock_sink, config.sync_writes)
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Write for FileSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl LogSink for FileSink {
    fn commit(&mut self) -> io::Result<()> {
        if self.sync_writes {
            self.writer.flush()?;
            self.writer.get_ref().sync_data()?;
        }
        Ok(())
    }
}

/// Shared in-memory sink; clones observe the same buffer
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    /// Written lines, without terminators
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogSink for MemorySink {}
