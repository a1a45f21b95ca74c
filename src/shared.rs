//! Thread-safe handle for loggers fed by several producers.
//!
//! A [`RecordLogger`] assumes a single writer. `SharedLogger` puts it behind a mutex and
//! holds the lock for the whole of each operation, so a buffered write and the flush it
//! triggers (or an immediate append) are never interleaved with another producer's.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{LoggerError, LoggerResult};
use crate::logger::{LoggerOptions, RecordLogger};
use crate::storage::StorageMount;

/// Cloneable, mutex-serialized [`RecordLogger`].
pub struct SharedLogger<S: StorageMount> {
    inner: Arc<Mutex<RecordLogger<S>>>,
}

impl<S: StorageMount> Clone for SharedLogger<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: StorageMount> SharedLogger<S> {
    /// Take ownership of `logger`.
    pub fn new(logger: RecordLogger<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(logger)),
        }
    }

    /// Build the logger with [`RecordLogger::with_options`] and wrap it.
    pub fn with_options(volume: S, options: LoggerOptions) -> LoggerResult<Self> {
        RecordLogger::with_options(volume, options).map(Self::new)
    }

    fn lock(&self) -> LoggerResult<MutexGuard<'_, RecordLogger<S>>> {
        self.inner.lock().map_err(|_| LoggerError::LockPoisoned)
    }

    /// See [`RecordLogger::write_buffered`].
    pub fn write_buffered(&self, record: impl Into<String>) -> LoggerResult<()> {
        self.lock()?.write_buffered(record)
    }

    /// See [`RecordLogger::write_immediate`].
    pub fn write_immediate(&self, record: &str) -> LoggerResult<()> {
        self.lock()?.write_immediate(record)
    }

    /// See [`RecordLogger::flush`].
    pub fn flush(&self) -> LoggerResult<()> {
        self.lock()?.flush()
    }

    /// Close the underlying logger. Other clones see it closed too.
    pub fn close(&self) -> LoggerResult<()> {
        self.lock()?.close()
    }

    /// Records waiting in the buffer.
    pub fn pending_len(&self) -> LoggerResult<usize> {
        Ok(self.lock()?.pending_len())
    }

    /// Whether the logger has been closed.
    pub fn is_closed(&self) -> LoggerResult<bool> {
        Ok(self.lock()?.is_closed())
    }

    /// Run `f` with the logger locked, for reads not covered by the methods above.
    pub fn with_logger<R>(&self, f: impl FnOnce(&RecordLogger<S>) -> R) -> LoggerResult<R> {
        Ok(f(&*self.lock()?))
    }
}
