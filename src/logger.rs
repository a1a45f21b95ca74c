//! Buffered record logger.
//!
//! `RecordLogger` binds one log stream to one file on a mounted volume and decides when
//! records live in memory and when they are committed to storage. Every commit opens the
//! file, appends, and closes it again, so buffering trades a bounded window of records
//! (lost on power failure) for fewer write cycles on the card.
//!
//! Two write paths are offered:
//!
//! - [`RecordLogger::write_buffered`] collects records and appends them as one block once
//!   `buffer_capacity` records are pending. Use it for high-frequency telemetry.
//! - [`RecordLogger::write_immediate`] appends a single record right away and leaves the
//!   buffer untouched. Use it for records that must survive an immediate crash.
//!
//! Both paths reject records containing line breaks.
//!
//! # Lifecycle
//!
//! ```text
//! Constructed -> { Idle <-> Buffering } -> Closed
//! ```
//!
//! Callers must end a logger with [`RecordLogger::close`], which flushes what is still
//! pending. Dropping an unclosed logger with pending records attempts one last flush and
//! logs a warning; a process crash or abort skips it, so it is not part of the contract.
//!
//! # Example
//! ```no_run
//! use sd_logger::{HostVolume, RecordLogger};
//!
//! # fn main() -> Result<(), sd_logger::LoggerError> {
//! let headers = vec!["date".to_string(), "value".to_string()];
//! let mut logger = RecordLogger::new(HostVolume::new(), "sensor.csv", "/sd", 3, Some(headers))?;
//! logger.write_buffered("2024-01-01;10")?;
//! logger.write_immediate("2024-01-01;99")?;
//! logger.close()?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use tracing::{debug, info, trace, warn};

use crate::error::{LoggerError, LoggerResult};
use crate::record::{
    frame_block, frame_record, header_line, validate_delimiter, validate_file_name,
    validate_header, validate_record,
};
use crate::storage::{write_once, OpenMode, StorageMount};

/// Records held in memory before an automatic flush.
pub const DEFAULT_BUFFER_CAPACITY: usize = 60;

/// Separator between header columns.
pub const DEFAULT_DELIMITER: char = ';';

/// Directory the SD card is usually mounted on.
pub const DEFAULT_MOUNT_POINT: &str = "sd";

/// Construction parameters for a [`RecordLogger`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoggerOptions {
    /// Bare file name inside the mount point.
    pub file_name: String,
    /// Directory the volume is mounted on.
    pub mount_point: PathBuf,
    /// Records held in memory before an automatic flush (at least 1).
    pub buffer_capacity: usize,
    /// Separator between header columns. Must not be a line break.
    pub delimiter: char,
    /// First line of a newly created file.
    pub header_columns: Option<Vec<String>>,
}

impl LoggerOptions {
    /// Options for `<mount_point>/<file_name>` with default capacity and delimiter, no header.
    pub fn new(file_name: impl Into<String>, mount_point: impl Into<PathBuf>) -> Self {
        Self {
            file_name: file_name.into(),
            mount_point: mount_point.into(),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            delimiter: DEFAULT_DELIMITER,
            header_columns: None,
        }
    }

    /// Set the number of records buffered before a flush.
    pub fn with_capacity(mut self, buffer_capacity: usize) -> Self {
        self.buffer_capacity = buffer_capacity;
        self
    }

    /// Set the header column separator.
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the header columns written to a new file.
    pub fn with_headers<I, T>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.header_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Path of the log file: `<mount_point>/<file_name>`.
    pub fn target_path(&self) -> PathBuf {
        self.mount_point.join(&self.file_name)
    }
}

/// Lifecycle state of a logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerState {
    /// Accepting writes.
    Open,
    /// Flushed and closed; terminal.
    Closed,
}

/// Buffered, append-only text logger bound to a single file.
pub struct RecordLogger<S: StorageMount> {
    volume: S,
    target_path: PathBuf,
    delimiter: char,
    header_columns: Option<Vec<String>>,
    capacity: usize,
    pending: Vec<String>,
    state: LoggerState,
}

impl<S: StorageMount> RecordLogger<S> {
    /// Create a logger for `<mount_point>/<file_name>` using the default delimiter.
    ///
    /// # Errors
    /// - `MountNotFound` if `mount_point` cannot be stat'ed on `volume`
    /// - `InvalidCapacity` if `buffer_capacity` is 0
    /// - `Configuration` if `file_name` is not a bare name inside the mount point
    /// - `InvalidHeader` if a header column would break the header line
    /// - `Io` if the header line cannot be written
    pub fn new(
        volume: S,
        file_name: impl Into<String>,
        mount_point: impl Into<PathBuf>,
        buffer_capacity: usize,
        header_columns: Option<Vec<String>>,
    ) -> LoggerResult<Self> {
        let mut options = LoggerOptions::new(file_name, mount_point).with_capacity(buffer_capacity);
        options.header_columns = header_columns;
        Self::with_options(volume, options)
    }

    /// Create a logger from [`LoggerOptions`].
    ///
    /// The mount point must already be mounted; this never tries to mount it. When
    /// header columns are given and the target file does not exist yet, the file is
    /// created holding only the header line. An existing file is left as it is.
    pub fn with_options(volume: S, options: LoggerOptions) -> LoggerResult<Self> {
        if options.buffer_capacity == 0 {
            return Err(LoggerError::InvalidCapacity);
        }
        validate_file_name(&options.file_name)?;
        validate_delimiter(options.delimiter)?;
        if let Some(columns) = &options.header_columns {
            validate_header(columns, options.delimiter)?;
        }

        let mounted = match volume.stat(&options.mount_point) {
            Ok(found) => found,
            Err(err) => {
                debug!(
                    mount_point = %options.mount_point.display(),
                    error = %err,
                    "stat on mount point failed"
                );
                false
            }
        };
        if !mounted {
            return Err(LoggerError::MountNotFound {
                mount_point: options.mount_point,
            });
        }

        let target_path = options.target_path();
        let logger = Self {
            volume,
            target_path,
            delimiter: options.delimiter,
            header_columns: options.header_columns,
            capacity: options.buffer_capacity,
            pending: Vec::new(),
            state: LoggerState::Open,
        };
        logger.write_header_if_new()?;

        debug!(
            path = %logger.target_path.display(),
            capacity = logger.capacity,
            "record logger ready"
        );
        Ok(logger)
    }

    fn write_header_if_new(&self) -> LoggerResult<()> {
        let Some(columns) = &self.header_columns else {
            return Ok(());
        };
        if self.volume.stat(&self.target_path)? {
            trace!(path = %self.target_path.display(), "file exists, header skipped");
            return Ok(());
        }

        let line = header_line(columns, self.delimiter);
        write_once(
            &self.volume,
            &self.target_path,
            OpenMode::WriteTruncate,
            line.as_bytes(),
        )?;
        info!(
            path = %self.target_path.display(),
            columns = columns.len(),
            "created log file with header"
        );
        Ok(())
    }

    /// Buffer `record`, flushing the buffer once it holds `buffer_capacity` records.
    ///
    /// If a previous flush failed and the buffer is still full, that flush is retried
    /// first; when it fails again the new record is rejected so the buffer never grows
    /// past its capacity.
    ///
    /// # Errors
    /// - `InvalidRecord` if the record contains a line break (nothing is buffered)
    /// - `Io` if a triggered flush fails (buffered records are kept)
    /// - `Closed` after [`close`](Self::close)
    pub fn write_buffered(&mut self, record: impl Into<String>) -> LoggerResult<()> {
        self.ensure_open()?;
        let record = record.into();
        validate_record(&record)?;

        if self.pending.len() >= self.capacity {
            self.flush_pending()?;
        }

        self.pending.push(record);
        if self.pending.len() >= self.capacity {
            self.flush_pending()?;
        }
        Ok(())
    }

    /// Append `record` to the file right away, bypassing the buffer.
    ///
    /// Pending buffered records are neither written nor cleared, so an immediate record
    /// can land in the file ahead of buffered records submitted before it.
    pub fn write_immediate(&mut self, record: &str) -> LoggerResult<()> {
        self.ensure_open()?;
        validate_record(record)?;

        let line = frame_record(record);
        write_once(
            &self.volume,
            &self.target_path,
            OpenMode::Append,
            line.as_bytes(),
        )?;
        trace!(path = %self.target_path.display(), "record written immediately");
        Ok(())
    }

    /// Append all pending records to the file as one block.
    ///
    /// Does nothing when the buffer is empty. The buffer is cleared only after the
    /// volume has confirmed the write; on failure every record stays pending.
    ///
    /// Delivery is at-least-once: if the bytes reached the file but `close` on the
    /// handle then failed (a failed sync, say), a retried flush appends the same
    /// records again.
    pub fn flush(&mut self) -> LoggerResult<()> {
        self.ensure_open()?;
        self.flush_pending()
    }

    fn flush_pending(&mut self) -> LoggerResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let block = frame_block(&self.pending);
        if let Err(err) = write_once(
            &self.volume,
            &self.target_path,
            OpenMode::Append,
            block.as_bytes(),
        ) {
            warn!(
                path = %self.target_path.display(),
                records = self.pending.len(),
                error = %err,
                "flush failed, records kept in buffer"
            );
            return Err(err.into());
        }

        debug!(
            path = %self.target_path.display(),
            records = self.pending.len(),
            bytes = block.len(),
            "flushed buffer"
        );
        self.pending.clear();
        Ok(())
    }

    /// Flush what is pending and close the logger.
    ///
    /// Closing an already closed logger is a no-op. If the final flush fails the logger
    /// stays open with its records, and `close` may be called again.
    pub fn close(&mut self) -> LoggerResult<()> {
        if self.state == LoggerState::Closed {
            return Ok(());
        }
        self.flush_pending()?;
        self.state = LoggerState::Closed;
        debug!(path = %self.target_path.display(), "record logger closed");
        Ok(())
    }

    fn ensure_open(&self) -> LoggerResult<()> {
        match self.state {
            LoggerState::Open => Ok(()),
            LoggerState::Closed => Err(LoggerError::Closed),
        }
    }

    /// Path of the log file on the volume.
    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    /// Records held before an automatic flush.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records buffered but not yet written, oldest first.
    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    /// Number of records waiting in the buffer.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Header column separator.
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Header columns given at construction, if any.
    pub fn header_columns(&self) -> Option<&[String]> {
        self.header_columns.as_deref()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LoggerState {
        self.state
    }

    /// Whether [`close`](Self::close) has completed.
    pub fn is_closed(&self) -> bool {
        self.state == LoggerState::Closed
    }

    /// The volume this logger writes through.
    pub fn volume(&self) -> &S {
        &self.volume
    }
}

impl<S: StorageMount> Drop for RecordLogger<S> {
    fn drop(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        warn!(
            path = %self.target_path.display(),
            records = self.pending.len(),
            "record logger dropped without close, flushing pending records"
        );
        if let Err(err) = self.flush_pending() {
            warn!(
                path = %self.target_path.display(),
                records = self.pending.len(),
                error = %err,
                "pending records lost on drop"
            );
        }
    }
}

impl<S: StorageMount> std::fmt::Debug for RecordLogger<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordLogger")
            .field("target_path", &self.target_path)
            .field("capacity", &self.capacity)
            .field("pending", &self.pending.len())
            .field("state", &self.state)
            .finish()
    }
}
