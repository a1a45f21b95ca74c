//! Host filesystem volume.
//!
//! On a board running an OS (or on a development machine) the SD card shows up as a
//! mounted directory, so the collaborator contract maps directly onto `std::fs`.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use super::{OpenMode, StorageMount};

/// `StorageMount` backed by the host filesystem.
///
/// By default every `close` calls `sync_all` so a record acknowledged by the logger has
/// reached the card, not just the page cache. A failed `sync_all` is reported after the
/// bytes were already appended.
#[derive(Debug, Clone)]
pub struct HostVolume {
    sync_on_close: bool,
}

impl HostVolume {
    /// Host volume that syncs every file on close.
    pub fn new() -> Self {
        Self {
            sync_on_close: true,
        }
    }

    /// Skip `sync_all` on close. Faster, but acknowledged data may still be cached.
    pub fn without_sync() -> Self {
        Self {
            sync_on_close: false,
        }
    }

    /// Whether `close` calls `sync_all`.
    pub fn syncs_on_close(&self) -> bool {
        self.sync_on_close
    }
}

impl Default for HostVolume {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageMount for HostVolume {
    type Handle = File;

    fn stat(&self, path: &Path) -> io::Result<bool> {
        match fs::metadata(path) {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn open(&self, path: &Path, mode: OpenMode) -> io::Result<File> {
        let mut options = OpenOptions::new();
        match mode {
            OpenMode::WriteTruncate => options.write(true).create(true).truncate(true),
            OpenMode::Append => options.append(true).create(true),
        };
        options.open(path)
    }

    fn write(&self, handle: &mut File, bytes: &[u8]) -> io::Result<()> {
        handle.write_all(bytes)
    }

    fn close(&self, mut handle: File) -> io::Result<()> {
        handle.flush()?;
        if self.sync_on_close {
            handle.sync_all()?;
        }
        Ok(())
    }
}
