//! Storage Mount Provider
//!
//! The logger does not know how a volume got mounted (SPI bus setup, card init,
//! FAT mount). It only consumes the small file namespace defined by [`StorageMount`]:
//!
//! - `stat` to check that a path exists
//! - `open` in write-truncate or append mode
//! - `write` bytes to an open handle
//! - `close` the handle, committing what was written
//!
//! Handles are scoped to a single call of [`write_once`]; the logger never holds one
//! open across calls.
//!
//! # Available Volumes
//!
//! - [`HostVolume`] - directories on the host filesystem (`std::fs`)
//! - [`MemoryVolume`] - in-memory volume with fault injection, for tests and demos

use std::io;
use std::path::Path;

pub mod host;
pub mod memory;

pub use host::HostVolume;
pub use memory::{Fault, MemoryVolume};

/// How a file is opened on the volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Create the file, discarding any previous content.
    WriteTruncate,
    /// Create the file if missing and append to its end.
    Append,
}

/// A mounted, writable file namespace.
///
/// # Contract
/// - `stat` returns `Ok(false)` for a path that does not exist, and `Err` only when
///   the volume cannot answer the question.
/// - Bytes passed to `write` are visible to later opens once `close` returns `Ok`.
/// - Dropping a handle without `close` releases it; whether its bytes were committed
///   is up to the volume.
/// - An `Err` from `close` does not prove the bytes are absent. A volume that syncs on
///   close (see [`HostVolume`]) can fail after the data reached the file, so a caller
///   that retries the same bytes may append them twice.
pub trait StorageMount {
    /// Open file handle type.
    type Handle;

    /// Check whether `path` exists on the volume.
    fn stat(&self, path: &Path) -> io::Result<bool>;

    /// Open `path` for writing.
    fn open(&self, path: &Path, mode: OpenMode) -> io::Result<Self::Handle>;

    /// Write all of `bytes` to an open handle.
    fn write(&self, handle: &mut Self::Handle, bytes: &[u8]) -> io::Result<()>;

    /// Close a handle, committing its data to the volume.
    ///
    /// May fail after the data was committed; see the trait contract.
    fn close(&self, handle: Self::Handle) -> io::Result<()>;
}

/// Open `path`, write `bytes`, close. The handle never outlives this call.
pub fn write_once<S>(volume: &S, path: &Path, mode: OpenMode, bytes: &[u8]) -> io::Result<()>
where
    S: StorageMount + ?Sized,
{
    let mut handle = volume.open(path, mode)?;
    volume.write(&mut handle, bytes)?;
    volume.close(handle)
}
