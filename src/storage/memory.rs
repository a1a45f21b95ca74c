//! In-memory storage volume.
//!
//! `MemoryVolume` stands in for a mounted SD card when no card is around. Clones share
//! the same state, so a test can hand one clone to a logger and inspect the files through
//! another. Faults can be injected per operation to exercise the logger's failure paths:
//! an injected fault stays active until cleared, like a card that keeps refusing writes.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{OpenMode, StorageMount};

/// Operation of the volume a fault can be injected into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    /// `open` fails; nothing is created or truncated.
    Open,
    /// `write` fails; nothing is staged.
    Write,
    /// `close` fails before committing; the staged bytes are lost.
    Close,
    /// `close` commits the staged bytes, then fails, like a sync error after the data
    /// already reached the card.
    Sync,
}

#[derive(Debug, Default)]
struct VolumeState {
    mounts: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, Vec<u8>>,
    faults: HashMap<Fault, io::ErrorKind>,
    opens: usize,
}

impl VolumeState {
    fn check(&self, fault: Fault) -> io::Result<()> {
        match self.faults.get(&fault) {
            Some(kind) => Err(io::Error::new(
                *kind,
                format!("injected {:?} fault", fault).to_lowercase(),
            )),
            None => Ok(()),
        }
    }

    fn is_mounted_file(&self, path: &Path) -> bool {
        self.mounts
            .iter()
            .any(|mount| path != mount.as_path() && path.starts_with(mount))
    }
}

/// Shared in-memory volume. Data written through a handle is committed on `close`.
#[derive(Debug, Clone, Default)]
pub struct MemoryVolume {
    state: Arc<Mutex<VolumeState>>,
}

/// Open handle on a [`MemoryVolume`] file.
#[derive(Debug)]
pub struct MemoryHandle {
    path: PathBuf,
    staged: Vec<u8>,
}

impl MemoryVolume {
    /// Create an empty volume with nothing mounted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a volume with `mount_point` already mounted.
    pub fn with_mount(mount_point: impl Into<PathBuf>) -> Self {
        let volume = Self::new();
        volume.mount(mount_point);
        volume
    }

    fn state(&self) -> MutexGuard<'_, VolumeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mount `mount_point`, making files under it visible again.
    pub fn mount(&self, mount_point: impl Into<PathBuf>) {
        self.state().mounts.insert(mount_point.into());
    }

    /// Unmount `mount_point`. Files stay on the "card" and reappear on remount.
    pub fn unmount(&self, mount_point: impl AsRef<Path>) {
        self.state().mounts.remove(mount_point.as_ref());
    }

    /// Place a file on the volume as if a previous session had written it.
    pub fn seed(&self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) {
        self.state().files.insert(path.into(), bytes.into());
    }

    /// Content of `path` as text, regardless of mount state.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.state()
            .files
            .get(path.as_ref())
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Lines of `path`, without their terminators. Empty if the file does not exist.
    pub fn lines(&self, path: impl AsRef<Path>) -> Vec<String> {
        self.contents(path)
            .map(|text| text.lines().map(str::to_owned).collect())
            .unwrap_or_default()
    }

    /// Whether `path` exists, regardless of mount state.
    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.state().files.contains_key(path.as_ref())
    }

    /// Make every subsequent `fault` operation fail with `kind` until cleared.
    pub fn inject(&self, fault: Fault, kind: io::ErrorKind) {
        self.state().faults.insert(fault, kind);
    }

    /// Stop injecting `fault`.
    pub fn clear(&self, fault: Fault) {
        self.state().faults.remove(&fault);
    }

    /// Stop injecting every fault.
    pub fn clear_faults(&self) {
        self.state().faults.clear();
    }

    /// Number of successful `open` calls so far (each one is a flash write cycle on a card).
    pub fn open_count(&self) -> usize {
        self.state().opens
    }
}

impl StorageMount for MemoryVolume {
    type Handle = MemoryHandle;

    fn stat(&self, path: &Path) -> io::Result<bool> {
        let state = self.state();
        Ok(state.mounts.contains(path)
            || (state.is_mounted_file(path) && state.files.contains_key(path)))
    }

    fn open(&self, path: &Path, mode: OpenMode) -> io::Result<Self::Handle> {
        let mut state = self.state();
        state.check(Fault::Open)?;
        if !state.is_mounted_file(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("'{}' is not on a mounted volume", path.display()),
            ));
        }
        match mode {
            OpenMode::WriteTruncate => {
                state.files.insert(path.to_path_buf(), Vec::new());
            }
            OpenMode::Append => {
                state.files.entry(path.to_path_buf()).or_default();
            }
        }
        state.opens += 1;
        Ok(MemoryHandle {
            path: path.to_path_buf(),
            staged: Vec::new(),
        })
    }

    fn write(&self, handle: &mut Self::Handle, bytes: &[u8]) -> io::Result<()> {
        self.state().check(Fault::Write)?;
        handle.staged.extend_from_slice(bytes);
        Ok(())
    }

    fn close(&self, handle: Self::Handle) -> io::Result<()> {
        let mut state = self.state();
        state.check(Fault::Close)?;
        state
            .files
            .entry(handle.path)
            .or_default()
            .extend_from_slice(&handle.staged);
        state.check(Fault::Sync)
    }
}
