//! # SD Record Logger
//!
//! Buffered, append-only logging of text records to a mounted storage volume such as an
//! SD card. Records are held in memory and committed in blocks to cut down on flash
//! write cycles; records that must not be lost can bypass the buffer.
//!
//! ## Crate Structure
//!
//! - **`logger`**: `RecordLogger`, the buffered append engine, and its `LoggerOptions`.
//! - **`shared`**: `SharedLogger`, a mutex-serialized handle for several producers.
//! - **`record`**: line framing and validation of records and header columns.
//! - **`storage`**: the `StorageMount` trait the logger writes through, with a host
//!   filesystem volume and an in-memory volume for tests.
//! - **`config`**: Figment-based configuration (TOML file + environment).
//! - **`error`**: the `LoggerError` enum shared by every module.
//! - **`tracing_setup`**: subscriber initialization for binaries.
//!
//! Mounting the card (bus wiring, card init, filesystem mount) happens before any of
//! this code runs; the logger only checks that the mount point exists.

pub mod config;
pub mod error;
pub mod logger;
pub mod record;
pub mod shared;
pub mod storage;
pub mod tracing_setup;

pub use error::{LoggerError, LoggerResult};
pub use logger::{LoggerOptions, LoggerState, RecordLogger};
pub use shared::SharedLogger;
pub use storage::{HostVolume, MemoryVolume, OpenMode, StorageMount};
