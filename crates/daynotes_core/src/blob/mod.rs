//! Durable key-value blob storage.
//!
//! # Responsibility
//! - Define the opaque load/save contract the core persists through.
//! - Provide in-memory, JSON-file and SQLite-backed implementations.
//!
//! # Invariants
//! - `save` returns only after the bytes are durably committed, or an error.
//! - `load` of a never-written key returns `Ok(None)`, not an error.
//! - Implementations never retry internally.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod file;
mod memory;
mod sqlite;

pub use file::JsonFileBlobStore;
pub use memory::MemoryBlobStore;
pub use sqlite::{SqliteBlobStore, BLOB_SCHEMA_VERSION};

pub type BlobResult<T> = Result<T, BlobError>;

/// Failure reported by a durable blob backend.
#[derive(Debug)]
pub enum BlobError {
    /// File-system failure while reading or committing a blob.
    Io(std::io::Error),
    /// SQLite statement or connection failure.
    Sqlite(rusqlite::Error),
    /// The blob database was written by a newer build with a different layout.
    SchemaTooNew { found: u32, supported: u32 },
    /// Key cannot be mapped onto the backend (e.g. path separators in a file key).
    InvalidKey(String),
    /// Injected failure from a test double.
    Injected(String),
}

impl Display for BlobError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "blob io failure: {err}"),
            Self::Sqlite(err) => write!(f, "blob db failure: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "blob db schema version {found} is newer than supported {supported}"
            ),
            Self::InvalidKey(key) => write!(f, "invalid blob key `{key}`"),
            Self::Injected(message) => write!(f, "injected blob failure: {message}"),
        }
    }
}

impl Error for BlobError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Sqlite(err) => Some(err),
            Self::SchemaTooNew { .. } | Self::InvalidKey(_) | Self::Injected(_) => None,
        }
    }
}

impl From<std::io::Error> for BlobError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for BlobError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Opaque durable key-value store the core loads from and saves into.
pub trait BlobStore {
    /// Reads the blob stored under `key`, `None` when never written.
    fn load(&self, key: &str) -> BlobResult<Option<Vec<u8>>>;
    /// Durably replaces the blob stored under `key`.
    fn save(&mut self, key: &str, bytes: &[u8]) -> BlobResult<()>;
}

impl<T: BlobStore + ?Sized> BlobStore for Box<T> {
    fn load(&self, key: &str) -> BlobResult<Option<Vec<u8>>> {
        (**self).load(key)
    }

    fn save(&mut self, key: &str, bytes: &[u8]) -> BlobResult<()> {
        (**self).save(key, bytes)
    }
}
