//! Vault-facing contracts: document listing and storage notifications.
//!
//! # Responsibility
//! - Define the events the external store fires after a mutation.
//! - Define the snapshot listing contract (`DocumentSource`).
//! - Provide an in-memory vault and a file-system vault.
//!
//! # Invariants
//! - Events describe mutations that already took effect.
//! - Listings are full snapshots; no filtering beyond the source's own
//!   include rule.

use crate::model::document::{Document, EntryKind};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod fs_vault;
mod memory;

pub use fs_vault::{FsVault, DEFAULT_INCLUDE_PATTERN};
pub use memory::MemoryVault;

/// Notification fired by the external store after a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultEvent {
    /// Something was created; re-read the listing.
    Created,
    /// Something was modified; re-read the listing.
    Modified,
    /// An entry was removed.
    Deleted { path: String, kind: EntryKind },
    /// An entry moved from `old_path` to `new_path`.
    Renamed {
        old_path: String,
        new_path: String,
        kind: EntryKind,
    },
}

impl VaultEvent {
    /// Stable event label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Deleted { .. } => "deleted",
            Self::Renamed { .. } => "renamed",
        }
    }
}

/// Errors produced by vault implementations.
#[derive(Debug)]
pub enum VaultError {
    /// No document at the given path.
    NotFound(String),
    /// A document already occupies the given path.
    AlreadyExists(String),
    /// Include pattern failed to compile.
    InvalidPattern(regex::Error),
    /// File-system failure while scanning.
    Io { path: PathBuf, source: std::io::Error },
    /// Directory walk failure.
    Walk(walkdir::Error),
}

impl Display for VaultError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "document not found: {path}"),
            Self::AlreadyExists(path) => write!(f, "document already exists: {path}"),
            Self::InvalidPattern(err) => write!(f, "invalid include pattern: {err}"),
            Self::Io { path, source } => write!(f, "failed to read `{}`: {source}", path.display()),
            Self::Walk(err) => write!(f, "failed to walk vault: {err}"),
        }
    }
}

impl Error for VaultError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidPattern(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::Walk(err) => Some(err),
            Self::NotFound(_) | Self::AlreadyExists(_) => None,
        }
    }
}

impl From<regex::Error> for VaultError {
    fn from(value: regex::Error) -> Self {
        Self::InvalidPattern(value)
    }
}

impl From<walkdir::Error> for VaultError {
    fn from(value: walkdir::Error) -> Self {
        Self::Walk(value)
    }
}

/// Synchronous snapshot listing of every document in the vault.
pub trait DocumentSource {
    fn list_documents(&self) -> Result<Vec<Document>, VaultError>;
}
