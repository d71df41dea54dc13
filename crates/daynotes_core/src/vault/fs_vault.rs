//! File-system vault.
//!
//! # Responsibility
//! - List documents under a root directory with creation/modification times.
//!
//! # Invariants
//! - Paths are vault-relative and `/`-separated on every platform.
//! - Hidden entries (leading `.`) are skipped together with their subtrees.
//! - Only files whose relative path matches the include pattern are listed.
//! - Platforms without birth time report `created_at = modified_at`.

use super::{DocumentSource, VaultError};
use crate::model::document::{Document, EpochMillis};
use log::{debug, info};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use walkdir::{DirEntry, WalkDir};

/// Default include rule: markdown documents.
pub const DEFAULT_INCLUDE_PATTERN: &str = r"\.md$";

/// `DocumentSource` scanning a directory tree on every listing.
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
    include: Regex,
}

impl FsVault {
    /// Opens a vault rooted at `root` listing markdown files.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, VaultError> {
        Self::with_pattern(root, DEFAULT_INCLUDE_PATTERN)
    }

    /// Opens a vault rooted at `root` listing files matching `pattern`.
    pub fn with_pattern(root: impl Into<PathBuf>, pattern: &str) -> Result<Self, VaultError> {
        Ok(Self {
            root: root.into(),
            include: Regex::new(pattern)?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps an absolute file path to its vault-relative document path.
    pub fn relative_path(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let segments = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>();
        if segments.is_empty() {
            return None;
        }
        Some(segments.join("/"))
    }

    fn read_document(&self, entry: &DirEntry) -> Result<Option<Document>, VaultError> {
        let Some(path) = self.relative_path(entry.path()) else {
            return Ok(None);
        };
        if !self.include.is_match(&path) {
            return Ok(None);
        }

        let metadata = entry.metadata()?;
        let modified_at = metadata
            .modified()
            .map(to_epoch_millis)
            .map_err(|source| VaultError::Io {
                path: entry.path().to_path_buf(),
                source,
            })?;
        let created_at = metadata
            .created()
            .map(to_epoch_millis)
            .unwrap_or(modified_at);

        Ok(Some(Document::new(path, created_at, modified_at)))
    }
}

impl DocumentSource for FsVault {
    fn list_documents(&self) -> Result<Vec<Document>, VaultError> {
        let started_at = Instant::now();
        let mut documents = Vec::new();

        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(document) = self.read_document(&entry)? {
                debug!("event=vault_scan_entry module=vault path={}", document.path);
                documents.push(document);
            }
        }

        info!(
            "event=vault_scan module=vault status=ok documents={} duration_ms={}",
            documents.len(),
            started_at.elapsed().as_millis()
        );
        Ok(documents)
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn to_epoch_millis(time: SystemTime) -> EpochMillis {
    match time.duration_since(UNIX_EPOCH) {
        Ok(elapsed) => i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX),
        Err(before_epoch) => i64::try_from(before_epoch.duration().as_millis())
            .map(|millis| -millis)
            .unwrap_or(i64::MIN),
    }
}
