//! Annotation store: the single source of truth for path → color labels.
//!
//! # Responsibility
//! - Serve O(1) color lookups for document paths.
//! - Apply user edits (`set`/`remove`) and storage reconciliation
//!   (`reconcile_rename`/`reconcile_delete`) as write-through mutations.
//!
//! # Invariants
//! - A successful call returns only after the record is durably saved.
//! - On a failed save the in-memory map keeps the attempted change; callers
//!   needing strict rollback must reload.
//! - Paths are matched by exact string equality.
//! - Rename onto an annotated path overwrites it (last writer wins).
//! - A write replaces only `noteColors`; sibling fields are re-read from the
//!   blob first, so a collaborator sharing the key keeps its latest writes.
//!
//! # Concurrency
//! Mutations take `&mut self`. Hosts sharing one store across threads must
//! wrap it (and therefore its save) in a single lock.

use crate::annotation::record::{decode_record, encode_record, AnnotationRecord};
use crate::blob::{BlobError, BlobStore};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Blob key the annotation record is stored under by default.
pub const DEFAULT_DATA_KEY: &str = "data";

pub type PersistResult<T> = Result<T, PersistenceError>;

/// Durable storage failure surfaced by annotation operations.
#[derive(Debug)]
pub enum PersistenceError {
    /// The durable record could not be read.
    Read(BlobError),
    /// The durable write did not complete.
    Write(BlobError),
    /// The record could not be serialized.
    Encode(serde_json::Error),
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read(err) => write!(f, "failed to read annotations: {err}"),
            Self::Write(err) => write!(f, "failed to persist annotations: {err}"),
            Self::Encode(err) => write!(f, "failed to encode annotations: {err}"),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read(err) | Self::Write(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Write-through path → color map persisted in a `BlobStore`.
pub struct AnnotationStore<B: BlobStore> {
    blobs: B,
    key: String,
    record: AnnotationRecord,
}

impl<B: BlobStore> AnnotationStore<B> {
    /// Loads the store from `DEFAULT_DATA_KEY`.
    pub fn load(blobs: B) -> PersistResult<Self> {
        Self::load_with_key(blobs, DEFAULT_DATA_KEY)
    }

    /// Loads the store from `key`, merging the stored record onto defaults.
    ///
    /// A missing or malformed record yields an empty map; only a failing
    /// backend read is an error.
    pub fn load_with_key(blobs: B, key: impl Into<String>) -> PersistResult<Self> {
        let key = key.into();
        let record = match blobs.load(&key).map_err(PersistenceError::Read)? {
            Some(bytes) => decode_record(&bytes),
            None => AnnotationRecord::default(),
        };
        info!(
            "event=annotations_load module=annotation status=ok key={} entries={}",
            key,
            record.note_colors.len()
        );
        Ok(Self { blobs, key, record })
    }

    /// Returns the color token for `path`, if any.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.record.note_colors.get(path).map(String::as_str)
    }

    /// Associates `color` with `path` and persists. The token is stored as given.
    pub fn set(&mut self, path: impl Into<String>, color: impl Into<String>) -> PersistResult<()> {
        let path = path.into();
        debug!("event=annotation_set module=annotation path={}", path);
        self.record.note_colors.insert(path, color.into());
        self.persist("set")
    }

    /// Removes the association for `path`.
    ///
    /// Returns `false` without writing when nothing was stored.
    pub fn remove(&mut self, path: &str) -> PersistResult<bool> {
        if self.record.note_colors.remove(path).is_none() {
            return Ok(false);
        }
        debug!("event=annotation_remove module=annotation path={}", path);
        self.persist("remove")?;
        Ok(true)
    }

    /// Moves the annotation of `old_path` to `new_path` after a document rename.
    ///
    /// Returns `false` without writing when `old_path` carried no color, which
    /// is the common case. Renaming a path onto itself is a no-op.
    pub fn reconcile_rename(&mut self, old_path: &str, new_path: &str) -> PersistResult<bool> {
        if old_path == new_path {
            return Ok(false);
        }
        let Some(color) = self.record.note_colors.remove(old_path) else {
            return Ok(false);
        };
        if let Some(replaced) = self
            .record
            .note_colors
            .insert(new_path.to_string(), color)
        {
            warn!(
                "event=annotation_rename module=annotation status=overwrite from={} to={} replaced={}",
                old_path, new_path, replaced
            );
        }
        info!(
            "event=annotation_rename module=annotation status=moved from={} to={}",
            old_path, new_path
        );
        self.persist("rename")?;
        Ok(true)
    }

    /// Drops the annotation of a deleted document. Same contract as `remove`.
    pub fn reconcile_delete(&mut self, path: &str) -> PersistResult<bool> {
        let removed = self.remove(path)?;
        if removed {
            info!(
                "event=annotation_delete module=annotation status=purged path={}",
                path
            );
        }
        Ok(removed)
    }

    /// Number of stored annotations.
    pub fn len(&self) -> usize {
        self.record.note_colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.record.note_colors.is_empty()
    }

    /// Iterates over `(path, color)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.record
            .note_colors
            .iter()
            .map(|(path, color)| (path.as_str(), color.as_str()))
    }

    /// Borrows the backing blob store.
    pub fn blob_store(&self) -> &B {
        &self.blobs
    }

    /// Mutably borrows the backing blob store.
    pub fn blob_store_mut(&mut self) -> &mut B {
        &mut self.blobs
    }

    /// Releases the backing blob store.
    pub fn into_blob_store(self) -> B {
        self.blobs
    }

    fn persist(&mut self, op: &'static str) -> PersistResult<()> {
        self.refresh_siblings(op)?;
        let bytes = encode_record(&self.record)?;
        if let Err(err) = self.blobs.save(&self.key, &bytes) {
            error!(
                "event=annotations_save module=annotation status=error op={} key={} error={}",
                op, self.key, err
            );
            return Err(PersistenceError::Write(err));
        }
        debug!(
            "event=annotations_save module=annotation status=ok op={} entries={}",
            op,
            self.record.note_colors.len()
        );
        Ok(())
    }

    fn refresh_siblings(&mut self, op: &'static str) -> PersistResult<()> {
        match self.blobs.load(&self.key) {
            Ok(Some(bytes)) => self.record.extra = decode_record(&bytes).extra,
            Ok(None) => self.record.extra.clear(),
            Err(err) => {
                error!(
                    "event=annotations_save module=annotation status=error op={} key={} stage=reread error={}",
                    op, self.key, err
                );
                return Err(PersistenceError::Read(err));
            }
        }
        Ok(())
    }
}
