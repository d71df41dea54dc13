//! JSON-file blob store.
//!
//! # Responsibility
//! - Persist each key as `<dir>/<key>.json`.
//! - Commit through a synced temp file renamed over the target, so readers
//!   never observe a torn record, then sync the directory holding the rename.
//!
//! # Invariants
//! - Keys are restricted to `[A-Za-z0-9_.-]` and must not start with `.`.

use super::{BlobError, BlobResult, BlobStore};
use log::{debug, error};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

const BLOB_FILE_EXTENSION: &str = "json";

/// Directory-backed `BlobStore`, one JSON file per key.
#[derive(Debug, Clone)]
pub struct JsonFileBlobStore {
    dir: PathBuf,
}

impl JsonFileBlobStore {
    /// Opens (and creates when missing) the blob directory.
    pub fn open(dir: impl AsRef<Path>) -> BlobResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolves the file backing `key`.
    pub fn blob_path(&self, key: &str) -> BlobResult<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.{BLOB_FILE_EXTENSION}")))
    }
}

impl BlobStore for JsonFileBlobStore {
    fn load(&self, key: &str) -> BlobResult<Option<Vec<u8>>> {
        let path = self.blob_path(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&mut self, key: &str, bytes: &[u8]) -> BlobResult<()> {
        let path = self.blob_path(key)?;
        match write_atomic(&self.dir, &path, bytes) {
            Ok(()) => {
                debug!(
                    "event=blob_save module=blob status=ok backend=json_file key={} bytes={}",
                    key,
                    bytes.len()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=blob_save module=blob status=error backend=json_file key={} error={}",
                    key, err
                );
                Err(err)
            }
        }
    }
}

fn write_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> BlobResult<()> {
    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|err| BlobError::Io(err.error))?;
    sync_dir(dir)
}

/// Flushes the directory entry so the rename itself survives power loss.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> BlobResult<()> {
    fs::File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> BlobResult<()> {
    Ok(())
}

fn validate_key(key: &str) -> BlobResult<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(BlobError::InvalidKey(key.to_string()))
    }
}
