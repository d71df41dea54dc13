//! In-process blob store.
//!
//! Keeps blobs in a map and counts successful writes, which lets callers
//! assert that no-op mutations never touch storage. Writes can be armed to
//! fail for exercising persistence error paths.

use super::{BlobError, BlobResult, BlobStore};
use std::collections::HashMap;

/// Volatile `BlobStore` with write accounting and failure injection.
#[derive(Debug, Default, Clone)]
pub struct MemoryBlobStore {
    blobs: HashMap<String, Vec<u8>>,
    writes: usize,
    failing_writes: usize,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with one blob, without counting a write.
    pub fn with_blob(key: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let mut store = Self::default();
        store.blobs.insert(key.into(), bytes.into());
        store
    }

    /// Number of successful `save` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Makes the next `count` saves fail without touching stored data.
    pub fn fail_next_writes(&mut self, count: usize) {
        self.failing_writes = count;
    }

    /// Raw bytes currently stored under `key`.
    pub fn blob(&self, key: &str) -> Option<&[u8]> {
        self.blobs.get(key).map(Vec::as_slice)
    }
}

impl BlobStore for MemoryBlobStore {
    fn load(&self, key: &str) -> BlobResult<Option<Vec<u8>>> {
        Ok(self.blobs.get(key).cloned())
    }

    fn save(&mut self, key: &str, bytes: &[u8]) -> BlobResult<()> {
        if self.failing_writes > 0 {
            self.failing_writes -= 1;
            return Err(BlobError::Injected(format!("write to `{key}` refused")));
        }
        self.blobs.insert(key.to_string(), bytes.to_vec());
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryBlobStore;
    use crate::blob::BlobStore;

    #[test]
    fn failing_writes_leave_previous_blob_untouched() {
        let mut store = MemoryBlobStore::with_blob("data", b"old".to_vec());
        store.fail_next_writes(1);

        assert!(store.save("data", b"new").is_err());
        assert_eq!(store.blob("data"), Some(&b"old"[..]));
        assert_eq!(store.write_count(), 0);

        store.save("data", b"new").unwrap();
        assert_eq!(store.load("data").unwrap().as_deref(), Some(&b"new"[..]));
        assert_eq!(store.write_count(), 1);
    }
}
