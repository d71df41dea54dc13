//! In-memory vault.
//!
//! Mirrors the external store contract: every mutation applies first, then
//! the matching `VaultEvent` is returned and broadcast to subscribers.

use super::{DocumentSource, VaultError, VaultEvent};
use crate::model::document::{Document, EntryKind, EpochMillis};
use std::sync::mpsc::{channel, Receiver, Sender};

/// Volatile document collection that emits storage notifications.
#[derive(Debug, Default)]
pub struct MemoryVault {
    documents: Vec<Document>,
    subscribers: Vec<Sender<VaultEvent>>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a vault from an existing snapshot without emitting events.
    pub fn with_documents(documents: Vec<Document>) -> Self {
        Self {
            documents,
            subscribers: Vec::new(),
        }
    }

    /// Registers a listener; every later mutation is delivered to it.
    pub fn subscribe(&mut self) -> Receiver<VaultEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    /// Returns the document currently at `path`.
    pub fn get(&self, path: &str) -> Option<&Document> {
        self.documents.iter().find(|doc| doc.path == path)
    }

    /// Creates a document at `path` stamped with `at` for both timestamps.
    pub fn create(&mut self, path: &str, at: EpochMillis) -> Result<VaultEvent, VaultError> {
        if self.get(path).is_some() {
            return Err(VaultError::AlreadyExists(path.to_string()));
        }
        self.documents.push(Document::new(path, at, at));
        Ok(self.emit(VaultEvent::Created))
    }

    /// Touches the document at `path`.
    pub fn modify(&mut self, path: &str, at: EpochMillis) -> Result<VaultEvent, VaultError> {
        let document = self.find_mut(path)?;
        document.modified_at = at;
        Ok(self.emit(VaultEvent::Modified))
    }

    /// Moves a document; the destination must be vacant.
    pub fn rename(&mut self, old_path: &str, new_path: &str) -> Result<VaultEvent, VaultError> {
        if old_path != new_path && self.get(new_path).is_some() {
            return Err(VaultError::AlreadyExists(new_path.to_string()));
        }
        let document = self.find_mut(old_path)?;
        document.path = new_path.to_string();
        Ok(self.emit(VaultEvent::Renamed {
            old_path: old_path.to_string(),
            new_path: new_path.to_string(),
            kind: EntryKind::File,
        }))
    }

    /// Removes the document at `path`.
    pub fn delete(&mut self, path: &str) -> Result<VaultEvent, VaultError> {
        let index = self
            .documents
            .iter()
            .position(|doc| doc.path == path)
            .ok_or_else(|| VaultError::NotFound(path.to_string()))?;
        self.documents.remove(index);
        Ok(self.emit(VaultEvent::Deleted {
            path: path.to_string(),
            kind: EntryKind::File,
        }))
    }

    fn find_mut(&mut self, path: &str) -> Result<&mut Document, VaultError> {
        self.documents
            .iter_mut()
            .find(|doc| doc.path == path)
            .ok_or_else(|| VaultError::NotFound(path.to_string()))
    }

    fn emit(&mut self, event: VaultEvent) -> VaultEvent {
        // Dropped receivers are pruned on the next send.
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
        event
    }
}

impl DocumentSource for MemoryVault {
    fn list_documents(&self) -> Result<Vec<Document>, VaultError> {
        Ok(self.documents.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryVault;
    use crate::model::document::EntryKind;
    use crate::vault::{VaultError, VaultEvent};

    #[test]
    fn mutations_are_broadcast_after_they_apply() {
        let mut vault = MemoryVault::new();
        let rx = vault.subscribe();

        vault.create("a.md", 1).unwrap();
        vault.rename("a.md", "b.md").unwrap();
        vault.delete("b.md").unwrap();

        let events: Vec<VaultEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                VaultEvent::Created,
                VaultEvent::Renamed {
                    old_path: "a.md".to_string(),
                    new_path: "b.md".to_string(),
                    kind: EntryKind::File,
                },
                VaultEvent::Deleted {
                    path: "b.md".to_string(),
                    kind: EntryKind::File,
                },
            ]
        );
        assert!(vault.get("b.md").is_none());
    }

    #[test]
    fn rename_onto_occupied_path_is_rejected() {
        let mut vault = MemoryVault::new();
        vault.create("a.md", 1).unwrap();
        vault.create("b.md", 2).unwrap();

        let err = vault.rename("a.md", "b.md").unwrap_err();
        assert!(matches!(err, VaultError::AlreadyExists(path) if path == "b.md"));
    }
}
