//! Document model.
//!
//! # Responsibility
//! - Describe one vault document as seen by the core (path + timestamps).
//!
//! # Invariants
//! - `path` is compared by exact string equality; no case folding.
//! - `modified_at >= created_at` is expected but not enforced here.

use serde::{Deserialize, Serialize};

/// Epoch milliseconds, the timestamp unit used across the core.
pub type EpochMillis = i64;

/// Kind of vault entry carried by storage notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Leaf document; the only kind that carries annotations.
    File,
    /// Directory node. Ignored by reconciliation.
    Folder,
}

/// One document snapshot borrowed from the external vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Vault-relative path, `/`-separated. Changes on rename.
    pub path: String,
    /// Creation instant in epoch milliseconds. Fixed at creation.
    pub created_at: EpochMillis,
    /// Last modification instant in epoch milliseconds.
    pub modified_at: EpochMillis,
}

impl Document {
    /// Creates a document snapshot.
    pub fn new(path: impl Into<String>, created_at: EpochMillis, modified_at: EpochMillis) -> Self {
        Self {
            path: path.into(),
            created_at,
            modified_at,
        }
    }

    /// Returns the display title: the last path segment without extension.
    ///
    /// Dotfiles keep their full name (`.hidden` stays `.hidden`).
    pub fn title(&self) -> &str {
        let name = self.path.rsplit('/').next().unwrap_or(self.path.as_str());
        match name.rfind('.') {
            Some(0) | None => name,
            Some(index) => &name[..index],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Document;

    #[test]
    fn title_strips_folders_and_extension() {
        let doc = Document::new("journal/2024/Standup notes.md", 0, 0);
        assert_eq!(doc.title(), "Standup notes");
    }

    #[test]
    fn title_keeps_dotfile_and_extensionless_names() {
        assert_eq!(Document::new("notes/.hidden", 0, 0).title(), ".hidden");
        assert_eq!(Document::new("README", 0, 0).title(), "README");
        assert_eq!(Document::new("a/b.c/todo", 0, 0).title(), "todo");
    }
}
