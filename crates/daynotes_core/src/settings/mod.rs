//! View settings: the color palette offered for annotations.
//!
//! # Responsibility
//! - Hold the palette as an explicit value handed to menu/render calls.
//! - Load/save the palette through the blob store, merged onto defaults.
//!
//! # Invariants
//! - Palette tokens are opaque; they are never validated or normalized.
//! - A save replaces only the `palette` field of the stored blob; every other
//!   field is re-read from storage, so a collaborator sharing the key (the
//!   annotation record in a single-file layout) keeps its latest writes.
//! - Decoding falls back to defaults field by field and never fails.

use crate::blob::{BlobError, BlobStore};
use log::{info, warn};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Top-level field holding the palette.
pub const PALETTE_FIELD: &str = "palette";

/// Blob key the settings are stored under by default.
pub const DEFAULT_SETTINGS_KEY: &str = "settings";

/// Token appended by `add_color`.
pub const NEW_PALETTE_COLOR: &str = "#ffffff";

/// Palette shipped with a fresh install and restored by `reset_palette`.
pub const DEFAULT_PALETTE: [&str; 5] = ["#e03131", "#f08c00", "#2f9e44", "#1971c2", "#9c36b5"];

/// Settings operation failures.
#[derive(Debug)]
pub enum SettingsError {
    /// Palette slot does not exist.
    IndexOutOfRange { index: usize, len: usize },
    /// Settings could not be loaded or saved.
    Blob(BlobError),
    /// Settings could not be serialized.
    Encode(serde_json::Error),
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IndexOutOfRange { index, len } => {
                write!(f, "palette index {index} out of range (len {len})")
            }
            Self::Blob(err) => write!(f, "settings storage failure: {err}"),
            Self::Encode(err) => write!(f, "failed to encode settings: {err}"),
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::IndexOutOfRange { .. } => None,
            Self::Blob(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<BlobError> for SettingsError {
    fn from(value: BlobError) -> Self {
        Self::Blob(value)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// User-editable view configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSettings {
    /// Colors offered in the annotation menu, in display order.
    pub palette: Vec<String>,
    /// Fields written by other collaborators, as last seen in storage.
    pub extra: Map<String, Value>,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            palette: default_palette(),
            extra: Map::new(),
        }
    }
}

impl ViewSettings {
    /// Appends a white slot and returns its index.
    pub fn add_color(&mut self) -> usize {
        self.palette.push(NEW_PALETTE_COLOR.to_string());
        self.palette.len() - 1
    }

    /// Replaces the token at `index`.
    pub fn update_color(
        &mut self,
        index: usize,
        color: impl Into<String>,
    ) -> Result<(), SettingsError> {
        let len = self.palette.len();
        let slot = self
            .palette
            .get_mut(index)
            .ok_or(SettingsError::IndexOutOfRange { index, len })?;
        *slot = color.into();
        Ok(())
    }

    /// Removes and returns the token at `index`.
    pub fn remove_color(&mut self, index: usize) -> Result<String, SettingsError> {
        if index >= self.palette.len() {
            return Err(SettingsError::IndexOutOfRange {
                index,
                len: self.palette.len(),
            });
        }
        Ok(self.palette.remove(index))
    }

    /// Restores the default palette; other fields are untouched.
    pub fn reset_palette(&mut self) {
        self.palette = default_palette();
    }
}

/// Returns the default palette as owned tokens.
pub fn default_palette() -> Vec<String> {
    DEFAULT_PALETTE.iter().map(|color| color.to_string()).collect()
}

/// Decodes a settings blob, merging whatever is usable onto defaults.
pub fn decode_settings(bytes: &[u8]) -> ViewSettings {
    let mut top = match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            warn!("event=settings_decode module=settings status=fallback reason=not_an_object");
            return ViewSettings::default();
        }
    };

    let palette = match top.remove(PALETTE_FIELD) {
        Some(Value::Array(items)) => {
            let total = items.len();
            let palette: Vec<String> = items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(color) => Some(color),
                    _ => None,
                })
                .collect();
            if palette.len() < total {
                warn!(
                    "event=settings_decode module=settings status=partial dropped_entries={}",
                    total - palette.len()
                );
            }
            palette
        }
        Some(Value::Null) | None => default_palette(),
        Some(_) => {
            warn!("event=settings_decode module=settings status=fallback reason=palette_not_an_array");
            default_palette()
        }
    };

    ViewSettings {
        palette,
        extra: top,
    }
}

/// Loads settings stored under `key`, falling back to defaults.
pub fn load_settings<B: BlobStore>(blobs: &B, key: &str) -> Result<ViewSettings, SettingsError> {
    let settings = match blobs.load(key)? {
        Some(bytes) => decode_settings(&bytes),
        None => ViewSettings::default(),
    };
    info!(
        "event=settings_load module=settings status=ok palette_len={}",
        settings.palette.len()
    );
    Ok(settings)
}

/// Durably stores the palette of `settings` under `key`.
///
/// Sibling fields come from the blob as it is now, not from `settings.extra`;
/// on success `settings.extra` is refreshed to what was written.
pub fn save_settings<B: BlobStore>(
    blobs: &mut B,
    key: &str,
    settings: &mut ViewSettings,
) -> Result<(), SettingsError> {
    let mut top = match blobs.load(key)? {
        Some(bytes) => decode_settings(&bytes).extra,
        None => Map::new(),
    };
    top.insert(
        PALETTE_FIELD.to_string(),
        Value::from(settings.palette.clone()),
    );
    let bytes = serde_json::to_vec(&top)?;
    blobs.save(key, &bytes)?;

    top.remove(PALETTE_FIELD);
    settings.extra = top;
    info!(
        "event=settings_save module=settings status=ok palette_len={}",
        settings.palette.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        decode_settings, default_palette, SettingsError, ViewSettings, DEFAULT_PALETTE,
        NEW_PALETTE_COLOR,
    };
    use serde_json::json;

    #[test]
    fn palette_edits_follow_slot_indexes() {
        let mut settings = ViewSettings::default();
        let index = settings.add_color();
        assert_eq!(index, DEFAULT_PALETTE.len());
        assert_eq!(settings.palette[index], NEW_PALETTE_COLOR);

        settings.update_color(0, "not-a-hex").unwrap();
        assert_eq!(settings.palette[0], "not-a-hex");

        let removed = settings.remove_color(0).unwrap();
        assert_eq!(removed, "not-a-hex");
        assert_eq!(settings.palette.len(), DEFAULT_PALETTE.len());

        let err = settings.remove_color(99).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::IndexOutOfRange { index: 99, .. }
        ));

        settings.reset_palette();
        assert_eq!(settings, ViewSettings::default());
    }

    #[test]
    fn decode_substitutes_defaults_per_field() {
        let bytes = json!({ "palette": "red", "noteColors": { "a.md": "red" } }).to_string();
        let settings = decode_settings(bytes.as_bytes());
        assert_eq!(settings.palette, default_palette());
        assert_eq!(settings.extra["noteColors"], json!({ "a.md": "red" }));

        let bytes = json!({ "palette": ["#111111", 7, null, "#222222"] }).to_string();
        let settings = decode_settings(bytes.as_bytes());
        assert_eq!(settings.palette, vec!["#111111", "#222222"]);

        assert_eq!(decode_settings(b"[]"), ViewSettings::default());
        assert_eq!(decode_settings(b"{oops"), ViewSettings::default());
    }
}
