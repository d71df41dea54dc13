//! Daily notes use-case service.
//!
//! # Responsibility
//! - Route vault notifications into annotation reconciliation.
//! - Recompute the day view (created/updated lists joined with colors).
//! - Own the selected day and the palette settings.
//!
//! # Invariants
//! - Reconciliation always completes before the view is recomputed, so a
//!   returned view never joins rows against a stale annotation map.
//! - Views are rebuilt from a fresh listing every time; nothing is cached.
//! - Folder notifications never touch annotations.

use crate::annotation::store::{AnnotationStore, PersistenceError, DEFAULT_DATA_KEY};
use crate::blob::BlobStore;
use crate::index::day_index::query_by_day;
use crate::model::document::{Document, EntryKind, EpochMillis};
use crate::settings::{
    load_settings, save_settings, SettingsError, ViewSettings, DEFAULT_SETTINGS_KEY,
};
use crate::vault::{DocumentSource, VaultError, VaultEvent};
use chrono::{Local, NaiveDate};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::Receiver;
use std::time::Instant;

/// Service error for daily notes use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Annotation record could not be read or written.
    Persistence(PersistenceError),
    /// Palette settings failure.
    Settings(SettingsError),
    /// Document listing failure.
    Vault(VaultError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Persistence(err) => write!(f, "{err}"),
            Self::Settings(err) => write!(f, "{err}"),
            Self::Vault(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Persistence(err) => Some(err),
            Self::Settings(err) => Some(err),
            Self::Vault(err) => Some(err),
        }
    }
}

impl From<PersistenceError> for ServiceError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

impl From<SettingsError> for ServiceError {
    fn from(value: SettingsError) -> Self {
        Self::Settings(value)
    }
}

impl From<VaultError> for ServiceError {
    fn from(value: VaultError) -> Self {
        Self::Vault(value)
    }
}

/// One listed document joined with its annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayEntry {
    pub path: String,
    /// File stem shown as the row label.
    pub title: String,
    /// `created_at` for created rows, `modified_at` for updated rows.
    pub timestamp: EpochMillis,
    pub color: Option<String>,
}

/// Day view: both activity lists, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyView {
    pub day: NaiveDate,
    pub created: Vec<DayEntry>,
    pub updated: Vec<DayEntry>,
}

/// One palette slot in the annotation menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorChoice {
    pub color: String,
    /// Whether this token is the document's current color.
    pub selected: bool,
}

/// Annotation menu for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorMenu {
    pub choices: Vec<ColorChoice>,
    /// Offered only when the document currently has a color.
    pub can_reset: bool,
}

/// Builds the annotation menu from an explicit palette and current color.
pub fn build_color_menu(palette: &[String], current: Option<&str>) -> ColorMenu {
    ColorMenu {
        choices: palette
            .iter()
            .map(|color| ColorChoice {
                color: color.clone(),
                selected: current == Some(color.as_str()),
            })
            .collect(),
        can_reset: current.is_some(),
    }
}

/// Orchestrates vault events, annotations, settings and day queries.
pub struct DailyNotesService<S: DocumentSource, B: BlobStore> {
    source: S,
    annotations: AnnotationStore<B>,
    settings: ViewSettings,
    settings_key: String,
    selected_day: NaiveDate,
}

impl<S: DocumentSource, B: BlobStore> DailyNotesService<S, B> {
    /// Opens the service with default blob keys, selecting today.
    pub fn open(source: S, blobs: B) -> Result<Self, ServiceError> {
        Self::open_with_keys(source, blobs, DEFAULT_DATA_KEY, DEFAULT_SETTINGS_KEY)
    }

    /// Opens the service reading annotations and settings from explicit keys.
    pub fn open_with_keys(
        source: S,
        blobs: B,
        data_key: &str,
        settings_key: &str,
    ) -> Result<Self, ServiceError> {
        let settings = load_settings(&blobs, settings_key)?;
        let annotations = AnnotationStore::load_with_key(blobs, data_key)?;
        info!(
            "event=service_open module=service status=ok annotations={} palette_len={}",
            annotations.len(),
            settings.palette.len()
        );
        Ok(Self {
            source,
            annotations,
            settings,
            settings_key: settings_key.to_string(),
            selected_day: today(),
        })
    }

    pub fn selected_day(&self) -> NaiveDate {
        self.selected_day
    }

    /// Switches to `day` and returns its view.
    pub fn select_day(&mut self, day: NaiveDate) -> Result<DailyView, ServiceError> {
        debug!("event=day_select module=service day={}", day);
        self.selected_day = day;
        self.refresh()
    }

    /// Switches back to the current local day.
    pub fn reset_to_today(&mut self) -> Result<DailyView, ServiceError> {
        self.select_day(today())
    }

    /// Rebuilds the view of the selected day from a fresh listing.
    pub fn refresh(&self) -> Result<DailyView, ServiceError> {
        let started_at = Instant::now();
        let documents = self.source.list_documents()?;
        let view = self.build_view(&documents);
        info!(
            "event=day_query module=service status=ok day={} created={} updated={} scanned={} duration_ms={}",
            view.day,
            view.created.len(),
            view.updated.len(),
            documents.len(),
            started_at.elapsed().as_millis()
        );
        Ok(view)
    }

    /// Applies one vault notification, then returns the refreshed view.
    pub fn handle_event(&mut self, event: &VaultEvent) -> Result<DailyView, ServiceError> {
        self.reconcile(event)?;
        self.refresh()
    }

    /// Applies every queued notification in order and refreshes once.
    ///
    /// Returns `Ok(None)` when the queue was empty. Stops at the first
    /// failing event; later events stay queued.
    pub fn drain_events(
        &mut self,
        events: &Receiver<VaultEvent>,
    ) -> Result<Option<DailyView>, ServiceError> {
        let mut applied = 0usize;
        while let Ok(event) = events.try_recv() {
            self.reconcile(&event)?;
            applied += 1;
        }
        if applied == 0 {
            return Ok(None);
        }
        debug!("event=events_drain module=service applied={}", applied);
        self.refresh().map(Some)
    }

    pub fn get_color(&self, path: &str) -> Option<&str> {
        self.annotations.get(path)
    }

    pub fn set_color(&mut self, path: &str, color: &str) -> Result<(), ServiceError> {
        Ok(self.annotations.set(path, color)?)
    }

    /// Clears the color of `path`; `false` when it had none.
    pub fn remove_color(&mut self, path: &str) -> Result<bool, ServiceError> {
        Ok(self.annotations.remove(path)?)
    }

    /// Annotation menu for `path` using the current palette.
    pub fn color_menu(&self, path: &str) -> ColorMenu {
        build_color_menu(&self.settings.palette, self.annotations.get(path))
    }

    pub fn settings(&self) -> &ViewSettings {
        &self.settings
    }

    /// Edits the settings and persists them.
    ///
    /// The edit runs on a copy; the in-memory settings change only after the
    /// copy was durably saved.
    pub fn update_settings<T>(
        &mut self,
        edit: impl FnOnce(&mut ViewSettings) -> Result<T, SettingsError>,
    ) -> Result<T, ServiceError> {
        let mut next = self.settings.clone();
        let output = edit(&mut next)?;
        save_settings(
            self.annotations.blob_store_mut(),
            &self.settings_key,
            &mut next,
        )?;
        self.settings = next;
        Ok(output)
    }

    pub fn annotations(&self) -> &AnnotationStore<B> {
        &self.annotations
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    fn reconcile(&mut self, event: &VaultEvent) -> Result<(), ServiceError> {
        debug!("event=vault_event module=service kind={}", event.label());
        match event {
            VaultEvent::Created | VaultEvent::Modified => {}
            VaultEvent::Renamed {
                old_path,
                new_path,
                kind: EntryKind::File,
            } => {
                self.annotations.reconcile_rename(old_path, new_path)?;
            }
            VaultEvent::Deleted {
                path,
                kind: EntryKind::File,
            } => {
                self.annotations.reconcile_delete(path)?;
            }
            VaultEvent::Renamed {
                kind: EntryKind::Folder,
                ..
            }
            | VaultEvent::Deleted {
                kind: EntryKind::Folder,
                ..
            } => {
                debug!("event=vault_event module=service status=skip reason=folder");
            }
        }
        Ok(())
    }

    fn build_view(&self, documents: &[Document]) -> DailyView {
        let activity = query_by_day(documents, self.selected_day);
        DailyView {
            day: activity.day,
            created: activity
                .created
                .iter()
                .map(|doc| self.entry(doc, doc.created_at))
                .collect(),
            updated: activity
                .updated
                .iter()
                .map(|doc| self.entry(doc, doc.modified_at))
                .collect(),
        }
    }

    fn entry(&self, document: &Document, timestamp: EpochMillis) -> DayEntry {
        DayEntry {
            path: document.path.clone(),
            title: document.title().to_string(),
            timestamp,
            color: self.annotations.get(&document.path).map(str::to_string),
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::build_color_menu;

    #[test]
    fn color_menu_marks_current_color_and_offers_reset() {
        let palette = vec!["#111111".to_string(), "#222222".to_string()];

        let plain = build_color_menu(&palette, None);
        assert!(!plain.can_reset);
        assert!(plain.choices.iter().all(|choice| !choice.selected));

        let annotated = build_color_menu(&palette, Some("#222222"));
        assert!(annotated.can_reset);
        assert!(!annotated.choices[0].selected);
        assert!(annotated.choices[1].selected);
    }

    #[test]
    fn color_menu_offers_reset_for_tokens_outside_palette() {
        let palette = vec!["#111111".to_string()];
        let menu = build_color_menu(&palette, Some("chartreuse"));
        assert!(menu.can_reset);
        assert!(!menu.choices[0].selected);
    }
}
