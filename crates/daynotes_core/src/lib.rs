//! Core domain logic for DayNotes.
//!
//! Two pieces of derived state over an external document vault:
//! a day-bucketed activity query and a persistent path → color annotation
//! map that follows documents across renames and deletions.

pub mod annotation;
pub mod blob;
pub mod config;
pub mod index;
pub mod logging;
pub mod model;
pub mod service;
pub mod settings;
pub mod vault;

pub use annotation::record::{decode_record, encode_record, AnnotationRecord};
pub use annotation::store::{AnnotationStore, PersistResult, PersistenceError, DEFAULT_DATA_KEY};
pub use blob::{BlobError, BlobResult, BlobStore, JsonFileBlobStore, MemoryBlobStore, SqliteBlobStore};
pub use config::{load_config, BlobBackend, ConfigError, CoreConfig};
pub use index::day_index::{day_bucket, day_bucket_in, query_by_day, query_by_day_in, DayActivity};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::document::{Document, EntryKind, EpochMillis};
pub use service::daily_service::{
    build_color_menu, ColorChoice, ColorMenu, DailyNotesService, DailyView, DayEntry, ServiceError,
};
pub use settings::{SettingsError, ViewSettings, DEFAULT_PALETTE, DEFAULT_SETTINGS_KEY};
pub use vault::{DocumentSource, FsVault, MemoryVault, VaultError, VaultEvent};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
