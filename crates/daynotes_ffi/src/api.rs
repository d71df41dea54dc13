//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose color annotation, vault notification and day query calls to
//!   Dart via FRB.
//! - Own the single process-wide service session.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Every session access goes through one mutex, so annotation mutations
//!   and their durable writes are linearizable across Dart isolates.
//! - Notifications are applied before the view they return is computed.

use chrono::NaiveDate;
use daynotes_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    DailyNotesService, DailyView, DayEntry, EntryKind, FsVault, JsonFileBlobStore, VaultEvent,
};
use log::error;
use once_cell::sync::Lazy;
use std::sync::{Mutex, MutexGuard};

type Session = DailyNotesService<FsVault, JsonFileBlobStore>;

static SESSION: Lazy<Mutex<Option<Session>>> = Lazy::new(|| Mutex::new(None));

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyActionResponse {
    /// Whether the operation succeeded.
    pub ok: bool,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl DailyActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// One row of the day view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyItem {
    /// Vault-relative document path.
    pub path: String,
    /// Row label (file stem).
    pub title: String,
    /// Creation time for created rows, modification time for updated rows.
    pub timestamp_ms: i64,
    /// Annotation color token, if any.
    pub color: Option<String>,
}

/// Day view envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyViewResponse {
    pub ok: bool,
    /// Selected day as `YYYY-MM-DD`.
    pub day: String,
    pub created: Vec<DailyItem>,
    pub updated: Vec<DailyItem>,
    pub message: String,
}

impl DailyViewResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            day: String::new(),
            created: Vec::new(),
            updated: Vec::new(),
            message: message.into(),
        }
    }
}

impl From<DailyView> for DailyViewResponse {
    fn from(view: DailyView) -> Self {
        let message = if view.created.is_empty() && view.updated.is_empty() {
            "No notes found.".to_string()
        } else {
            format!(
                "{} created, {} updated.",
                view.created.len(),
                view.updated.len()
            )
        };
        Self {
            ok: true,
            day: view.day.format("%Y-%m-%d").to_string(),
            created: view.created.into_iter().map(to_daily_item).collect(),
            updated: view.updated.into_iter().map(to_daily_item).collect(),
            message,
        }
    }
}

/// Opens (or replaces) the session for one vault.
///
/// # FFI contract
/// - `vault_root`: directory scanned for markdown documents.
/// - `data_dir`: directory holding the durable annotation/settings records.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn daily_open(vault_root: String, data_dir: String) -> String {
    let opened = FsVault::open(vault_root.trim())
        .map_err(|err| err.to_string())
        .and_then(|vault| {
            let blobs = JsonFileBlobStore::open(data_dir.trim()).map_err(|err| err.to_string())?;
            DailyNotesService::open(vault, blobs).map_err(|err| err.to_string())
        });
    match opened {
        Ok(service) => {
            *lock_session() = Some(service);
            String::new()
        }
        Err(err) => {
            error!("event=ffi_open module=ffi status=error error={}", err);
            format!("daily_open failed: {err}")
        }
    }
}

/// Returns the color token of `path`, `None` when unannotated or no session.
#[flutter_rust_bridge::frb(sync)]
pub fn daily_get_color(path: String) -> Option<String> {
    lock_session()
        .as_ref()
        .and_then(|service| service.get_color(&path).map(str::to_string))
}

/// Sets the color of `path`; the token is stored as given.
#[flutter_rust_bridge::frb(sync)]
pub fn daily_set_color(path: String, color: String) -> DailyActionResponse {
    match with_session(|service| service.set_color(&path, &color).map_err(|e| e.to_string())) {
        Ok(()) => DailyActionResponse::success("Color saved."),
        Err(err) => DailyActionResponse::failure(format!("daily_set_color failed: {err}")),
    }
}

/// Clears the color of `path`. Clearing an unannotated path succeeds.
#[flutter_rust_bridge::frb(sync)]
pub fn daily_remove_color(path: String) -> DailyActionResponse {
    match with_session(|service| service.remove_color(&path).map_err(|e| e.to_string())) {
        Ok(true) => DailyActionResponse::success("Color reset."),
        Ok(false) => DailyActionResponse::success("No color to reset."),
        Err(err) => DailyActionResponse::failure(format!("daily_remove_color failed: {err}")),
    }
}

/// Reports a document rename from the host vault and returns the new view.
#[flutter_rust_bridge::frb(sync)]
pub fn daily_notify_rename(old_path: String, new_path: String, is_folder: bool) -> DailyViewResponse {
    notify(VaultEvent::Renamed {
        old_path,
        new_path,
        kind: entry_kind(is_folder),
    })
}

/// Reports a document deletion from the host vault and returns the new view.
#[flutter_rust_bridge::frb(sync)]
pub fn daily_notify_delete(path: String, is_folder: bool) -> DailyViewResponse {
    notify(VaultEvent::Deleted {
        path,
        kind: entry_kind(is_folder),
    })
}

/// Reports a create/modify notification and returns the new view.
#[flutter_rust_bridge::frb(sync)]
pub fn daily_notify_changed() -> DailyViewResponse {
    notify(VaultEvent::Modified)
}

/// Selects a calendar day and returns its view.
#[flutter_rust_bridge::frb(sync)]
pub fn daily_query(year: i32, month: u32, day: u32) -> DailyViewResponse {
    let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
        return DailyViewResponse::failure(format!(
            "daily_query failed: invalid date {year:04}-{month:02}-{day:02}"
        ));
    };
    view_response(
        "daily_query",
        with_session(|service| service.select_day(date).map_err(|e| e.to_string())),
    )
}

/// Selects today and returns its view.
#[flutter_rust_bridge::frb(sync)]
pub fn daily_today() -> DailyViewResponse {
    view_response(
        "daily_today",
        with_session(|service| service.reset_to_today().map_err(|e| e.to_string())),
    )
}

/// Returns the palette offered in the color menu.
#[flutter_rust_bridge::frb(sync)]
pub fn daily_palette() -> Vec<String> {
    lock_session()
        .as_ref()
        .map(|service| service.settings().palette.clone())
        .unwrap_or_default()
}

fn notify(event: VaultEvent) -> DailyViewResponse {
    let op = match event {
        VaultEvent::Renamed { .. } => "daily_notify_rename",
        VaultEvent::Deleted { .. } => "daily_notify_delete",
        VaultEvent::Created | VaultEvent::Modified => "daily_notify_changed",
    };
    view_response(
        op,
        with_session(|service| service.handle_event(&event).map_err(|e| e.to_string())),
    )
}

fn view_response(op: &str, result: Result<DailyView, String>) -> DailyViewResponse {
    match result {
        Ok(view) => view.into(),
        Err(err) => DailyViewResponse::failure(format!("{op} failed: {err}")),
    }
}

fn with_session<T>(f: impl FnOnce(&mut Session) -> Result<T, String>) -> Result<T, String> {
    let mut guard = lock_session();
    let service = guard
        .as_mut()
        .ok_or_else(|| "no open vault; call daily_open first".to_string())?;
    f(service)
}

fn lock_session() -> MutexGuard<'static, Option<Session>> {
    // A panic while holding the lock leaves the map as last written; keep serving.
    SESSION.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn entry_kind(is_folder: bool) -> EntryKind {
    if is_folder {
        EntryKind::Folder
    } else {
        EntryKind::File
    }
}

fn to_daily_item(entry: DayEntry) -> DailyItem {
    DailyItem {
        path: entry.path,
        title: entry.title,
        timestamp_ms: entry.timestamp,
        color: entry.color,
    }
}
