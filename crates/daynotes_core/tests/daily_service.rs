use chrono::{Local, NaiveDate, TimeZone};
use daynotes_core::settings::load_settings;
use daynotes_core::{
    DailyNotesService, Document, EntryKind, MemoryBlobStore, MemoryVault, ServiceError,
    SettingsError, VaultEvent, DEFAULT_DATA_KEY, DEFAULT_PALETTE, DEFAULT_SETTINGS_KEY,
};
use serde_json::json;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn local_ms(y: i32, m: u32, d: u32, h: u32) -> i64 {
    Local
        .with_ymd_and_hms(y, m, d, h, 0, 0)
        .earliest()
        .unwrap()
        .timestamp_millis()
}

fn service_on(
    day: NaiveDate,
    documents: Vec<Document>,
) -> DailyNotesService<MemoryVault, MemoryBlobStore> {
    let mut service =
        DailyNotesService::open(MemoryVault::with_documents(documents), MemoryBlobStore::new())
            .unwrap();
    service.select_day(day).unwrap();
    service
}

#[test]
fn view_joins_rows_with_colors() {
    let mut service = service_on(
        date(2024, 1, 2),
        vec![
            Document::new("journal/B.md", local_ms(2024, 1, 2, 9), local_ms(2024, 1, 2, 9)),
            Document::new("C.md", local_ms(2023, 12, 31, 9), local_ms(2024, 1, 2, 11)),
        ],
    );
    service.set_color("journal/B.md", "#e03131").unwrap();

    let view = service.refresh().unwrap();

    assert_eq!(view.day, date(2024, 1, 2));
    assert_eq!(view.created.len(), 1);
    assert_eq!(view.created[0].title, "B");
    assert_eq!(view.created[0].color.as_deref(), Some("#e03131"));
    assert_eq!(view.created[0].timestamp, local_ms(2024, 1, 2, 9));
    assert_eq!(view.updated.len(), 1);
    assert_eq!(view.updated[0].path, "C.md");
    assert_eq!(view.updated[0].color, None);
    assert_eq!(view.updated[0].timestamp, local_ms(2024, 1, 2, 11));
}

#[test]
fn rename_event_keeps_color_on_renamed_row() {
    let day = date(2024, 6, 1);
    let mut service = service_on(day, Vec::new());
    service
        .source_mut()
        .create("draft.md", local_ms(2024, 6, 1, 10))
        .unwrap();
    service.set_color("draft.md", "#2f9e44").unwrap();

    let event = service
        .source_mut()
        .rename("draft.md", "final/report.md")
        .unwrap();
    let view = service.handle_event(&event).unwrap();

    assert_eq!(view.created.len(), 1);
    assert_eq!(view.created[0].path, "final/report.md");
    assert_eq!(view.created[0].color.as_deref(), Some("#2f9e44"));
    assert_eq!(service.get_color("draft.md"), None);
}

#[test]
fn delete_event_purges_color_and_row() {
    let day = date(2024, 6, 1);
    let mut service = service_on(day, Vec::new());
    service
        .source_mut()
        .create("scratch.md", local_ms(2024, 6, 1, 8))
        .unwrap();
    service.set_color("scratch.md", "red").unwrap();

    let event = service.source_mut().delete("scratch.md").unwrap();
    let view = service.handle_event(&event).unwrap();

    assert!(view.created.is_empty());
    assert_eq!(service.get_color("scratch.md"), None);
    assert!(service.annotations().is_empty());
}

#[test]
fn folder_events_leave_annotations_alone() {
    let mut service = service_on(date(2024, 6, 1), Vec::new());
    service.set_color("projects", "red").unwrap();
    let writes_before = service.annotations().blob_store().write_count();

    service
        .handle_event(&VaultEvent::Renamed {
            old_path: "projects".to_string(),
            new_path: "archive".to_string(),
            kind: EntryKind::Folder,
        })
        .unwrap();
    service
        .handle_event(&VaultEvent::Deleted {
            path: "projects".to_string(),
            kind: EntryKind::Folder,
        })
        .unwrap();

    assert_eq!(service.get_color("projects"), Some("red"));
    assert_eq!(
        service.annotations().blob_store().write_count(),
        writes_before
    );
}

#[test]
fn create_and_modify_events_only_refresh() {
    let day = date(2024, 6, 1);
    let mut service = service_on(day, Vec::new());

    let created = service
        .source_mut()
        .create("new.md", local_ms(2024, 5, 30, 9))
        .unwrap();
    assert!(service.handle_event(&created).unwrap().updated.is_empty());

    let modified = service
        .source_mut()
        .modify("new.md", local_ms(2024, 6, 1, 14))
        .unwrap();
    let view = service.handle_event(&modified).unwrap();

    assert_eq!(view.updated.len(), 1);
    assert_eq!(view.updated[0].path, "new.md");
    assert_eq!(service.annotations().blob_store().write_count(), 0);
}

#[test]
fn drain_events_applies_queue_in_order_and_refreshes_once() {
    let day = date(2024, 6, 1);
    let mut service = service_on(day, Vec::new());
    let events = service.source_mut().subscribe();

    assert_eq!(service.drain_events(&events).unwrap(), None);

    service
        .source_mut()
        .create("a.md", local_ms(2024, 6, 1, 9))
        .unwrap();
    service.set_color("a.md", "blue").unwrap();
    service.source_mut().rename("a.md", "b.md").unwrap();
    service.source_mut().rename("b.md", "c.md").unwrap();

    let view = service.drain_events(&events).unwrap().unwrap();

    assert_eq!(view.created.len(), 1);
    assert_eq!(view.created[0].path, "c.md");
    assert_eq!(view.created[0].color.as_deref(), Some("blue"));
    assert_eq!(service.annotations().len(), 1);
}

#[test]
fn reconciliation_failure_surfaces_persistence_error() {
    let mut blobs = MemoryBlobStore::with_blob(
        DEFAULT_DATA_KEY,
        json!({ "noteColors": { "a.md": "blue" } }).to_string(),
    );
    blobs.fail_next_writes(1);
    let vault = MemoryVault::with_documents(vec![Document::new(
        "a.md",
        local_ms(2024, 6, 1, 9),
        local_ms(2024, 6, 1, 9),
    )]);
    let mut service = DailyNotesService::open(vault, blobs).unwrap();
    let event = service.source_mut().delete("a.md").unwrap();

    let err = service.handle_event(&event).unwrap_err();
    assert!(matches!(err, ServiceError::Persistence(_)));
    assert_eq!(service.get_color("a.md"), None);

    // Retrying the same notification is a no-op once memory already moved on.
    assert!(service.handle_event(&event).is_ok());
}

#[test]
fn palette_updates_persist_and_drive_color_menu() {
    let mut service = service_on(date(2024, 6, 1), Vec::new());
    assert_eq!(service.settings().palette.len(), DEFAULT_PALETTE.len());

    let index = service
        .update_settings(|settings| Ok(settings.add_color()))
        .unwrap();
    service
        .update_settings(|settings| settings.update_color(index, "#abcdef"))
        .unwrap();
    service.set_color("a.md", "#abcdef").unwrap();

    let menu = service.color_menu("a.md");
    assert!(menu.can_reset);
    assert_eq!(menu.choices.len(), DEFAULT_PALETTE.len() + 1);
    assert!(menu.choices[index].selected);

    let stored = load_settings(service.annotations().blob_store(), DEFAULT_SETTINGS_KEY).unwrap();
    assert_eq!(stored.palette[index], "#abcdef");
}

#[test]
fn rejected_palette_edit_changes_nothing() {
    let mut service = service_on(date(2024, 6, 1), Vec::new());

    let err = service
        .update_settings(|settings| settings.remove_color(42))
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Settings(SettingsError::IndexOutOfRange { index: 42, .. })
    ));
    assert_eq!(service.settings().palette.len(), DEFAULT_PALETTE.len());
    assert_eq!(service.annotations().blob_store().write_count(), 0);
}

#[test]
fn reopen_restores_annotations_and_settings() {
    let mut service = service_on(date(2024, 6, 1), Vec::new());
    service.set_color("keep.md", "#1971c2").unwrap();
    service
        .update_settings(|settings| {
            settings.palette = vec!["only".to_string()];
            Ok(())
        })
        .unwrap();

    let blobs = service.annotations().blob_store().clone();
    let reopened = DailyNotesService::open(MemoryVault::new(), blobs).unwrap();

    assert_eq!(reopened.get_color("keep.md"), Some("#1971c2"));
    assert_eq!(reopened.settings().palette, vec!["only".to_string()]);
}

#[test]
fn select_and_reset_day() {
    let mut service = service_on(date(2020, 2, 2), Vec::new());
    assert_eq!(service.selected_day(), date(2020, 2, 2));

    let view = service.reset_to_today().unwrap();
    assert_eq!(view.day, Local::now().date_naive());
    assert_eq!(service.selected_day(), view.day);
}

fn stored_blob(blobs: &MemoryBlobStore, key: &str) -> serde_json::Value {
    serde_json::from_slice(blobs.blob(key).unwrap()).unwrap()
}

#[test]
fn shared_blob_keeps_colors_and_palette_across_interleaved_writes() {
    let mut service =
        DailyNotesService::open_with_keys(MemoryVault::new(), MemoryBlobStore::new(), "data", "data")
            .unwrap();

    service.set_color("a.md", "#ff0000").unwrap();
    service
        .update_settings(|settings| Ok(settings.add_color()))
        .unwrap();
    service.set_color("b.md", "#00ff00").unwrap();
    service
        .update_settings(|settings| settings.update_color(0, "#123456"))
        .unwrap();

    let blobs = service.annotations().blob_store().clone();
    let stored = stored_blob(&blobs, "data");
    assert_eq!(
        stored["noteColors"],
        json!({ "a.md": "#ff0000", "b.md": "#00ff00" })
    );
    assert_eq!(stored["palette"][0], "#123456");
    assert_eq!(
        stored["palette"].as_array().unwrap().len(),
        DEFAULT_PALETTE.len() + 1
    );

    let reopened =
        DailyNotesService::open_with_keys(MemoryVault::new(), blobs, "data", "data").unwrap();
    assert_eq!(reopened.get_color("a.md"), Some("#ff0000"));
    assert_eq!(reopened.get_color("b.md"), Some("#00ff00"));
    assert_eq!(reopened.settings().palette[0], "#123456");
    assert_eq!(reopened.settings().palette.len(), DEFAULT_PALETTE.len() + 1);
}

#[test]
fn shared_blob_keeps_foreign_fields_through_reconciliation_and_palette_reset() {
    let seeded = json!({
        "noteColors": { "old.md": "#9c36b5" },
        "palette": ["#000000"],
        "version": 3
    })
    .to_string();
    let mut service = DailyNotesService::open_with_keys(
        MemoryVault::new(),
        MemoryBlobStore::with_blob("data", seeded),
        "data",
        "data",
    )
    .unwrap();
    assert_eq!(service.settings().palette, vec!["#000000".to_string()]);

    service
        .handle_event(&VaultEvent::Renamed {
            old_path: "old.md".to_string(),
            new_path: "new.md".to_string(),
            kind: EntryKind::File,
        })
        .unwrap();
    service
        .update_settings(|settings| {
            settings.reset_palette();
            Ok(())
        })
        .unwrap();
    service
        .handle_event(&VaultEvent::Deleted {
            path: "gone.md".to_string(),
            kind: EntryKind::File,
        })
        .unwrap();
    service.set_color("fresh.md", "#2f9e44").unwrap();

    let stored = stored_blob(service.annotations().blob_store(), "data");
    assert_eq!(
        stored["noteColors"],
        json!({ "new.md": "#9c36b5", "fresh.md": "#2f9e44" })
    );
    assert_eq!(stored["palette"].as_array().unwrap().len(), DEFAULT_PALETTE.len());
    assert_eq!(stored["version"], 3);
}

#[test]
fn separate_keys_leave_each_other_untouched() {
    let mut service = service_on(date(2024, 6, 1), Vec::new());
    service.set_color("a.md", "#ff0000").unwrap();
    service
        .update_settings(|settings| Ok(settings.add_color()))
        .unwrap();

    let blobs = service.annotations().blob_store();
    let annotations = stored_blob(blobs, DEFAULT_DATA_KEY);
    let settings = stored_blob(blobs, DEFAULT_SETTINGS_KEY);
    assert_eq!(annotations, json!({ "noteColors": { "a.md": "#ff0000" } }));
    assert!(settings.get("noteColors").is_none());
    assert_eq!(
        settings["palette"].as_array().unwrap().len(),
        DEFAULT_PALETTE.len() + 1
    );
}
