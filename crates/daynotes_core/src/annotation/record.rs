//! Durable annotation record codec.
//!
//! Wire shape: `{ "noteColors": { "<path>": "<color>" }, ...siblings }`.
//! Decoding never fails: anything unusable falls back to defaults field by
//! field, and sibling keys owned by other collaborators are kept verbatim.

use log::warn;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// Top-level field holding the path → color map.
pub const NOTE_COLORS_FIELD: &str = "noteColors";

/// In-memory form of the durable annotation record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationRecord {
    /// Path → opaque color token.
    pub note_colors: HashMap<String, String>,
    /// Top-level fields this core does not own, preserved on rewrite.
    pub extra: Map<String, Value>,
}

#[derive(Serialize)]
struct RecordWire<'a> {
    #[serde(rename = "noteColors")]
    note_colors: BTreeMap<&'a str, &'a str>,
    #[serde(flatten)]
    extra: &'a Map<String, Value>,
}

/// Decodes a durable blob, merging whatever is usable onto defaults.
pub fn decode_record(bytes: &[u8]) -> AnnotationRecord {
    let mut top = match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            warn!(
                "event=annotations_decode module=annotation status=fallback reason=not_an_object found={}",
                json_kind(&other)
            );
            return AnnotationRecord::default();
        }
        Err(err) => {
            warn!(
                "event=annotations_decode module=annotation status=fallback reason=invalid_json error={}",
                err
            );
            return AnnotationRecord::default();
        }
    };

    let note_colors = match top.remove(NOTE_COLORS_FIELD) {
        Some(Value::Object(entries)) => collect_colors(entries),
        Some(Value::Null) | None => HashMap::new(),
        Some(other) => {
            warn!(
                "event=annotations_decode module=annotation status=fallback reason=note_colors_not_an_object found={}",
                json_kind(&other)
            );
            HashMap::new()
        }
    };

    AnnotationRecord {
        note_colors,
        extra: top,
    }
}

/// Encodes the record; color entries are written in path order.
pub fn encode_record(record: &AnnotationRecord) -> serde_json::Result<Vec<u8>> {
    let wire = RecordWire {
        note_colors: record
            .note_colors
            .iter()
            .map(|(path, color)| (path.as_str(), color.as_str()))
            .collect(),
        extra: &record.extra,
    };
    serde_json::to_vec(&wire)
}

fn collect_colors(entries: Map<String, Value>) -> HashMap<String, String> {
    let mut colors = HashMap::with_capacity(entries.len());
    let mut dropped = 0usize;
    for (path, value) in entries {
        match value {
            Value::String(color) => {
                colors.insert(path, color);
            }
            _ => dropped += 1,
        }
    }
    if dropped > 0 {
        warn!(
            "event=annotations_decode module=annotation status=partial dropped_entries={}",
            dropped
        );
    }
    colors
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_record, encode_record};
    use serde_json::json;

    #[test]
    fn decode_drops_non_string_colors_but_keeps_the_rest() {
        let bytes = json!({
            "noteColors": { "a.md": "#ff0000", "b.md": 42, "c.md": null }
        })
        .to_string();
        let record = decode_record(bytes.as_bytes());
        assert_eq!(record.note_colors.len(), 1);
        assert_eq!(record.note_colors["a.md"], "#ff0000");
    }

    #[test]
    fn decode_falls_back_on_garbage_and_non_objects() {
        assert!(decode_record(b"not json").note_colors.is_empty());
        assert!(decode_record(b"[1,2,3]").note_colors.is_empty());
        assert!(decode_record(b"").extra.is_empty());
    }

    #[test]
    fn encode_never_duplicates_note_colors_key() {
        let record = decode_record(br#"{"noteColors":{"x.md":"red"},"palette":["red"]}"#);
        let encoded = String::from_utf8(encode_record(&record).unwrap()).unwrap();
        assert_eq!(encoded.matches("noteColors").count(), 1);
        assert!(encoded.contains("\"palette\":[\"red\"]"));
    }
}
