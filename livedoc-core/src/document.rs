//! Helpers for the JSON shape of live documents.
//!
//! The document itself is opaque `serde_json::Value`; only the `_meta` key is
//! interpreted.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::types::{CheckpointDelta, WriteStamp};

/// Reserved top-level key holding document metadata.
pub const META_KEY: &str = "_meta";

/// Key under [`META_KEY`] holding the last publish stamp.
pub const STAMP_KEY: &str = "lastClientWriteStamp";

/// Return a copy of `doc` with `stamp` merged into its metadata.
///
/// Other `_meta` fields are kept; a non-object `_meta` is replaced. Returns
/// `None` when `doc` is not a JSON object.
pub fn stamp_document(doc: &Value, stamp: &WriteStamp) -> Option<Value> {
    let mut object = doc.as_object()?.clone();
    let mut meta = match object.remove(META_KEY) {
        Some(Value::Object(meta)) => meta,
        _ => Map::new(),
    };
    meta.insert(
        STAMP_KEY.to_string(),
        serde_json::json!({
            "at": stamp.at.to_rfc3339(),
            "nonce": stamp.nonce,
        }),
    );
    object.insert(META_KEY.to_string(), Value::Object(meta));
    Some(Value::Object(object))
}

/// Nonce of the stamp embedded in `doc`, if any.
pub fn stamp_nonce(doc: &Value) -> Option<&str> {
    doc.get(META_KEY)?.get(STAMP_KEY)?.get("nonce")?.as_str()
}

/// The full stamp embedded in `doc`, if present and well-formed.
pub fn read_stamp(doc: &Value) -> Option<WriteStamp> {
    let raw = doc.get(META_KEY)?.get(STAMP_KEY)?;
    serde_json::from_value(raw.clone()).ok()
}

/// Copy of `doc` without its `_meta` key.
pub fn strip_meta(doc: &Value) -> Value {
    match doc {
        Value::Object(object) => {
            let mut object = object.clone();
            object.remove(META_KEY);
            Value::Object(object)
        }
        other => other.clone(),
    }
}

/// SHA-256 over the canonical JSON of `doc` with `_meta` removed.
///
/// `serde_json` maps are ordered, so equal content hashes equally regardless
/// of the key order it arrived in.
pub fn content_digest(doc: &Value) -> String {
    let canonical = serde_json::to_string(&strip_meta(doc)).unwrap_or_default();
    let mut h = Sha256::new();
    h.update(canonical.as_bytes());
    hex::encode(h.finalize())
}

/// Unwrap a `{ "data": ... }` response envelope.
///
/// Only an object whose sole key is `data` is treated as an envelope; any
/// other value is returned unchanged. `null` reads as an empty document.
pub fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Null => Value::Object(Map::new()),
        Value::Object(mut object) if object.len() == 1 && object.contains_key("data") => {
            match object.remove("data") {
                Some(Value::Null) | None => Value::Object(Map::new()),
                Some(inner) => inner,
            }
        }
        other => other,
    }
}

/// Collection counts used for checkpoint deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Counts {
    pub cohorts: i64,
    pub courses: i64,
    pub lessons: i64,
}

/// Count cohorts, their courses, and those courses' lessons in `doc`.
pub fn counts_of(doc: Option<&Value>) -> Counts {
    let cohorts = doc
        .and_then(|d| d.get("cohorts"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut counts = Counts {
        cohorts: cohorts.len() as i64,
        ..Counts::default()
    };
    for cohort in cohorts {
        let courses = cohort
            .get("courses")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        counts.courses += courses.len() as i64;
        for course in courses {
            counts.lessons += course
                .get("lessons")
                .and_then(Value::as_array)
                .map_or(0, |lessons| lessons.len() as i64);
        }
    }
    counts
}

/// Delta between the previous newest checkpoint and a new one.
pub fn delta_between(previous: Option<&Value>, current: &Value) -> CheckpointDelta {
    let prev = counts_of(previous);
    let curr = counts_of(Some(current));
    CheckpointDelta {
        cohorts: curr.cohorts - prev.cohorts,
        courses: curr.courses - prev.courses,
        lessons: curr.lessons - prev.lessons,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn stamp_preserves_other_meta_fields() {
        let doc = json!({ "items": [1], "_meta": { "owner": "ops" } });
        let stamp = WriteStamp::new("abc123");
        let stamped = stamp_document(&doc, &stamp).expect("object");

        assert_eq!(stamped["_meta"]["owner"], "ops");
        assert_eq!(stamp_nonce(&stamped), Some("abc123"));
        assert_eq!(stamped["items"], json!([1]));
    }

    #[test]
    fn stamp_replaces_non_object_meta() {
        let doc = json!({ "_meta": "junk" });
        let stamped = stamp_document(&doc, &WriteStamp::new("n1")).expect("object");
        assert_eq!(stamp_nonce(&stamped), Some("n1"));
    }

    #[test]
    fn stamp_rejects_non_object_document() {
        assert!(stamp_document(&json!([1, 2]), &WriteStamp::new("n")).is_none());
    }

    #[test]
    fn read_stamp_roundtrips_timestamp() {
        let stamp = WriteStamp::new("n2");
        let stamped = stamp_document(&json!({}), &stamp).expect("object");
        let read = read_stamp(&stamped).expect("stamp");
        assert_eq!(read.nonce, "n2");
        assert_eq!(read.at.timestamp(), stamp.at.timestamp());
    }

    #[test]
    fn digest_ignores_meta() {
        let a = json!({ "items": [1, 2], "_meta": { "x": 1 } });
        let b = json!({ "items": [1, 2] });
        assert_eq!(content_digest(&a), content_digest(&b));
        assert_ne!(content_digest(&a), content_digest(&json!({ "items": [2] })));
    }

    #[test]
    fn envelope_is_unwrapped_only_when_sole_key() {
        assert_eq!(unwrap_envelope(json!({ "data": { "a": 1 } })), json!({ "a": 1 }));
        assert_eq!(
            unwrap_envelope(json!({ "data": 1, "other": 2 })),
            json!({ "data": 1, "other": 2 })
        );
        assert_eq!(unwrap_envelope(Value::Null), json!({}));
        assert_eq!(unwrap_envelope(json!({ "data": null })), json!({}));
    }

    #[test]
    fn counts_walk_nested_collections() {
        let doc = json!({
            "cohorts": [
                { "courses": [ { "lessons": [1, 2] }, { "lessons": [3] } ] },
                { "courses": [] },
            ]
        });
        let counts = counts_of(Some(&doc));
        assert_eq!(
            counts,
            Counts {
                cohorts: 2,
                courses: 2,
                lessons: 3
            }
        );
        assert_eq!(counts_of(None), Counts::default());
    }

    #[test]
    fn delta_against_missing_previous_counts_everything() {
        let doc = json!({ "cohorts": [ { "courses": [ { "lessons": [1] } ] } ] });
        let delta = delta_between(None, &doc);
        assert_eq!((delta.cohorts, delta.courses, delta.lessons), (1, 1, 1));
    }
}
