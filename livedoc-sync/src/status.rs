//! Compare a draft with the live document without writing anything.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use livedoc_core::{document, TenantId};

use crate::pipeline::load_draft;
use crate::publish::get_live;
use crate::store::LiveStore;
use crate::SyncError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DraftStatus {
    /// The live document carries no publish stamp.
    NeverPublished,
    /// Draft content equals live content, metadata ignored.
    Current { published_at: Option<DateTime<Utc>> },
    /// Draft content differs from live.
    Modified {
        published_at: Option<DateTime<Utc>>,
        live_digest: String,
        draft_digest: String,
    },
}

impl DraftStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DraftStatus::NeverPublished => "never-published",
            DraftStatus::Current { .. } => "current",
            DraftStatus::Modified { .. } => "modified",
        }
    }

    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        match self {
            DraftStatus::NeverPublished => None,
            DraftStatus::Current { published_at } | DraftStatus::Modified { published_at, .. } => {
                *published_at
            }
        }
    }
}

pub fn draft_status<S>(store: &S, tenant: &TenantId, draft: &Path) -> Result<DraftStatus, SyncError>
where
    S: LiveStore + ?Sized,
{
    let candidate = load_draft(draft)?;
    let live = get_live(store, tenant)?;

    if document::stamp_nonce(&live).is_none() {
        return Ok(DraftStatus::NeverPublished);
    }
    let published_at = document::read_stamp(&live).map(|stamp| stamp.at);

    let live_digest = document::content_digest(&live);
    let draft_digest = document::content_digest(&candidate);
    if live_digest == draft_digest {
        Ok(DraftStatus::Current { published_at })
    } else {
        Ok(DraftStatus::Modified {
            published_at,
            live_digest,
            draft_digest,
        })
    }
}

/// Compact age string (`42s`, `5m`, `3h`, `2d`).
pub fn format_datetime_age(timestamp: DateTime<Utc>) -> String {
    let age = Utc::now()
        .signed_duration_since(timestamp)
        .num_seconds()
        .max(0) as u64;
    format_seconds(age)
}

fn format_seconds(seconds: u64) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;
    match seconds {
        s if s < MINUTE => format!("{s}s"),
        s if s < HOUR => format!("{}m", s / MINUTE),
        s if s < DAY => format!("{}h", s / HOUR),
        s => format!("{}d", s / DAY),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::Duration;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::memory::MemoryStore;
    use crate::publish::publish;

    fn write_draft(dir: &TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("draft.json");
        fs::write(&path, body).expect("write draft");
        path
    }

    #[test]
    fn never_published_when_live_has_no_stamp() {
        let dir = TempDir::new().expect("tmp");
        let draft = write_draft(&dir, r#"{ "a": 1 }"#);
        let store = MemoryStore::new();
        let status = draft_status(&store, &"acme".into(), &draft).expect("status");
        assert_eq!(status, DraftStatus::NeverPublished);
    }

    #[test]
    fn current_after_publish_then_modified_after_edit() {
        let dir = TempDir::new().expect("tmp");
        let draft = write_draft(&dir, r#"{ "a": 1 }"#);
        let store = MemoryStore::new();
        let tenant = TenantId::from("acme");
        publish(&store, &tenant, &json!({ "a": 1 })).expect("publish");

        let status = draft_status(&store, &tenant, &draft).expect("status");
        assert_eq!(status.label(), "current");
        assert!(status.published_at().is_some());

        write_draft(&dir, r#"{ "a": 2 }"#);
        let status = draft_status(&store, &tenant, &draft).expect("status");
        assert!(matches!(status, DraftStatus::Modified { .. }));
    }

    #[test]
    fn draft_meta_is_ignored() {
        let dir = TempDir::new().expect("tmp");
        let draft = write_draft(&dir, r#"{ "a": 1, "_meta": { "note": "local" } }"#);
        let store = MemoryStore::new();
        let tenant = TenantId::from("acme");
        publish(&store, &tenant, &json!({ "a": 1 })).expect("publish");

        assert_eq!(
            draft_status(&store, &tenant, &draft).expect("status").label(),
            "current"
        );
    }

    #[test]
    fn ages_are_compact() {
        assert_eq!(format_seconds(42), "42s");
        assert_eq!(format_seconds(5 * 60 + 3), "5m");
        assert_eq!(format_seconds(3 * 3600), "3h");
        assert_eq!(format_seconds(2 * 86400 + 10), "2d");
        assert_eq!(format_datetime_age(Utc::now() + Duration::hours(1)), "0s");
    }
}
