//! Unified diff between the live document and a local draft.

use std::path::{Path, PathBuf};

use serde_json::Value;
use similar::TextDiff;

use livedoc_core::{document, TenantId};

use crate::pipeline::load_draft;
use crate::publish::get_live;
use crate::store::LiveStore;
use crate::SyncError;

/// Diff of one draft against its tenant's live document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftDiff {
    pub tenant: TenantId,
    pub draft: PathBuf,
    /// Empty when the documents are equal ignoring `_meta`.
    pub unified_diff: String,
}

impl DraftDiff {
    pub fn is_empty(&self) -> bool {
        self.unified_diff.is_empty()
    }
}

/// Show what publishing `draft` would change. Nothing is written.
pub fn diff_draft<S>(store: &S, tenant: &TenantId, draft: &Path) -> Result<DraftDiff, SyncError>
where
    S: LiveStore + ?Sized,
{
    let candidate = load_draft(draft)?;
    let live = get_live(store, tenant)?;

    let label = draft
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "draft".to_string());

    Ok(DraftDiff {
        tenant: tenant.clone(),
        draft: draft.to_path_buf(),
        unified_diff: diff_documents(&live, &candidate, &label)?,
    })
}

/// Unified diff of two documents rendered as pretty JSON, `_meta` stripped.
///
/// Headers are `a/live` and `b/<new_label>`.
pub fn diff_documents(live: &Value, draft: &Value, new_label: &str) -> Result<String, SyncError> {
    let old = render(live)?;
    let new = render(draft)?;
    if old == new {
        return Ok(String::new());
    }

    let new_header = format!("b/{new_label}");
    Ok(TextDiff::from_lines(&old, &new)
        .unified_diff()
        .header("a/live", &new_header)
        .context_radius(3)
        .to_string())
}

fn render(doc: &Value) -> Result<String, SyncError> {
    let mut text = serde_json::to_string_pretty(&document::strip_meta(doc))
        .map_err(crate::StoreError::from)?;
    text.push('\n');
    Ok(text)
}
