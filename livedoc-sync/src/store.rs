//! The backend seam: everything the publish protocol needs from storage.

use serde_json::Value;

use livedoc_core::{document, Checkpoint, CheckpointId, CheckpointSummary, TenantId};

use crate::error::StoreError;
use crate::ids::new_checkpoint_id;

/// Checkpoint history is capped at this many entries, newest first.
pub const MAX_CHECKPOINTS: usize = 50;

/// Message used when a checkpoint is created with a blank one.
pub const DEFAULT_CHECKPOINT_MESSAGE: &str = "Checkpoint";

/// Tenant-scoped live document slot plus immutable checkpoint history.
///
/// Implementations perform no caching: `get_live` always asks the backend.
pub trait LiveStore: Send + Sync {
    /// Current live document for `tenant`; `{}` when nothing was published.
    fn get_live(&self, tenant: &TenantId) -> Result<Value, StoreError>;

    /// Replace the live document wholesale.
    fn put_live(&self, tenant: &TenantId, doc: &Value) -> Result<(), StoreError>;

    /// Persist `data` as a new checkpoint and return its id.
    fn create_checkpoint(
        &self,
        tenant: &TenantId,
        message: &str,
        data: &Value,
    ) -> Result<CheckpointId, StoreError>;

    /// Copy the checkpoint's data into the live slot.
    fn restore_checkpoint(&self, tenant: &TenantId, id: &CheckpointId) -> Result<(), StoreError>;

    /// Checkpoint metadata, newest first.
    fn list_checkpoints(&self, tenant: &TenantId) -> Result<Vec<CheckpointSummary>, StoreError>;

    fn get_checkpoint(&self, tenant: &TenantId, id: &CheckpointId)
        -> Result<Checkpoint, StoreError>;

    /// Drop every checkpoint for `tenant`.
    fn clear_checkpoints(&self, tenant: &TenantId) -> Result<(), StoreError>;
}

/// Reject anything but a JSON object.
pub(crate) fn require_object(doc: &Value, what: &str) -> Result<(), StoreError> {
    if doc.is_object() {
        Ok(())
    } else {
        Err(StoreError::InvalidDocument(format!(
            "{what} must be a JSON object"
        )))
    }
}

pub(crate) fn checkpoint_message(message: &str) -> &str {
    if message.trim().is_empty() {
        DEFAULT_CHECKPOINT_MESSAGE
    } else {
        message
    }
}

/// Prepend a checkpoint to `history`, computing its delta against the
/// previous newest entry and enforcing [`MAX_CHECKPOINTS`].
pub(crate) fn push_checkpoint(
    history: &mut Vec<Checkpoint>,
    message: &str,
    data: &Value,
) -> Result<CheckpointId, StoreError> {
    require_object(data, "checkpoint data")?;
    let delta = document::delta_between(history.first().map(|c| &c.data), data);
    let checkpoint = Checkpoint {
        id: new_checkpoint_id(),
        ts: chrono::Utc::now().timestamp_millis(),
        message: checkpoint_message(message).to_string(),
        delta,
        data: data.clone(),
    };
    let id = checkpoint.id.clone();
    history.insert(0, checkpoint);
    history.truncate(MAX_CHECKPOINTS);
    Ok(id)
}

pub(crate) fn find_checkpoint<'a>(
    history: &'a [Checkpoint],
    tenant: &TenantId,
    id: &CheckpointId,
) -> Result<&'a Checkpoint, StoreError> {
    history
        .iter()
        .find(|c| &c.id == id)
        .ok_or_else(|| StoreError::CheckpointNotFound {
            tenant: tenant.clone(),
            id: id.clone(),
        })
}
