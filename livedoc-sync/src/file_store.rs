//! File-backed store with the same semantics as the REST backend.
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/<tenant storage name>/
//!   live.json          current live document
//!   checkpoints.json   checkpoint history, newest first
//! ```
//!
//! Writes use the `.tmp` + rename pattern so a crash never leaves a
//! half-written document behind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};

use livedoc_core::{Checkpoint, CheckpointId, CheckpointSummary, TenantId};

use crate::error::{io_err, StoreError};
use crate::store::{find_checkpoint, push_checkpoint, require_object, LiveStore};

const LIVE_FILE: &str = "live.json";
const CHECKPOINTS_FILE: &str = "checkpoints.json";

/// History files written by older servers wrap the list in `{ "items": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HistoryCompat {
    List(Vec<Checkpoint>),
    Wrapped { items: Vec<Checkpoint> },
}

/// Store rooted at a directory. History updates are load-modify-save without
/// a lock; two processes creating checkpoints for one tenant at the same time
/// can lose one entry.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<root>/<tenant>/`. Tenants that are not a single plain name are rejected.
    pub fn tenant_dir(&self, tenant: &TenantId) -> Result<PathBuf, StoreError> {
        if !tenant.is_path_segment() {
            return Err(StoreError::InvalidTenant(tenant.storage_name().to_string()));
        }
        Ok(self.root.join(tenant.storage_name()))
    }

    pub fn live_path(&self, tenant: &TenantId) -> Result<PathBuf, StoreError> {
        Ok(self.tenant_dir(tenant)?.join(LIVE_FILE))
    }

    pub fn checkpoints_path(&self, tenant: &TenantId) -> Result<PathBuf, StoreError> {
        Ok(self.tenant_dir(tenant)?.join(CHECKPOINTS_FILE))
    }

    fn load_history(&self, tenant: &TenantId) -> Result<Vec<Checkpoint>, StoreError> {
        let path = self.checkpoints_path(tenant)?;
        let Some(contents) = read_optional(&path)? else {
            return Ok(Vec::new());
        };
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str::<HistoryCompat>(&contents)? {
            HistoryCompat::List(items) | HistoryCompat::Wrapped { items } => Ok(items),
        }
    }

    fn save_history(&self, tenant: &TenantId, history: &[Checkpoint]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(history)?;
        write_atomic(&self.checkpoints_path(tenant)?, &json)
    }

    fn write_live(&self, tenant: &TenantId, doc: &Value) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(doc)?;
        let path = self.live_path(tenant)?;
        write_atomic(&path, &json)?;
        tracing::debug!("wrote live document: {}", path.display());
        Ok(())
    }
}

impl LiveStore for FileStore {
    fn get_live(&self, tenant: &TenantId) -> Result<Value, StoreError> {
        let path = self.live_path(tenant)?;
        match read_optional(&path)? {
            Some(contents) if !contents.trim().is_empty() => Ok(serde_json::from_str(&contents)?),
            _ => Ok(Value::Object(Map::new())),
        }
    }

    fn put_live(&self, tenant: &TenantId, doc: &Value) -> Result<(), StoreError> {
        require_object(doc, "live document")?;
        self.write_live(tenant, doc)
    }

    fn create_checkpoint(
        &self,
        tenant: &TenantId,
        message: &str,
        data: &Value,
    ) -> Result<CheckpointId, StoreError> {
        let mut history = self.load_history(tenant)?;
        let id = push_checkpoint(&mut history, message, data)?;
        self.save_history(tenant, &history)?;
        tracing::info!("created checkpoint {id} for tenant '{tenant}'");
        Ok(id)
    }

    fn restore_checkpoint(&self, tenant: &TenantId, id: &CheckpointId) -> Result<(), StoreError> {
        let history = self.load_history(tenant)?;
        let checkpoint = find_checkpoint(&history, tenant, id)?;
        self.write_live(tenant, &checkpoint.data)?;
        tracing::info!("restored checkpoint {id} to live for tenant '{tenant}'");
        Ok(())
    }

    fn list_checkpoints(&self, tenant: &TenantId) -> Result<Vec<CheckpointSummary>, StoreError> {
        Ok(self
            .load_history(tenant)?
            .iter()
            .map(Checkpoint::summary)
            .collect())
    }

    fn get_checkpoint(
        &self,
        tenant: &TenantId,
        id: &CheckpointId,
    ) -> Result<Checkpoint, StoreError> {
        let history = self.load_history(tenant)?;
        find_checkpoint(&history, tenant, id).cloned()
    }

    fn clear_checkpoints(&self, tenant: &TenantId) -> Result<(), StoreError> {
        self.save_history(tenant, &[])
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}

/// Write to `<path>.tmp` then rename to `<path>`.
fn write_atomic(path: &Path, contents: &str) -> Result<(), StoreError> {
    let Some(dir) = path.parent() else {
        return Err(io_err(
            path,
            std::io::Error::other("invalid store path"),
        ));
    };
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, contents).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn acme() -> TenantId {
        TenantId::from("acme")
    }

    #[test]
    fn missing_live_file_reads_empty_object() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        assert_eq!(store.get_live(&acme()).unwrap(), json!({}));
    }

    #[test]
    fn live_roundtrip_and_tmp_cleanup() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        store.put_live(&acme(), &json!({ "items": [1] })).unwrap();

        assert_eq!(store.get_live(&acme()).unwrap(), json!({ "items": [1] }));
        let tmp_path = store.live_path(&acme()).unwrap().with_extension("json.tmp");
        assert!(!tmp_path.exists(), "tmp file should be removed after atomic rename");
    }

    #[test]
    fn default_tenant_is_stored_under_storage_alias() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        store.put_live(&TenantId::from("vendor"), &json!({})).unwrap();
        assert!(tmp.path().join("public").join("live.json").exists());
    }

    #[test]
    fn wrapped_legacy_history_is_readable() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        let path = store.checkpoints_path(&acme()).unwrap();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            r#"{"items":[{"id":"k1_abc","ts":1,"message":"old","data":{"v":1}}]}"#,
        )
        .unwrap();

        let list = store.list_checkpoints(&acme()).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, CheckpointId::from("k1_abc"));
        assert_eq!(list[0].delta.cohorts, 0);
    }

    #[test]
    fn checkpoint_restore_and_clear() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        let id = store
            .create_checkpoint(&acme(), "nightly", &json!({ "cohorts": [{ "courses": [] }] }))
            .unwrap();

        let full = store.get_checkpoint(&acme(), &id).unwrap();
        assert_eq!(full.message, "nightly");
        assert_eq!(full.delta.cohorts, 1);

        store.restore_checkpoint(&acme(), &id).unwrap();
        assert_eq!(store.get_live(&acme()).unwrap(), full.data);

        store.clear_checkpoints(&acme()).unwrap();
        assert!(store.list_checkpoints(&acme()).unwrap().is_empty());
    }

    #[test]
    fn corrupt_history_is_an_error_not_an_empty_list() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        let path = store.checkpoints_path(&acme()).unwrap();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            store.list_checkpoints(&acme()),
            Err(StoreError::Json(_))
        ));
    }

    #[test]
    fn tenant_names_cannot_escape_the_store_root() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("store");
        let outside = tmp.path().join("outside");
        let store = FileStore::new(&root);

        for name in [
            "../escaped".to_string(),
            "..".to_string(),
            "nested/dir".to_string(),
            outside.display().to_string(),
        ] {
            let tenant = TenantId::from(name.as_str());
            let err = crate::publish::publish(&store, &tenant, &json!({ "a": 1 })).unwrap_err();
            assert!(
                matches!(
                    err,
                    crate::PublishError::Write {
                        source: StoreError::InvalidTenant(_),
                        ..
                    }
                ),
                "{name}: {err:?}"
            );
            assert!(matches!(
                store.create_checkpoint(&tenant, "x", &json!({})),
                Err(StoreError::InvalidTenant(_))
            ));
            assert!(matches!(
                store.get_live(&tenant),
                Err(StoreError::InvalidTenant(_))
            ));
        }

        assert!(!tmp.path().join("escaped").exists());
        assert!(!outside.exists());
        assert!(!root.join("nested").exists());
    }
}
