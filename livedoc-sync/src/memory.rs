//! In-process backend for tests and embedding.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};

use livedoc_core::{Checkpoint, CheckpointId, CheckpointSummary, TenantId};

use crate::error::StoreError;
use crate::store::{find_checkpoint, push_checkpoint, require_object, LiveStore};

#[derive(Debug, Default)]
struct TenantSlot {
    live: Option<Value>,
    checkpoints: Vec<Checkpoint>,
}

/// Thread-safe map of tenant → live document and checkpoint history.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tenants: Mutex<HashMap<TenantId, TenantSlot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TenantId, TenantSlot>> {
        self.tenants.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LiveStore for MemoryStore {
    fn get_live(&self, tenant: &TenantId) -> Result<Value, StoreError> {
        Ok(self
            .lock()
            .get(tenant)
            .and_then(|slot| slot.live.clone())
            .unwrap_or_else(|| Value::Object(Map::new())))
    }

    fn put_live(&self, tenant: &TenantId, doc: &Value) -> Result<(), StoreError> {
        require_object(doc, "live document")?;
        self.lock().entry(tenant.clone()).or_default().live = Some(doc.clone());
        Ok(())
    }

    fn create_checkpoint(
        &self,
        tenant: &TenantId,
        message: &str,
        data: &Value,
    ) -> Result<CheckpointId, StoreError> {
        let mut tenants = self.lock();
        let slot = tenants.entry(tenant.clone()).or_default();
        push_checkpoint(&mut slot.checkpoints, message, data)
    }

    fn restore_checkpoint(&self, tenant: &TenantId, id: &CheckpointId) -> Result<(), StoreError> {
        let mut tenants = self.lock();
        let slot = tenants.entry(tenant.clone()).or_default();
        let data = find_checkpoint(&slot.checkpoints, tenant, id)?.data.clone();
        slot.live = Some(data);
        Ok(())
    }

    fn list_checkpoints(&self, tenant: &TenantId) -> Result<Vec<CheckpointSummary>, StoreError> {
        Ok(self
            .lock()
            .get(tenant)
            .map(|slot| slot.checkpoints.iter().map(Checkpoint::summary).collect())
            .unwrap_or_default())
    }

    fn get_checkpoint(
        &self,
        tenant: &TenantId,
        id: &CheckpointId,
    ) -> Result<Checkpoint, StoreError> {
        let tenants = self.lock();
        let history = tenants
            .get(tenant)
            .map(|slot| slot.checkpoints.as_slice())
            .unwrap_or_default();
        find_checkpoint(history, tenant, id).cloned()
    }

    fn clear_checkpoints(&self, tenant: &TenantId) -> Result<(), StoreError> {
        if let Some(slot) = self.lock().get_mut(tenant) {
            slot.checkpoints.clear();
        }
        Ok(())
    }
}
