//! Stamped publish with read-after-write verification.
//!
//! ```text
//! START → WRITE → VERIFY ─ match ──────────────────────────────→ DONE (direct)
//!                   └─ mismatch → CHECKPOINT → RESTORE → VERIFY ─ match → DONE (fallback)
//!                                                          └─ mismatch → FAILED
//! ```
//!
//! A publish is only reported successful once a fresh read of the live
//! document carries the nonce that this call generated. The fallback runs at
//! most once per call.

use serde_json::Value;

use livedoc_core::{document, CheckpointId, TenantId, WriteStamp};

use crate::error::{PublishError, StoreError};
use crate::ids::new_nonce;
use crate::store::LiveStore;

/// Checkpoint message used by the fallback path.
pub const FALLBACK_MESSAGE: &str = "auto-publish fallback";

/// Result of a verified publish.
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    /// Live document as read back during the successful verification.
    pub live: Value,
    pub stamp: WriteStamp,
    pub used_fallback: bool,
    /// Checkpoint created by the fallback, when it ran.
    pub checkpoint: Option<CheckpointId>,
}

/// Outcome of one verification read.
#[derive(Debug)]
pub enum Verification {
    /// Live document carries the expected nonce.
    Matched(Value),
    /// Live document was read but carries another nonce, or none.
    Mismatched { observed: Option<String> },
    /// Live document could not be read.
    Unreadable(StoreError),
}

impl Verification {
    fn observed(&self) -> Option<String> {
        match self {
            Verification::Mismatched { observed } => observed.clone(),
            _ => None,
        }
    }
}

/// Current live document for `tenant`.
pub fn get_live<S>(store: &S, tenant: &TenantId) -> Result<Value, PublishError>
where
    S: LiveStore + ?Sized,
{
    store
        .get_live(tenant)
        .map_err(|source| PublishError::Retrieval {
            tenant: tenant.clone(),
            source,
        })
}

/// Stamp `candidate` with a fresh nonce and write it.
///
/// Returns the stamped document and its stamp. Visibility is not checked.
pub fn stamped_write<S>(
    store: &S,
    tenant: &TenantId,
    candidate: &Value,
) -> Result<(Value, WriteStamp), PublishError>
where
    S: LiveStore + ?Sized,
{
    let stamp = WriteStamp::new(new_nonce());
    let stamped =
        document::stamp_document(candidate, &stamp).ok_or_else(|| PublishError::Write {
            tenant: tenant.clone(),
            source: StoreError::InvalidDocument("candidate must be a JSON object".to_string()),
        })?;

    store
        .put_live(tenant, &stamped)
        .map_err(|source| PublishError::Write {
            tenant: tenant.clone(),
            source,
        })?;
    tracing::debug!("wrote candidate for tenant '{tenant}' with nonce {}", stamp.nonce);
    Ok((stamped, stamp))
}

/// Read the live document back and compare its nonce with `expected`.
pub fn verify<S>(store: &S, tenant: &TenantId, expected: &str) -> Verification
where
    S: LiveStore + ?Sized,
{
    let live = match store.get_live(tenant) {
        Ok(live) => live,
        Err(err) => {
            tracing::warn!("could not read back live document for tenant '{tenant}': {err}");
            return Verification::Unreadable(err);
        }
    };

    match document::stamp_nonce(&live) {
        Some(nonce) if nonce == expected => Verification::Matched(live),
        Some(other) => {
            tracing::warn!(
                "tenant '{tenant}' carries nonce {other}, expected {expected}; \
                 another publisher may have written concurrently"
            );
            Verification::Mismatched {
                observed: Some(other.to_string()),
            }
        }
        None => Verification::Mismatched { observed: None },
    }
}

/// Publish `candidate` to `tenant` and confirm it became visible.
pub fn publish<S>(
    store: &S,
    tenant: &TenantId,
    candidate: &Value,
) -> Result<PublishOutcome, PublishError>
where
    S: LiveStore + ?Sized,
{
    let (stamped, stamp) = stamped_write(store, tenant, candidate)?;

    let first = verify(store, tenant, &stamp.nonce);
    if let Verification::Matched(live) = first {
        tracing::info!("published tenant '{tenant}' (nonce {})", stamp.nonce);
        return Ok(PublishOutcome {
            live,
            stamp,
            used_fallback: false,
            checkpoint: None,
        });
    }

    tracing::warn!(
        "live document for tenant '{tenant}' does not reflect nonce {}; \
         falling back to checkpoint and restore",
        stamp.nonce
    );

    let checkpoint = store
        .create_checkpoint(tenant, FALLBACK_MESSAGE, &stamped)
        .map_err(|source| PublishError::Checkpoint {
            tenant: tenant.clone(),
            source,
        })?;
    store
        .restore_checkpoint(tenant, &checkpoint)
        .map_err(|source| PublishError::Restore {
            tenant: tenant.clone(),
            checkpoint: checkpoint.clone(),
            source,
        })?;

    match verify(store, tenant, &stamp.nonce) {
        Verification::Matched(live) => {
            tracing::info!(
                "published tenant '{tenant}' via checkpoint {checkpoint} (nonce {})",
                stamp.nonce
            );
            Ok(PublishOutcome {
                live,
                stamp,
                used_fallback: true,
                checkpoint: Some(checkpoint),
            })
        }
        second => {
            let observed = second.observed();
            let source = match second {
                Verification::Unreadable(err) => Some(err),
                _ => None,
            };
            tracing::error!(
                "tenant '{tenant}' still lacks nonce {} after restoring checkpoint {checkpoint}",
                stamp.nonce
            );
            Err(PublishError::FallbackNotReflected {
                tenant: tenant.clone(),
                checkpoint,
                nonce: stamp.nonce,
                observed,
                source,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::memory::MemoryStore;

    #[test]
    fn direct_publish_returns_stamped_live() {
        let store = MemoryStore::new();
        let tenant = TenantId::from("acme");
        let outcome = publish(&store, &tenant, &json!({ "items": [1, 2, 3] })).expect("publish");

        assert!(!outcome.used_fallback);
        assert!(outcome.checkpoint.is_none());
        assert_eq!(outcome.live["items"], json!([1, 2, 3]));
        assert_eq!(
            document::stamp_nonce(&outcome.live),
            Some(outcome.stamp.nonce.as_str())
        );
        assert!(store.list_checkpoints(&tenant).expect("list").is_empty());
    }

    #[test]
    fn non_object_candidate_is_a_write_error() {
        let store = MemoryStore::new();
        let err = publish(&store, &"acme".into(), &json!([1, 2])).unwrap_err();
        assert!(matches!(err, PublishError::Write { .. }));
    }

    #[test]
    fn verify_reports_missing_stamp_as_mismatch() {
        let store = MemoryStore::new();
        let tenant = TenantId::from("acme");
        store.put_live(&tenant, &json!({ "a": 1 })).expect("put");
        assert!(matches!(
            verify(&store, &tenant, "nonce"),
            Verification::Mismatched { observed: None }
        ));
    }
}
