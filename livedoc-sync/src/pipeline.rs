//! Shared draft pipeline used by the CLI and the daemon.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use livedoc_core::{Backend, Profile, TenantId};

use crate::credentials::{Credentials, EnvToken, NoCredentials};
use crate::error::{draft_io_err, SyncError};
use crate::file_store::FileStore;
use crate::http::HttpStore;
use crate::publish::{publish, PublishOutcome};
use crate::store::LiveStore;

/// Read and parse a draft file. The draft must be a JSON object.
pub fn load_draft(path: &Path) -> Result<Value, SyncError> {
    let contents = std::fs::read_to_string(path).map_err(|e| draft_io_err(path, e))?;
    let value: Value =
        serde_json::from_str(&contents).map_err(|source| SyncError::DraftParse {
            path: path.to_path_buf(),
            source,
        })?;
    if !value.is_object() {
        return Err(SyncError::DraftNotObject {
            path: path.to_path_buf(),
        });
    }
    Ok(value)
}

/// Load `path` and publish it to `tenant`.
pub fn publish_draft<S>(
    store: &S,
    tenant: &TenantId,
    path: &Path,
) -> Result<PublishOutcome, SyncError>
where
    S: LiveStore + ?Sized,
{
    let candidate = load_draft(path)?;
    tracing::info!("publishing {} to tenant '{tenant}'", path.display());
    Ok(publish(store, tenant, &candidate)?)
}

/// Build the backend a profile points at.
///
/// HTTP profiles read their bearer token from `token_env` when set.
pub fn open_store(profile: &Profile) -> Result<Box<dyn LiveStore>, SyncError> {
    match profile.backend()? {
        Backend::Http { base_url } => {
            let credentials: Arc<dyn Credentials> = match &profile.token_env {
                Some(var) => Arc::new(EnvToken::new(var.as_str())),
                None => Arc::new(NoCredentials),
            };
            let timeout = Duration::from_secs(profile.timeout_secs);
            tracing::debug!("profile '{}' uses HTTP backend {base_url}", profile.name);
            Ok(Box::new(HttpStore::with_credentials(
                base_url,
                timeout,
                credentials,
            )))
        }
        Backend::Local { dir } => {
            tracing::debug!(
                "profile '{}' uses local backend {}",
                profile.name,
                dir.display()
            );
            Ok(Box::new(FileStore::new(dir)))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use livedoc_core::document;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn load_draft_rejects_non_objects() {
        let dir = TempDir::new().expect("tmp");
        let path = dir.path().join("list.json");
        fs::write(&path, "[1, 2]").expect("write");
        assert!(matches!(
            load_draft(&path),
            Err(SyncError::DraftNotObject { .. })
        ));
    }

    #[test]
    fn load_draft_reports_parse_errors_with_path() {
        let dir = TempDir::new().expect("tmp");
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ nope").expect("write");
        let err = load_draft(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn local_profile_publishes_into_its_directory() {
        let dir = TempDir::new().expect("tmp");
        let draft = dir.path().join("draft.json");
        fs::write(&draft, r#"{ "cohorts": [] }"#).expect("write");

        let profile = Profile::local("default", dir.path().join("store"), TenantId::default());
        let store = open_store(&profile).expect("store");
        let outcome = publish_draft(store.as_ref(), &profile.tenant, &draft).expect("publish");

        let on_disk: Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join("store/public/live.json")).expect("live"),
        )
        .expect("json");
        assert_eq!(
            document::stamp_nonce(&on_disk),
            Some(outcome.stamp.nonce.as_str())
        );
    }

    #[test]
    fn profile_without_backend_is_rejected() {
        let mut profile = Profile::local("default", "/tmp/unused", TenantId::default());
        profile.local_dir = None;
        assert!(matches!(open_store(&profile), Err(SyncError::Config(_))));
    }
}
