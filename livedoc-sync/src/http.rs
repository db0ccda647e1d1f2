//! REST backend over `ureq`.
//!
//! Endpoints are relative to the base URL (e.g. `https://host/api/lms`):
//!
//! | operation          | request                    |
//! |--------------------|----------------------------|
//! | get live           | `GET /live`                |
//! | publish            | `PUT /publish {data}`      |
//! | create checkpoint  | `POST /checkpoints {message, data}` |
//! | list checkpoints   | `GET /checkpoints`         |
//! | get checkpoint     | `GET /checkpoints/:id`     |
//! | clear checkpoints  | `DELETE /checkpoints`      |
//! | restore            | `POST /restore/:id`        |
//!
//! The tenant travels in the `x-tenant-id` header in its storage form.
//! Checkpoint ids are percent-encoded as a single path segment.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use livedoc_core::{document, Checkpoint, CheckpointId, CheckpointSummary, TenantId};

use crate::credentials::Credentials;
use crate::error::StoreError;
use crate::store::{checkpoint_message, require_object, LiveStore};

pub const TENANT_HEADER: &str = "x-tenant-id";

const USER_AGENT: &str = concat!("livedoc/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct Created {
    id: CheckpointId,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListCompat {
    List(Vec<CheckpointSummary>),
    Wrapped { items: Vec<CheckpointSummary> },
}

pub struct HttpStore {
    agent: ureq::Agent,
    base_url: String,
    credentials: Arc<dyn Credentials>,
}

impl std::fmt::Debug for HttpStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpStore")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpStore {
    pub fn with_credentials(
        base_url: impl Into<String>,
        timeout: Duration,
        credentials: Arc<dyn Credentials>,
    ) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build();
        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        }
    }

    /// Base URL extended by `segments`, each percent-encoded as one path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<String, StoreError> {
        let invalid = |message: String| StoreError::InvalidUrl {
            url: self.base_url.clone(),
            message,
        };
        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.to_string())
    }

    /// Endpoint addressing one checkpoint. Ids that cannot name a path
    /// segment cannot exist on the server either.
    fn checkpoint_endpoint(
        &self,
        prefix: &str,
        tenant: &TenantId,
        id: &CheckpointId,
    ) -> Result<String, StoreError> {
        let raw = id.0.as_str();
        if raw.trim().is_empty() || raw == "." || raw == ".." {
            return Err(StoreError::CheckpointNotFound {
                tenant: tenant.clone(),
                id: id.clone(),
            });
        }
        self.endpoint(&[prefix, raw])
    }

    /// Send one request, refreshing the credential and retrying once on 401.
    fn send(
        &self,
        method: &str,
        url: &str,
        tenant: &TenantId,
        body: Option<&Value>,
    ) -> Result<ureq::Response, StoreError> {
        let token = self.credentials.bearer_token();
        match self.attempt(method, url, tenant, body, token.as_deref()) {
            Err(ureq::Error::Status(401, _)) => {
                tracing::info!("{method} {url} returned 401; refreshing credentials");
                let token = self.credentials.refresh()?;
                self.attempt(method, url, tenant, body, token.as_deref())
                    .map_err(|e| map_ureq_error(url, e))
            }
            other => other.map_err(|e| map_ureq_error(url, e)),
        }
    }

    fn attempt(
        &self,
        method: &str,
        url: &str,
        tenant: &TenantId,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<ureq::Response, ureq::Error> {
        let mut request = self
            .agent
            .request(method, url)
            .set(TENANT_HEADER, tenant.storage_name())
            .set("cache-control", "no-cache");
        if let Some(token) = token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }
        tracing::debug!("{method} {url} (tenant '{tenant}')");
        match body {
            Some(body) => request.send_json(body),
            None => request.call(),
        }
    }

    fn send_for_json(
        &self,
        method: &str,
        url: &str,
        tenant: &TenantId,
        body: Option<&Value>,
    ) -> Result<Value, StoreError> {
        let response = self.send(method, url, tenant, body)?;
        let text = response
            .into_string()
            .map_err(|source| StoreError::Decode {
                url: url.to_string(),
                source,
            })?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn not_found_as_missing_checkpoint(
        err: StoreError,
        tenant: &TenantId,
        id: &CheckpointId,
    ) -> StoreError {
        match err {
            StoreError::Status { status: 404, .. } => StoreError::CheckpointNotFound {
                tenant: tenant.clone(),
                id: id.clone(),
            },
            other => other,
        }
    }
}

impl LiveStore for HttpStore {
    fn get_live(&self, tenant: &TenantId) -> Result<Value, StoreError> {
        let url = self.endpoint(&["live"])?;
        let value = self.send_for_json("GET", &url, tenant, None)?;
        Ok(document::unwrap_envelope(value))
    }

    fn put_live(&self, tenant: &TenantId, doc: &Value) -> Result<(), StoreError> {
        require_object(doc, "live document")?;
        let url = self.endpoint(&["publish"])?;
        self.send("PUT", &url, tenant, Some(&json!({ "data": doc })))?;
        Ok(())
    }

    fn create_checkpoint(
        &self,
        tenant: &TenantId,
        message: &str,
        data: &Value,
    ) -> Result<CheckpointId, StoreError> {
        require_object(data, "checkpoint data")?;
        let body = json!({ "message": checkpoint_message(message), "data": data });
        let url = self.endpoint(&["checkpoints"])?;
        let value = self.send_for_json("POST", &url, tenant, Some(&body))?;
        let created: Created = serde_json::from_value(value)?;
        Ok(created.id)
    }

    fn restore_checkpoint(&self, tenant: &TenantId, id: &CheckpointId) -> Result<(), StoreError> {
        let url = self.checkpoint_endpoint("restore", tenant, id)?;
        self.send("POST", &url, tenant, None)
            .map_err(|e| Self::not_found_as_missing_checkpoint(e, tenant, id))?;
        Ok(())
    }

    fn list_checkpoints(&self, tenant: &TenantId) -> Result<Vec<CheckpointSummary>, StoreError> {
        let url = self.endpoint(&["checkpoints"])?;
        let value = self.send_for_json("GET", &url, tenant, None)?;
        if value.is_null() {
            return Ok(Vec::new());
        }
        match serde_json::from_value::<ListCompat>(value)? {
            ListCompat::List(items) | ListCompat::Wrapped { items } => Ok(items),
        }
    }

    fn get_checkpoint(
        &self,
        tenant: &TenantId,
        id: &CheckpointId,
    ) -> Result<Checkpoint, StoreError> {
        let url = self.checkpoint_endpoint("checkpoints", tenant, id)?;
        let value = self
            .send_for_json("GET", &url, tenant, None)
            .map_err(|e| Self::not_found_as_missing_checkpoint(e, tenant, id))?;
        Ok(serde_json::from_value(value)?)
    }

    fn clear_checkpoints(&self, tenant: &TenantId) -> Result<(), StoreError> {
        let url = self.endpoint(&["checkpoints"])?;
        self.send("DELETE", &url, tenant, None)?;
        Ok(())
    }
}

fn map_ureq_error(url: &str, err: ureq::Error) -> StoreError {
    match err {
        ureq::Error::Status(status, response) => StoreError::Status {
            status,
            url: url.to_string(),
            body: response.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(transport) => StoreError::Transport {
            url: url.to_string(),
            message: transport.to_string(),
        },
    }
}
