//! Domain types for tenant-scoped live documents.
//!
//! The reserved tenant alias is translated in exactly one place:
//! [`to_storage_name`] / [`to_client_name`]. Every boundary (headers, file
//! paths, config) goes through [`TenantId`], which always holds the storage
//! form.

use std::fmt;
use std::path::{Component, Path};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Tenant alias mapping
// ---------------------------------------------------------------------------

/// Client-facing name of the shared default tenant.
pub const CLIENT_ALIAS: &str = "vendor";

/// Storage name of the shared default tenant.
pub const STORAGE_ALIAS: &str = "public";

/// Map a tenant name as seen by clients to the name used in storage.
///
/// Blank input resolves to the default tenant.
pub fn to_storage_name(name: &str) -> &str {
    match name.trim() {
        "" | CLIENT_ALIAS => STORAGE_ALIAS,
        other => other,
    }
}

/// Map a stored tenant name back to its client-facing form.
pub fn to_client_name(name: &str) -> &str {
    match name.trim() {
        "" | STORAGE_ALIAS => CLIENT_ALIAS,
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Tenant partition key. Accepts either alias form on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(to_storage_name(name.as_ref()).to_owned())
    }

    /// Name sent in the `x-tenant-id` header and used for on-disk paths.
    pub fn storage_name(&self) -> &str {
        &self.0
    }

    /// Name shown to users.
    pub fn client_name(&self) -> &str {
        to_client_name(&self.0)
    }

    /// True when the storage name is a single plain path component, so it
    /// can partition on-disk state without leaving its parent directory.
    pub fn is_path_segment(&self) -> bool {
        let name = self.0.as_str();
        if name.trim().is_empty() || name.contains(['/', '\\']) {
            return false;
        }
        let mut components = Path::new(name).components();
        matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        )
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self(STORAGE_ALIAS.to_owned())
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.client_name().fmt(f)
    }
}

impl From<String> for TenantId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for TenantId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Serialize for TenantId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.client_name())
    }
}

impl<'de> Deserialize<'de> for TenantId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::new(raw))
    }
}

/// Server-assigned checkpoint identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckpointId(pub String);

impl fmt::Display for CheckpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for CheckpointId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CheckpointId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Write stamp
// ---------------------------------------------------------------------------

/// Marker embedded in `_meta.lastClientWriteStamp` for one publish call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteStamp {
    pub at: DateTime<Utc>,
    pub nonce: String,
}

impl WriteStamp {
    pub fn new(nonce: impl Into<String>) -> Self {
        Self {
            at: Utc::now(),
            nonce: nonce.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Checkpoints
// ---------------------------------------------------------------------------

/// Change in collection counts relative to the previous newest checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheckpointDelta {
    #[serde(default)]
    pub cohorts: i64,
    #[serde(default)]
    pub courses: i64,
    #[serde(default)]
    pub lessons: i64,
}

impl fmt::Display for CheckpointDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:+} cohorts, {:+} courses, {:+} lessons",
            self.cohorts, self.courses, self.lessons
        )
    }
}

/// Checkpoint metadata as returned by list endpoints (no `data`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointSummary {
    pub id: CheckpointId,
    /// Creation time, milliseconds since the Unix epoch.
    #[serde(default)]
    pub ts: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub delta: CheckpointDelta,
}

/// A full, immutable checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: CheckpointId,
    #[serde(default)]
    pub ts: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub delta: CheckpointDelta,
    #[serde(default)]
    pub data: Value,
}

impl Checkpoint {
    pub fn summary(&self) -> CheckpointSummary {
        CheckpointSummary {
            id: self.id.clone(),
            ts: self.ts,
            message: self.message.clone(),
            delta: self.delta,
        }
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.ts)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
