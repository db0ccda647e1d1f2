//! Error types for livedoc-sync.

use std::path::PathBuf;

use thiserror::Error;

use livedoc_core::{CheckpointId, ConfigError, TenantId};

/// Failures of a single backend operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend answered with a non-success status.
    #[error("HTTP {status} from {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },

    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },

    /// The configured base URL cannot be extended with endpoint paths.
    #[error("invalid base URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    /// A response body could not be read or decoded.
    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: std::io::Error,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The tenant name cannot be used as a storage partition.
    #[error("invalid tenant '{0}': must be a single name without path separators")]
    InvalidTenant(String),

    #[error("checkpoint '{id}' not found for tenant '{tenant}'")]
    CheckpointNotFound { tenant: TenantId, id: CheckpointId },

    /// Documents and checkpoint data must be JSON objects.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("credential refresh failed: {0}")]
    Credentials(String),
}

/// Failures of the publish protocol.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to read live document for tenant '{tenant}': {source}")]
    Retrieval {
        tenant: TenantId,
        #[source]
        source: StoreError,
    },

    #[error("failed to write live document for tenant '{tenant}': {source}")]
    Write {
        tenant: TenantId,
        #[source]
        source: StoreError,
    },

    #[error("failed to create fallback checkpoint for tenant '{tenant}': {source}")]
    Checkpoint {
        tenant: TenantId,
        #[source]
        source: StoreError,
    },

    #[error("failed to restore checkpoint '{checkpoint}' for tenant '{tenant}': {source}")]
    Restore {
        tenant: TenantId,
        checkpoint: CheckpointId,
        #[source]
        source: StoreError,
    },

    /// The one fallback cycle ran and the live document still lacks our stamp.
    #[error(
        "server did not reflect changes after fallback restore \
         (tenant '{tenant}', checkpoint '{checkpoint}', nonce {nonce})"
    )]
    FallbackNotReflected {
        tenant: TenantId,
        checkpoint: CheckpointId,
        nonce: String,
        observed: Option<String>,
        #[source]
        source: Option<StoreError>,
    },
}

impl PublishError {
    /// True when the data may not have been saved even though every request
    /// was accepted.
    pub fn is_terminal_fallback(&self) -> bool {
        matches!(self, PublishError::FallbackNotReflected { .. })
    }
}

/// Errors from draft-level operations shared by the CLI and daemon.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse draft {path}: {source}")]
    DraftParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("draft {path} must contain a JSON object")]
    DraftNotObject { path: PathBuf },
}

/// Convenience constructor for [`StoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn draft_io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
