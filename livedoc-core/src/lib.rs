//! livedoc core library — tenant types, document helpers, config, errors.
//!
//! - [`types`] — tenant ids, write stamps, checkpoints
//! - [`document`] — `_meta` handling, digests, count deltas
//! - [`config`] — YAML profiles under `~/.livedoc/`
//! - [`error`] — [`ConfigError`]

pub mod config;
pub mod document;
pub mod error;
pub mod types;

pub use config::{Backend, Config, Profile, WatchEntry};
pub use error::ConfigError;
pub use types::{
    to_client_name, to_storage_name, Checkpoint, CheckpointDelta, CheckpointId,
    CheckpointSummary, TenantId, WriteStamp,
};
