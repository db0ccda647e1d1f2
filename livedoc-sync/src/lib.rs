//! # livedoc-sync
//!
//! Verified publishing of tenant live documents.
//!
//! Call [`publish`] to stamp a candidate, write it through a [`LiveStore`],
//! and confirm the write is visible, falling back to checkpoint-and-restore
//! once when it is not. [`publish_draft`], [`diff_draft`] and
//! [`draft_status`] wrap the protocol for draft files on disk.

pub mod credentials;
pub mod diff;
pub mod error;
pub mod file_store;
pub mod http;
pub mod ids;
pub mod memory;
pub mod pipeline;
pub mod publish;
pub mod status;
pub mod store;

pub use credentials::{CallbackToken, Credentials, EnvToken, NoCredentials, StaticToken};
pub use diff::{diff_documents, diff_draft, DraftDiff};
pub use error::{PublishError, StoreError, SyncError};
pub use file_store::FileStore;
pub use http::HttpStore;
pub use memory::MemoryStore;
pub use pipeline::{load_draft, open_store, publish_draft};
pub use publish::{get_live, publish, stamped_write, verify, PublishOutcome, Verification};
pub use status::{draft_status, format_datetime_age, DraftStatus};
pub use store::{LiveStore, MAX_CHECKPOINTS};
