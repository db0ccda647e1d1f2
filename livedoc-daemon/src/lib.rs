//! Background publisher: watches draft files, publishes them through the
//! verified protocol, and answers status requests over a Unix socket.

mod debounce;
mod error;
pub mod log_rotation;
pub mod logging;
pub mod paths;
pub mod protocol;
mod runtime;

pub use error::DaemonError;
pub use protocol::{
    request_publish, request_status, request_stop, send_request, DaemonRequest, DaemonResponse,
};
pub use runtime::{
    run, start_blocking, FailedDraft, PublishSummary, PublishedDraft, TenantRecord, TenantRecords,
};
