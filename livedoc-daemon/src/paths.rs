use std::path::{Path, PathBuf};
use std::time::Duration;

pub use livedoc_core::config::livedoc_root;

/// Quiet period a draft must observe before the daemon publishes it.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

pub const DAEMON_STDOUT_LOG: &str = "daemon.log";
pub const DAEMON_STDERR_LOG: &str = "daemon-err.log";
pub const DAEMON_SOCKET: &str = "daemon.sock";

pub fn run_dir(home: &Path) -> PathBuf {
    livedoc_root(home).join("run")
}

pub fn socket_path(home: &Path) -> PathBuf {
    run_dir(home).join(DAEMON_SOCKET)
}

pub fn logs_dir(home: &Path) -> PathBuf {
    livedoc_root(home).join("logs")
}

pub fn stdout_log_path(home: &Path) -> PathBuf {
    logs_dir(home).join(DAEMON_STDOUT_LOG)
}

/// Warnings and errors only.
pub fn stderr_log_path(home: &Path) -> PathBuf {
    logs_dir(home).join(DAEMON_STDERR_LOG)
}

/// Resolve a watch entry's draft path; relative paths are taken from the
/// livedoc root so the config stays portable.
pub fn resolve_draft(home: &Path, draft: &Path) -> PathBuf {
    if draft.is_absolute() {
        draft.to_path_buf()
    } else {
        livedoc_root(home).join(draft)
    }
}
