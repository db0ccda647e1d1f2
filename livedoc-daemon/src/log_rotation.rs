//! Size-based rotation for `daemon.log` and `daemon-err.log`.
//!
//! `daemon.log` → `daemon.log.1` → … → `daemon.log.5`; the oldest copy is
//! dropped.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::paths::{stderr_log_path, stdout_log_path};

pub const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;
pub const MAX_ROTATED_FILES: usize = 5;

/// Rotate `log_path` once it reaches `max_bytes`.
///
/// Returns `Ok(false)` for a small or missing file. A fresh empty log is left
/// in place after rotating.
pub fn rotate_if_needed(log_path: &Path, max_bytes: u64, max_files: usize) -> io::Result<bool> {
    let size = match fs::metadata(log_path) {
        Ok(meta) => meta.len(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    if size < max_bytes {
        return Ok(false);
    }

    let oldest = numbered_path(log_path, max_files);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }
    for n in (1..max_files).rev() {
        let from = numbered_path(log_path, n);
        if from.exists() {
            fs::rename(&from, numbered_path(log_path, n + 1))?;
        }
    }
    fs::rename(log_path, numbered_path(log_path, 1))?;
    fs::File::create(log_path)?;
    Ok(true)
}

/// Rotate both daemon logs under `home`. Failures are logged, never raised.
pub fn rotate_logs(home: &Path) {
    for log_path in [stdout_log_path(home), stderr_log_path(home)] {
        match rotate_if_needed(&log_path, MAX_LOG_BYTES, MAX_ROTATED_FILES) {
            Ok(true) => tracing::info!(path = %log_path.display(), "log file rotated"),
            Ok(false) => {}
            Err(err) => {
                tracing::warn!(path = %log_path.display(), error = %err, "log rotation failed")
            }
        }
    }
}

fn numbered_path(base: &Path, n: usize) -> PathBuf {
    let name = base
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("daemon.log");
    base.with_file_name(format!("{name}.{n}"))
}
