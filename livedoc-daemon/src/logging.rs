//! Subscriber setup shared by the daemon and the CLI.
//!
//! Library crates log through the `log` facade; the subscriber installed here
//! also forwards those records.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, EnvFilter};

use crate::paths::{stderr_log_path, stdout_log_path};

/// Console logging for interactive commands. `RUST_LOG` wins over `default`.
pub fn init_tracing(default: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Daemon logging: stderr plus `daemon.log`, and warnings into `daemon-err.log`.
pub fn init_daemon_tracing(home: &Path) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let writer = std::io::stderr
        .and(AppendFile::new(stdout_log_path(home)))
        .and(AppendFile::new(stderr_log_path(home)).with_max_level(Level::WARN));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .try_init();
}

/// Opens the file for every record so rotation never strands a handle.
struct AppendFile {
    path: PathBuf,
}

impl AppendFile {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl<'a> MakeWriter<'a> for AppendFile {
    type Writer = Box<dyn Write + 'a>;

    fn make_writer(&'a self) -> Self::Writer {
        match OpenOptions::new().create(true).append(true).open(&self.path) {
            Ok(file) => Box::new(file),
            Err(_) => Box::new(std::io::sink()),
        }
    }
}
