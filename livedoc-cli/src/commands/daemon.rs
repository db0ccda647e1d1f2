//! `livedoc daemon` — background publisher lifecycle.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use livedoc_daemon::paths::{socket_path, stderr_log_path, stdout_log_path};
use livedoc_daemon::{request_publish, request_status, request_stop, start_blocking, DaemonError};

use super::{print_json, Session};

#[derive(Subcommand, Debug)]
pub enum DaemonCommand {
    /// Run the daemon in the foreground (watcher + socket server).
    Start,
    /// Request graceful daemon shutdown over the Unix socket.
    Stop,
    /// Query daemon runtime status over the Unix socket.
    Status,
    /// Ask a running daemon to publish its watched drafts now.
    Publish,
    /// Print recent daemon log lines.
    Logs(DaemonLogsArgs),
}

#[derive(Args, Debug)]
pub struct DaemonLogsArgs {
    /// Number of trailing lines to show.
    #[arg(long, default_value_t = 100)]
    pub lines: usize,

    /// Show only warnings and errors.
    #[arg(long)]
    pub errors_only: bool,
}

pub fn run(command: DaemonCommand, session: &Session) -> Result<()> {
    let home = session.home();

    match command {
        DaemonCommand::Start => {
            start_blocking(home, &session.profile).context("daemon exited with error")?;
        }
        DaemonCommand::Stop => match request_stop(home) {
            Ok(()) => println!("daemon stop requested"),
            Err(DaemonError::DaemonNotRunning { .. }) => println!("daemon is not running"),
            Err(err) => return Err(err).context("failed to stop daemon"),
        },
        DaemonCommand::Status => match request_status(home) {
            Ok(status) => print_json(&status)?,
            Err(DaemonError::DaemonNotRunning { .. }) => print_json(&serde_json::json!({
                "running": false,
                "socket": socket_path(home).display().to_string(),
            }))?,
            Err(err) => return Err(err).context("failed to query daemon status"),
        },
        DaemonCommand::Publish => {
            let tenant = session.tenant_override().map(|t| t.client_name().to_string());
            let summary = request_publish(home, tenant).context("daemon publish failed")?;
            print_json(&summary)?;
        }
        DaemonCommand::Logs(args) => {
            if !args.errors_only {
                print_tail(&stdout_log_path(home), args.lines)
                    .context("failed to read daemon log")?;
            }
            print_tail(&stderr_log_path(home), args.lines)
                .context("failed to read daemon error log")?;
        }
    }

    Ok(())
}

fn print_tail(path: &Path, lines: usize) -> Result<()> {
    if !path.exists() {
        println!("log file not found: {}", path.display());
        return Ok(());
    }

    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut tail = VecDeque::<String>::with_capacity(lines);
    for line in BufReader::new(file).lines() {
        let line = line.with_context(|| format!("read {}", path.display()))?;
        if tail.len() == lines {
            tail.pop_front();
        }
        tail.push_back(line);
    }

    println!("==> {} <==", path.display());
    for line in tail {
        println!("{line}");
    }
    Ok(())
}
