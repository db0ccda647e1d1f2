//! livedoc: publish tenant live documents with read-after-write verification.
//!
//! # Usage
//!
//! ```text
//! livedoc init (--url <URL> | --local <DIR>) [--token-env VAR] [--watch TENANT=PATH]
//! livedoc live
//! livedoc publish <draft> [--json]
//! livedoc diff <draft>
//! livedoc status [<draft>] [--json]
//! livedoc checkpoint list|show|create|clear
//! livedoc restore <id>
//! livedoc daemon start|stop|status|logs
//! ```
//!
//! `--profile` selects a profile from `~/.livedoc/config.yaml` and `--tenant`
//! overrides the profile's tenant for one invocation.

mod commands;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use commands::{
    checkpoint::CheckpointCommand, daemon::DaemonCommand, diff::DiffArgs, init::InitArgs,
    live::LiveArgs, publish::PublishArgs, restore::RestoreArgs, status::StatusArgs, Session,
};
use livedoc_core::config::DEFAULT_PROFILE;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "livedoc",
    version,
    about = "Publish tenant live documents and confirm they took effect",
    long_about = None,
)]
struct Cli {
    /// Profile from ~/.livedoc/config.yaml.
    #[arg(long, global = true, default_value = DEFAULT_PROFILE)]
    profile: String,

    /// Tenant to act on instead of the profile's.
    #[arg(long, global = true)]
    tenant: Option<String>,

    /// Increase log output (-v info, -vv debug).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create or update a profile.
    Init(InitArgs),

    /// Print the tenant's current live document.
    Live(LiveArgs),

    /// Publish a draft file and verify it is live.
    Publish(PublishArgs),

    /// Show a unified diff between the live document and a draft.
    Diff(DiffArgs),

    /// Compare drafts with what is live.
    Status(StatusArgs),

    /// Manage checkpoint history.
    Checkpoint {
        #[command(subcommand)]
        command: CheckpointCommand,
    },

    /// Copy a checkpoint back into the live slot.
    Restore(RestoreArgs),

    /// Run or control the background publisher.
    Daemon {
        #[command(subcommand)]
        command: DaemonCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();

    // The daemon installs its own subscriber with file output.
    if !matches!(
        cli.command,
        Commands::Daemon {
            command: DaemonCommand::Start
        }
    ) {
        livedoc_daemon::logging::init_tracing(match cli.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        });
    }

    let session = Session::new(cli.profile, cli.tenant)?;
    match cli.command {
        Commands::Init(args) => args.run(&session),
        Commands::Live(args) => args.run(&session),
        Commands::Publish(args) => args.run(&session),
        Commands::Diff(args) => args.run(&session),
        Commands::Status(args) => args.run(&session),
        Commands::Checkpoint { command } => commands::checkpoint::run(command, &session),
        Commands::Restore(args) => args.run(&session),
        Commands::Daemon { command } => commands::daemon::run(command, &session),
    }
}
