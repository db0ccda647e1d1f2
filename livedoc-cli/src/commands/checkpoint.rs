//! `livedoc checkpoint list|show|create|clear`

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use tabled::{settings::Style, Table, Tabled};

use livedoc_core::{CheckpointId, CheckpointSummary};
use livedoc_sync::{format_datetime_age, get_live, load_draft};

use super::{print_json, Session};

#[derive(Subcommand, Debug)]
pub enum CheckpointCommand {
    /// List checkpoints, newest first.
    List {
        /// Emit machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print one checkpoint including its data.
    Show {
        id: String,
    },
    /// Snapshot the live document (or a draft) as a new checkpoint.
    Create(CreateArgs),
    /// Delete every checkpoint for the tenant.
    Clear {
        /// Confirm deletion.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Checkpoint message.
    #[arg(long, short = 'm', default_value = "")]
    pub message: String,

    /// Snapshot this draft file instead of the live document.
    #[arg(long, value_name = "DRAFT")]
    pub from: Option<PathBuf>,
}

#[derive(Tabled)]
struct CheckpointRow {
    #[tabled(rename = "id")]
    id: String,
    #[tabled(rename = "created")]
    created: String,
    #[tabled(rename = "message")]
    message: String,
    #[tabled(rename = "delta")]
    delta: String,
}

pub fn run(command: CheckpointCommand, session: &Session) -> Result<()> {
    let (store, tenant) = session.connect()?;

    match command {
        CheckpointCommand::List { json } => {
            let list = store
                .list_checkpoints(&tenant)
                .with_context(|| format!("failed to list checkpoints for tenant '{tenant}'"))?;
            if json {
                return print_json(&list);
            }
            if list.is_empty() {
                println!("No checkpoints for tenant '{tenant}'.");
                return Ok(());
            }
            let mut table = Table::new(list.iter().map(to_row));
            table.with(Style::rounded());
            println!("{table}");
        }
        CheckpointCommand::Show { id } => {
            let id = CheckpointId::from(id);
            let checkpoint = store
                .get_checkpoint(&tenant, &id)
                .with_context(|| format!("failed to load checkpoint '{id}'"))?;
            print_json(&checkpoint)?;
        }
        CheckpointCommand::Create(args) => {
            let data = match &args.from {
                Some(draft) => load_draft(draft)?,
                None => get_live(store.as_ref(), &tenant)?,
            };
            let id = store
                .create_checkpoint(&tenant, &args.message, &data)
                .with_context(|| format!("failed to create checkpoint for tenant '{tenant}'"))?;
            println!("✓ Created checkpoint {id} for tenant '{tenant}'");
        }
        CheckpointCommand::Clear { yes } => {
            if !yes {
                bail!("refusing to delete checkpoints for tenant '{tenant}' without --yes");
            }
            store
                .clear_checkpoints(&tenant)
                .with_context(|| format!("failed to clear checkpoints for tenant '{tenant}'"))?;
            println!("✓ Cleared checkpoints for tenant '{tenant}'");
        }
    }
    Ok(())
}

fn to_row(summary: &CheckpointSummary) -> CheckpointRow {
    let created = chrono::DateTime::from_timestamp_millis(summary.ts)
        .map(|at| format!("{} ago", format_datetime_age(at)))
        .unwrap_or_else(|| "unknown".to_string());
    CheckpointRow {
        id: summary.id.to_string(),
        created,
        message: summary.message.clone(),
        delta: summary.delta.to_string(),
    }
}
