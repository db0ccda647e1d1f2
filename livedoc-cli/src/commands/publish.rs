//! `livedoc publish <draft>` — stamped publish with verification.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use livedoc_sync::{publish_draft, PublishOutcome, SyncError};

use super::{print_json, Session};

#[derive(Args, Debug)]
pub struct PublishArgs {
    /// JSON draft file to publish.
    pub draft: PathBuf,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct PublishJson {
    tenant: String,
    draft: String,
    nonce: String,
    at: String,
    used_fallback: bool,
    checkpoint: Option<String>,
}

impl PublishArgs {
    pub fn run(self, session: &Session) -> Result<()> {
        let (store, tenant) = session.connect()?;

        let outcome = match publish_draft(store.as_ref(), &tenant, &self.draft) {
            Ok(outcome) => outcome,
            Err(SyncError::Publish(err)) if err.is_terminal_fallback() => {
                eprintln!(
                    "{} {}",
                    "⚠".yellow().bold(),
                    "The server accepted the publish but the change is not visible, even after \
                     restoring a fallback checkpoint. Your data may not have saved."
                        .yellow()
                );
                eprintln!("  Check `livedoc live` and retry the publish.");
                return Err(err).context(format!("publish of {} not confirmed", self.draft.display()));
            }
            Err(err) => {
                return Err(err).with_context(|| format!("failed to publish {}", self.draft.display()))
            }
        };

        if self.json {
            return print_json(&to_json(&tenant.to_string(), &self, &outcome));
        }

        println!(
            "✓ Published {} to tenant '{}' (nonce {})",
            self.draft.display(),
            tenant,
            outcome.stamp.nonce
        );
        if let Some(checkpoint) = &outcome.checkpoint {
            println!(
                "  {} direct write was not visible; applied via checkpoint {checkpoint}",
                "note:".yellow()
            );
        }
        Ok(())
    }
}

fn to_json(tenant: &str, args: &PublishArgs, outcome: &PublishOutcome) -> PublishJson {
    PublishJson {
        tenant: tenant.to_string(),
        draft: args.draft.display().to_string(),
        nonce: outcome.stamp.nonce.clone(),
        at: outcome.stamp.at.to_rfc3339(),
        used_fallback: outcome.used_fallback,
        checkpoint: outcome.checkpoint.as_ref().map(ToString::to_string),
    }
}
