//! `livedoc diff <draft>` — unified diff of what publishing would change.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use livedoc_sync::diff_draft;

use super::Session;

#[derive(Args, Debug)]
pub struct DiffArgs {
    /// JSON draft file to compare with the live document.
    pub draft: PathBuf,
}

impl DiffArgs {
    pub fn run(self, session: &Session) -> Result<()> {
        let (store, tenant) = session.connect()?;

        let result = diff_draft(store.as_ref(), &tenant, &self.draft)
            .with_context(|| format!("diff failed for {}", self.draft.display()))?;

        if result.is_empty() {
            println!("No differences for tenant '{}'.", result.tenant);
            return Ok(());
        }

        for line in result.unified_diff.lines() {
            println!("{}", colorize(line));
        }
        Ok(())
    }
}

fn colorize(line: &str) -> String {
    if line.starts_with("+++") || line.starts_with("---") {
        line.bold().to_string()
    } else if line.starts_with('+') {
        line.green().to_string()
    } else if line.starts_with('-') {
        line.red().to_string()
    } else if line.starts_with("@@") {
        line.cyan().to_string()
    } else {
        line.to_string()
    }
}
