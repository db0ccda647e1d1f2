//! `livedoc status [<draft>]` — compare drafts with the live document.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use livedoc_core::TenantId;
use livedoc_sync::{draft_status, format_datetime_age, DraftStatus, LiveStore};

use super::{print_json, Session};

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Draft to check. Defaults to the profile's watched drafts.
    pub draft: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct DraftReport {
    tenant: String,
    draft: String,
    status: String,
    last_publish_at: Option<String>,
    last_publish_age: String,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "tenant")]
    tenant: String,
    #[tabled(rename = "draft")]
    draft: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "last publish")]
    last_publish: String,
}

impl StatusArgs {
    pub fn run(self, session: &Session) -> Result<()> {
        let profile = session.load_profile()?;
        let (store, tenant) = session.connect()?;

        let targets: Vec<(TenantId, PathBuf)> = match self.draft {
            Some(draft) => vec![(tenant, draft)],
            None => profile
                .watch
                .iter()
                .filter(|entry| session.tenant_override().map_or(true, |t| t == entry.tenant))
                .map(|entry| (entry.tenant.clone(), entry.draft.clone()))
                .collect(),
        };
        if targets.is_empty() {
            bail!(
                "no draft given and profile '{}' has no watch entries",
                profile.name
            );
        }

        let reports = targets
            .iter()
            .map(|(tenant, draft)| build_report(store.as_ref(), tenant, draft))
            .collect::<Result<Vec<_>>>()?;

        if self.json {
            return print_json(&reports);
        }
        print_table(reports);
        Ok(())
    }
}

fn build_report(store: &dyn LiveStore, tenant: &TenantId, draft: &Path) -> Result<DraftReport> {
    let status = draft_status(store, tenant, draft)
        .with_context(|| format!("status check failed for {}", draft.display()))?;
    let published_at = status.published_at();
    Ok(DraftReport {
        tenant: tenant.to_string(),
        draft: draft.display().to_string(),
        status: status.label().to_string(),
        last_publish_at: published_at.map(|at| at.to_rfc3339()),
        last_publish_age: match (&status, published_at) {
            (DraftStatus::NeverPublished, _) | (_, None) => "never".to_string(),
            (_, Some(at)) => format!("{} ago", format_datetime_age(at)),
        },
    })
}

fn print_table(reports: Vec<DraftReport>) {
    let pending = reports.iter().filter(|r| r.status != "current").count();
    let rows: Vec<StatusTableRow> = reports
        .into_iter()
        .map(|r| StatusTableRow {
            tenant: r.tenant,
            draft: r.draft,
            status: status_label(&r.status),
            last_publish: r.last_publish_age,
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if pending > 0 {
        println!("Run 'livedoc publish <draft>' to push pending changes.");
    }
}

fn status_label(status: &str) -> String {
    match status {
        "current" => "CURRENT".green().to_string(),
        "modified" => "MODIFIED".red().to_string(),
        _ => "NEVER PUBLISHED".bright_black().to_string(),
    }
}
