//! `livedoc init (--url <URL> | --local <DIR>) [...]`

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Args;

use livedoc_core::config::{self, DEFAULT_TIMEOUT_SECS};
use livedoc_core::{Profile, TenantId, WatchEntry};

use super::Session;

/// Create or update the profile named by `--profile`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Base URL of the REST backend, e.g. https://host/api/lms.
    #[arg(long, conflicts_with = "local", required_unless_present = "local")]
    pub url: Option<String>,

    /// Directory for a file-backed store.
    #[arg(long, value_name = "DIR")]
    pub local: Option<PathBuf>,

    /// Environment variable holding the bearer token.
    #[arg(long, value_name = "VAR")]
    pub token_env: Option<String>,

    /// HTTP timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Draft the daemon publishes on change, as TENANT=PATH. Repeatable.
    #[arg(long = "watch", value_name = "TENANT=PATH")]
    pub watch: Vec<String>,
}

impl InitArgs {
    pub fn run(self, session: &Session) -> Result<()> {
        let tenant = session.tenant_override().unwrap_or_default();
        let mut profile = match (self.url, self.local) {
            (Some(url), _) => Profile::http(&session.profile, url, tenant),
            (None, Some(dir)) => {
                let dir = absolutize(dir)?;
                Profile::local(&session.profile, dir, tenant)
            }
            (None, None) => return Err(anyhow!("one of --url or --local is required")),
        };
        profile.token_env = self.token_env;
        profile.timeout_secs = self.timeout;
        profile.watch = self
            .watch
            .iter()
            .map(|raw| parse_watch(raw))
            .collect::<Result<_>>()?;

        config::init_at(session.home(), profile.clone())
            .with_context(|| format!("failed to save profile '{}'", profile.name))?;

        println!(
            "✓ Saved profile '{}' (tenant '{}')",
            profile.name, profile.tenant
        );
        println!(
            "  Config: {}",
            config::config_path_at(session.home()).display()
        );
        for entry in &profile.watch {
            println!("  Watch: {} → {}", entry.tenant, entry.draft.display());
        }
        Ok(())
    }
}

fn parse_watch(raw: &str) -> Result<WatchEntry> {
    let (tenant, path) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("invalid --watch '{raw}'; expected TENANT=PATH"))?;
    if path.is_empty() {
        return Err(anyhow!("invalid --watch '{raw}'; draft path is empty"));
    }
    Ok(WatchEntry {
        tenant: TenantId::new(tenant),
        draft: absolutize(PathBuf::from(path))?,
    })
}

fn absolutize(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir().context("could not determine current directory")?;
    Ok(cwd.join(path))
}
