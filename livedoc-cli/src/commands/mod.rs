pub mod checkpoint;
pub mod daemon;
pub mod diff;
pub mod init;
pub mod live;
pub mod publish;
pub mod restore;
pub mod status;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use livedoc_core::{config, Profile, TenantId};
use livedoc_sync::{open_store, LiveStore};

/// Global options every command shares.
#[derive(Debug)]
pub struct Session {
    home: PathBuf,
    pub profile: String,
    tenant: Option<String>,
}

impl Session {
    pub fn new(profile: String, tenant: Option<String>) -> Result<Self> {
        let home = config::home_dir()?;
        Ok(Self {
            home,
            profile,
            tenant,
        })
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// `--tenant` as given, if any.
    pub fn tenant_override(&self) -> Option<TenantId> {
        self.tenant.as_deref().map(TenantId::new)
    }

    pub fn load_profile(&self) -> Result<Profile> {
        config::profile_at(&self.home, &self.profile)
            .with_context(|| format!("failed to load profile '{}'", self.profile))
    }

    /// Backend and effective tenant for this invocation.
    pub fn connect(&self) -> Result<(Box<dyn LiveStore>, TenantId)> {
        let profile = self.load_profile()?;
        let tenant = self
            .tenant_override()
            .unwrap_or_else(|| profile.tenant.clone());
        let store = open_store(&profile)
            .with_context(|| format!("failed to open backend for profile '{}'", profile.name))?;
        Ok((store, tenant))
    }
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("failed to serialize JSON output")?
    );
    Ok(())
}
