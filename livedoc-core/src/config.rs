//! YAML configuration profiles.
//!
//! # Storage layout
//!
//! ```text
//! ~/.livedoc/
//!   config.yaml   (mode 0600; directory mode 0700)
//! ```
//!
//! # API pattern
//!
//! Every function takes the home directory explicitly (`fn_at(home, …)`).
//! Binaries resolve it once with [`home_dir`]; tests pass a `TempDir`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::TenantId;

/// Name used when no `--profile` is given.
pub const DEFAULT_PROFILE: &str = "default";

/// HTTP timeout applied when a profile does not set one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const CONFIG_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A draft file the daemon publishes whenever it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchEntry {
    pub tenant: TenantId,
    pub draft: PathBuf,
}

/// One named connection to a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_dir: Option<PathBuf>,
    #[serde(default)]
    pub tenant: TenantId,
    /// Environment variable holding the bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub watch: Vec<WatchEntry>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Where a profile's documents live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Http { base_url: String },
    Local { dir: PathBuf },
}

impl Profile {
    pub fn http(name: impl Into<String>, base_url: impl Into<String>, tenant: TenantId) -> Self {
        Self {
            name: name.into(),
            base_url: Some(base_url.into()),
            local_dir: None,
            tenant,
            token_env: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            watch: vec![],
        }
    }

    pub fn local(name: impl Into<String>, dir: impl Into<PathBuf>, tenant: TenantId) -> Self {
        Self {
            name: name.into(),
            base_url: None,
            local_dir: Some(dir.into()),
            tenant,
            token_env: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            watch: vec![],
        }
    }

    /// Resolve the backend, rejecting profiles that set both or neither.
    pub fn backend(&self) -> Result<Backend, ConfigError> {
        match (&self.base_url, &self.local_dir) {
            (Some(base_url), None) => Ok(Backend::Http {
                base_url: base_url.trim_end_matches('/').to_string(),
            }),
            (None, Some(dir)) => Ok(Backend::Local { dir: dir.clone() }),
            _ => Err(ConfigError::InvalidBackend {
                name: self.name.clone(),
            }),
        }
    }
}

/// Root of `~/.livedoc/config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub version: u32,
    #[serde(default)]
    pub profiles: Vec<Profile>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Config {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            version: CONFIG_VERSION,
            profiles: vec![],
            created_at: now,
            updated_at: now,
        }
    }
}

impl Config {
    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Insert `profile`, replacing any existing profile with the same name.
    pub fn upsert_profile(&mut self, profile: Profile) {
        match self.profiles.iter_mut().find(|p| p.name == profile.name) {
            Some(existing) => *existing = profile,
            None => {
                self.profiles.push(profile);
                self.profiles.sort_by(|a, b| a.name.cmp(&b.name));
            }
        }
        self.updated_at = Utc::now();
    }
}

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// The user's home directory, from `dirs::home_dir()`.
pub fn home_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

/// `<home>/.livedoc/`
pub fn livedoc_root(home: &Path) -> PathBuf {
    home.join(".livedoc")
}

/// `<home>/.livedoc/config.yaml` — pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    livedoc_root(home).join("config.yaml")
}

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

/// Load `<home>/.livedoc/config.yaml`.
///
/// Returns `ConfigError::ConfigNotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(home: &Path) -> Result<Config, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Err(ConfigError::ConfigNotFound { path });
    }
    let contents = std::fs::read_to_string(&path)?;
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })
}

/// Load the config and pick the named profile.
pub fn profile_at(home: &Path, name: &str) -> Result<Profile, ConfigError> {
    let config = load_at(home)?;
    config
        .profile(name)
        .cloned()
        .ok_or_else(|| ConfigError::ProfileNotFound {
            name: name.to_string(),
            path: config_path_at(home),
        })
}

// ---------------------------------------------------------------------------
// 3. Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically save the config.
///
/// Write flow: serialize → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
pub fn save_at(home: &Path, config: &Config) -> Result<(), ConfigError> {
    let dir = livedoc_root(home);
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
        set_dir_permissions(&dir)?;
    }
    let path = config_path_at(home);
    let tmp_path = path.with_file_name("config.yaml.tmp");

    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(&tmp_path, yaml)?;
    set_file_permissions(&tmp_path)?;
    std::fs::rename(&tmp_path, &path)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// 4. Init
// ---------------------------------------------------------------------------

/// Create the config if needed and upsert `profile` into it.
pub fn init_at(home: &Path, profile: Profile) -> Result<Config, ConfigError> {
    profile.backend()?;
    let mut config = match load_at(home) {
        Ok(config) => config,
        Err(ConfigError::ConfigNotFound { .. }) => Config::default(),
        Err(err) => return Err(err),
    };
    config.upsert_profile(profile);
    save_at(home, &config)?;
    Ok(config)
}


#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
