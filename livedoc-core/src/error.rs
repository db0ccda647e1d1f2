//! Error types for livedoc-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (file not found, permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error (write/save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load — includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None` — cannot locate `~/.livedoc/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// The config YAML file did not exist at the expected path.
    #[error("config not found at {path}; run `livedoc init` first")]
    ConfigNotFound { path: PathBuf },

    /// No profile with the requested name.
    #[error("no profile named '{name}' in {path}")]
    ProfileNotFound { name: String, path: PathBuf },

    /// A profile names neither a base URL nor a local directory, or both.
    #[error("profile '{name}' must set exactly one of base_url or local_dir")]
    InvalidBackend { name: String },
}
