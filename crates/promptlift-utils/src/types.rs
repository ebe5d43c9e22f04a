use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Where an effective configuration value came from.
///
/// Precedence, highest first: `Cli`, `Env`, `ConfigFile`, `Programmatic`, `Default`.
/// `Cli` covers any explicit override handed in by the caller layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    /// Value provided as an explicit caller override (highest precedence).
    Cli,
    /// Value read from a `PROMPTLIFT_*` environment variable.
    Env,
    /// Value loaded from a configuration file.
    ConfigFile(PathBuf),
    /// Value provided programmatically (e.g., `Config::builder()`).
    Programmatic,
    /// Built-in default value (lowest precedence).
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli => write!(f, "cli"),
            Self::Env => write!(f, "env"),
            Self::ConfigFile(path) => write!(f, "config ({})", path.display()),
            Self::Programmatic => write!(f, "programmatic"),
            Self::Default => write!(f, "default"),
        }
    }
}
