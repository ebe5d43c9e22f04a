use std::path::PathBuf;

/// Explicit values supplied by the caller layer (a CLI, an editor plugin).
///
/// Every `Some` field wins over environment, file and defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    /// Load this file instead of searching for one
    pub config_path: Option<PathBuf>,
    pub timeout_secs: Option<f64>,
    pub model: Option<String>,
    pub provider: Option<String>,
    pub verbose: Option<bool>,
    pub max_context_bytes: Option<usize>,
}
