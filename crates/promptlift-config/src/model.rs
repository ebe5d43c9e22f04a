use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use promptlift_utils::types::ConfigSource;

/// Default orchestrator deadline for one enhancement call, in seconds
pub const DEFAULT_TIMEOUT_SECS: f64 = 60.0;

/// Provider used when none is configured
pub const DEFAULT_PROVIDER: &str = "anthropic";

/// Providers `from_config` knows how to build
pub const SUPPORTED_PROVIDERS: &[&str] = &["anthropic", "openrouter"];

/// Default cap on rendered project context, in bytes
pub const DEFAULT_MAX_CONTEXT_BYTES: usize = 16 * 1024;

/// Smallest accepted context cap; anything lower cannot hold a summary line
pub const MIN_MAX_CONTEXT_BYTES: usize = 256;

/// Default depth of the rendered directory tree
pub const DEFAULT_MAX_TREE_DEPTH: usize = 3;

/// Default number of recent commits listed in the history section
pub const DEFAULT_MAX_RECENT_COMMITS: usize = 10;

/// Configuration for promptlift operations.
///
/// `Config` provides layered configuration with discovery and precedence:
/// caller overrides > `PROMPTLIFT_*` environment > config file > built-in defaults.
///
/// # Discovery
///
/// Use [`Config::discover()`] to:
/// - Search for `.promptlift/config.toml` upward from the current directory
/// - Fall back to `$PROMPTLIFT_HOME/config.toml`, then the user config directory
/// - Apply built-in defaults for unspecified values
///
/// For deterministic, environment-independent configuration use [`Config::builder()`].
///
/// # Configuration File Format
///
/// ```toml
/// [defaults]
/// timeout_secs = 90
/// model = "claude-sonnet-4-5"
///
/// [llm]
/// provider = "anthropic"
///
/// [llm.anthropic]
/// api_key_env = "ANTHROPIC_API_KEY"
/// max_tokens = 4096
///
/// [context]
/// max_context_bytes = 16384
/// ignore = ["fixtures/**"]
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Default values for per-call settings.
    pub defaults: Defaults,
    /// LLM provider configuration.
    pub llm: LlmConfig,
    /// Project context gathering limits.
    pub context: ContextConfig,
    /// Source attribution for each setting (for status display).
    pub source_attribution: HashMap<String, ConfigSource>,
}

/// Default configuration values
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    /// Orchestrator deadline in seconds. Fractions are allowed.
    pub timeout_secs: Option<f64>,
    /// Model override applied to whichever provider is selected.
    pub model: Option<String>,
    pub verbose: Option<bool>,
}

/// LLM provider configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct LlmConfig {
    /// `anthropic` (default) or `openrouter`
    pub provider: Option<String>,
    pub anthropic: Option<AnthropicConfig>,
    pub openrouter: Option<OpenRouterConfig>,
}

/// `[llm.anthropic]`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AnthropicConfig {
    pub model: Option<String>,
    /// Name of the environment variable holding the API key (default `ANTHROPIC_API_KEY`)
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// When set, requests extended thinking; the thinking text becomes the result's reasoning.
    pub thinking_budget_tokens: Option<u32>,
}

/// `[llm.openrouter]`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct OpenRouterConfig {
    pub model: Option<String>,
    /// Name of the environment variable holding the API key (default `OPENROUTER_API_KEY`)
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// `[context]`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ContextConfig {
    pub max_context_bytes: Option<usize>,
    pub max_tree_depth: Option<usize>,
    pub max_recent_commits: Option<usize>,
    /// Extra glob patterns excluded from project walks
    #[serde(default)]
    pub ignore: Vec<String>,
}

impl Config {
    /// Effective orchestrator deadline in seconds.
    #[must_use]
    pub fn timeout_secs(&self) -> f64 {
        self.defaults.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    /// Effective orchestrator deadline.
    ///
    /// Only meaningful after validation; non-finite values fall back to the default.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_secs())
            .unwrap_or(Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS))
    }

    /// Selected provider name.
    #[must_use]
    pub fn provider(&self) -> &str {
        self.llm.provider.as_deref().unwrap_or(DEFAULT_PROVIDER)
    }

    #[must_use]
    pub fn max_context_bytes(&self) -> usize {
        self.context
            .max_context_bytes
            .unwrap_or(DEFAULT_MAX_CONTEXT_BYTES)
    }

    #[must_use]
    pub fn max_tree_depth(&self) -> usize {
        self.context.max_tree_depth.unwrap_or(DEFAULT_MAX_TREE_DEPTH)
    }

    #[must_use]
    pub fn max_recent_commits(&self) -> usize {
        self.context
            .max_recent_commits
            .unwrap_or(DEFAULT_MAX_RECENT_COMMITS)
    }

    #[must_use]
    pub fn ignore_patterns(&self) -> &[String] {
        &self.context.ignore
    }

    #[must_use]
    pub fn verbose(&self) -> bool {
        self.defaults.verbose.unwrap_or(false)
    }
}
