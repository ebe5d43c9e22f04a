use std::collections::HashMap;
use std::time::Duration;

use promptlift_utils::error::ConfigError;

use super::{
    AnthropicConfig, Config, ConfigSource, ContextConfig, Defaults, LlmConfig, OpenRouterConfig,
};

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// Use this when embedding promptlift and you need behavior that does not
    /// depend on environment variables or config files.
    ///
    /// # Example
    ///
    /// ```rust
    /// use promptlift_config::Config;
    /// use std::time::Duration;
    ///
    /// let config = Config::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .provider("anthropic")
    ///     .max_context_bytes(8192)
    ///     .build()
    ///     .expect("valid config");
    /// assert_eq!(config.timeout_secs(), 30.0);
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for programmatic configuration of promptlift.
///
/// All values set via the builder are attributed to `ConfigSource::Programmatic`.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    timeout: Option<Duration>,
    model: Option<String>,
    verbose: Option<bool>,
    provider: Option<String>,
    anthropic: Option<AnthropicConfig>,
    openrouter: Option<OpenRouterConfig>,
    max_context_bytes: Option<usize>,
    max_tree_depth: Option<usize>,
    max_recent_commits: Option<usize>,
    ignore: Vec<String>,
}

impl ConfigBuilder {
    /// Create a new `ConfigBuilder` with no values set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the orchestrator deadline for each enhancement call.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    #[must_use]
    pub fn anthropic(mut self, anthropic: AnthropicConfig) -> Self {
        self.anthropic = Some(anthropic);
        self
    }

    #[must_use]
    pub fn openrouter(mut self, openrouter: OpenRouterConfig) -> Self {
        self.openrouter = Some(openrouter);
        self
    }

    #[must_use]
    pub fn max_context_bytes(mut self, bytes: usize) -> Self {
        self.max_context_bytes = Some(bytes);
        self
    }

    #[must_use]
    pub fn max_tree_depth(mut self, depth: usize) -> Self {
        self.max_tree_depth = Some(depth);
        self
    }

    #[must_use]
    pub fn max_recent_commits(mut self, commits: usize) -> Self {
        self.max_recent_commits = Some(commits);
        self
    }

    /// Add a glob pattern excluded from project walks.
    #[must_use]
    pub fn ignore(mut self, pattern: impl Into<String>) -> Self {
        self.ignore.push(pattern.into());
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value fails validation.
    pub fn build(self) -> Result<Config, ConfigError> {
        let mut source_attribution = HashMap::new();
        let mut attribute = |key: &str, set: bool| {
            let source = if set {
                ConfigSource::Programmatic
            } else {
                ConfigSource::Default
            };
            source_attribution.insert(key.to_string(), source);
        };

        attribute("timeout_secs", self.timeout.is_some());
        attribute("llm_provider", self.provider.is_some());
        attribute("max_context_bytes", self.max_context_bytes.is_some());
        attribute("max_tree_depth", self.max_tree_depth.is_some());
        attribute("max_recent_commits", self.max_recent_commits.is_some());
        if self.model.is_some() {
            attribute("model", true);
        }
        if self.verbose.is_some() {
            attribute("verbose", true);
        }
        if !self.ignore.is_empty() {
            attribute("context_ignore", true);
        }

        let config = Config {
            defaults: Defaults {
                timeout_secs: self.timeout.map(|d| d.as_secs_f64()),
                model: self.model,
                verbose: self.verbose,
            },
            llm: LlmConfig {
                provider: self.provider,
                anthropic: self.anthropic,
                openrouter: self.openrouter,
            },
            context: ContextConfig {
                max_context_bytes: self.max_context_bytes,
                max_tree_depth: self.max_tree_depth,
                max_recent_commits: self.max_recent_commits,
                ignore: self.ignore,
            },
            source_attribution,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_attributes_programmatic_values() {
        let config = Config::builder()
            .timeout(Duration::from_millis(1500))
            .model("claude-haiku-4-5")
            .build()
            .unwrap();

        assert_eq!(config.timeout_secs(), 1.5);
        assert_eq!(config.defaults.model.as_deref(), Some("claude-haiku-4-5"));
        assert_eq!(
            config.source_attribution.get("timeout_secs"),
            Some(&ConfigSource::Programmatic)
        );
        assert_eq!(
            config.source_attribution.get("llm_provider"),
            Some(&ConfigSource::Default)
        );
    }

    #[test]
    fn test_builder_rejects_zero_timeout() {
        let err = Config::builder()
            .timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_builder_collects_ignore_patterns() {
        let config = Config::builder()
            .ignore("fixtures/**")
            .ignore("*.snap")
            .build()
            .unwrap();
        assert_eq!(config.ignore_patterns().len(), 2);
    }
}
