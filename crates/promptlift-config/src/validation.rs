use globset::Glob;
use promptlift_utils::error::ConfigError;

use super::{Config, MIN_MAX_CONTEXT_BYTES, SUPPORTED_PROVIDERS};

impl Config {
    /// Validate the merged configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(timeout) = self.defaults.timeout_secs
            && !(timeout.is_finite() && timeout > 0.0)
        {
            return Err(invalid(
                "timeout_secs",
                format!("must be a positive number of seconds, got {timeout}"),
            ));
        }

        let provider = self.provider();
        if !SUPPORTED_PROVIDERS.contains(&provider) {
            return Err(invalid(
                "llm_provider",
                format!(
                    "unknown provider '{provider}'. Supported providers: {}",
                    SUPPORTED_PROVIDERS.join(", ")
                ),
            ));
        }

        if let Some(model) = &self.defaults.model
            && model.trim().is_empty()
        {
            return Err(invalid("model", "must not be empty".to_string()));
        }

        let temperatures = [
            (
                "llm.anthropic.temperature",
                self.llm.anthropic.as_ref().and_then(|a| a.temperature),
            ),
            (
                "llm.openrouter.temperature",
                self.llm.openrouter.as_ref().and_then(|o| o.temperature),
            ),
        ];
        for (key, value) in temperatures {
            if let Some(t) = value
                && !(0.0..=2.0).contains(&t)
            {
                return Err(invalid(key, format!("must be within [0, 2], got {t}")));
            }
        }

        let max_tokens = [
            (
                "llm.anthropic.max_tokens",
                self.llm.anthropic.as_ref().and_then(|a| a.max_tokens),
            ),
            (
                "llm.openrouter.max_tokens",
                self.llm.openrouter.as_ref().and_then(|o| o.max_tokens),
            ),
        ];
        for (key, value) in max_tokens {
            if value == Some(0) {
                return Err(invalid(key, "must be greater than zero".to_string()));
            }
        }

        if let Some(anthropic) = &self.llm.anthropic
            && let (Some(budget), Some(max_tokens)) =
                (anthropic.thinking_budget_tokens, anthropic.max_tokens)
            && budget >= max_tokens
        {
            return Err(invalid(
                "llm.anthropic.thinking_budget_tokens",
                format!("must be smaller than max_tokens ({max_tokens}), got {budget}"),
            ));
        }

        if let Some(bytes) = self.context.max_context_bytes
            && bytes < MIN_MAX_CONTEXT_BYTES
        {
            return Err(invalid(
                "max_context_bytes",
                format!("must be at least {MIN_MAX_CONTEXT_BYTES}, got {bytes}"),
            ));
        }

        for pattern in &self.context.ignore {
            if pattern.trim().is_empty() {
                return Err(invalid(
                    "context.ignore",
                    "patterns must not be empty".to_string(),
                ));
            }
            Glob::new(pattern).map_err(|e| {
                invalid(
                    "context.ignore",
                    format!("Invalid glob pattern '{pattern}': {e}"),
                )
            })?;
        }

        Ok(())
    }
}

fn invalid(key: &str, value: String) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    }
}

#[cfg(test)]
mod tests {
    use crate::{AnthropicConfig, Config};

    fn key_of(err: promptlift_utils::error::ConfigError) -> String {
        match err {
            promptlift_utils::error::ConfigError::InvalidValue { key, .. } => key,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::builder().build().unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_timeout() {
        let mut config = Config::builder().build().unwrap();
        for bad in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            config.defaults.timeout_secs = Some(bad);
            assert_eq!(key_of(config.validate().unwrap_err()), "timeout_secs");
        }
    }

    #[test]
    fn test_rejects_out_of_range_temperature() {
        let mut config = Config::builder().build().unwrap();
        config.llm.anthropic = Some(AnthropicConfig {
            temperature: Some(3.5),
            ..AnthropicConfig::default()
        });
        assert_eq!(
            key_of(config.validate().unwrap_err()),
            "llm.anthropic.temperature"
        );
    }

    #[test]
    fn test_rejects_thinking_budget_above_max_tokens() {
        let mut config = Config::builder().build().unwrap();
        config.llm.anthropic = Some(AnthropicConfig {
            max_tokens: Some(2048),
            thinking_budget_tokens: Some(4096),
            ..AnthropicConfig::default()
        });
        assert_eq!(
            key_of(config.validate().unwrap_err()),
            "llm.anthropic.thinking_budget_tokens"
        );
    }

    #[test]
    fn test_rejects_malformed_ignore_glob() {
        let mut config = Config::builder().build().unwrap();
        config.context.ignore = vec!["src/[".to_string()];
        assert_eq!(key_of(config.validate().unwrap_err()), "context.ignore");
    }

    #[test]
    fn test_rejects_tiny_context_cap() {
        let mut config = Config::builder().build().unwrap();
        config.context.max_context_bytes = Some(10);
        assert_eq!(key_of(config.validate().unwrap_err()), "max_context_bytes");
    }
}
