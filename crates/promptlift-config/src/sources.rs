use std::collections::HashMap;

use super::{Config, ConfigSource};

fn stable_source_label(source: &ConfigSource) -> &'static str {
    match source {
        ConfigSource::Cli => "cli",
        ConfigSource::Env => "env",
        ConfigSource::ConfigFile(_) => "config",
        ConfigSource::Programmatic => "programmatic",
        ConfigSource::Default => "default",
    }
}

fn source_label(source: Option<&ConfigSource>) -> String {
    stable_source_label(source.unwrap_or(&ConfigSource::Default)).to_string()
}

impl Config {
    /// Get effective configuration as key-value pairs with source attribution.
    ///
    /// Every key resolves to a value, falling back to built-in defaults.
    #[must_use]
    pub fn effective_config(&self) -> HashMap<String, (String, String)> {
        let mut config = HashMap::new();
        let mut add = |key: &str, value: String| {
            let source = source_label(self.source_attribution.get(key));
            config.insert(key.to_string(), (value, source));
        };

        add("timeout_secs", self.timeout_secs().to_string());
        add("llm_provider", self.provider().to_string());
        add("max_context_bytes", self.max_context_bytes().to_string());
        add("max_tree_depth", self.max_tree_depth().to_string());
        add("max_recent_commits", self.max_recent_commits().to_string());
        add("verbose", self.verbose().to_string());
        add("context_ignore", self.ignore_patterns().join(", "));

        if let Some(model) = &self.defaults.model {
            add("model", model.clone());
        }

        config
    }
}
