use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use promptlift_utils::paths::is_vcs_root;

use super::{Config, ConfigOverrides, ConfigSource, ContextConfig, Defaults, LlmConfig};

/// Directory searched for upward from the start directory
pub const CONFIG_DIR_NAME: &str = ".promptlift";

/// File name inside [`CONFIG_DIR_NAME`], `$PROMPTLIFT_HOME` or the user config dir
pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const ENV_HOME: &str = "PROMPTLIFT_HOME";
pub const ENV_PROVIDER: &str = "PROMPTLIFT_LLM_PROVIDER";
pub const ENV_TIMEOUT_SECS: &str = "PROMPTLIFT_TIMEOUT_SECS";
pub const ENV_MODEL: &str = "PROMPTLIFT_MODEL";

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    defaults: Option<Defaults>,
    llm: Option<LlmConfig>,
    context: Option<ContextConfig>,
}

impl Config {
    /// Discover and load configuration with precedence: overrides > env > file > defaults
    ///
    /// Uses the current working directory as the start of the upward search.
    pub fn discover(overrides: &ConfigOverrides) -> Result<Self> {
        let start_dir = env::current_dir().context("Failed to get current directory")?;
        Self::discover_from(&start_dir, overrides)
    }

    /// Discover and load configuration starting from a specific directory
    ///
    /// This is the path-driven variant used by tests to avoid depending on the
    /// process working directory.
    pub fn discover_from(start_dir: &Path, overrides: &ConfigOverrides) -> Result<Self> {
        let mut source_attribution = HashMap::new();

        let mut defaults = Defaults::default();
        let mut llm = LlmConfig::default();
        let mut context = ContextConfig::default();

        for key in [
            "timeout_secs",
            "llm_provider",
            "max_context_bytes",
            "max_tree_depth",
            "max_recent_commits",
        ] {
            source_attribution.insert(key.to_string(), ConfigSource::Default);
        }

        let config_path = match &overrides.config_path {
            Some(explicit) => Some(explicit.clone()),
            None => Self::discover_config_file_from(start_dir)?,
        };

        if let Some(path) = &config_path {
            let file_config = Self::load_config_file(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?;
            let config_source = ConfigSource::ConfigFile(path.clone());

            if let Some(file_defaults) = file_config.defaults {
                if file_defaults.timeout_secs.is_some() {
                    defaults.timeout_secs = file_defaults.timeout_secs;
                    source_attribution.insert("timeout_secs".to_string(), config_source.clone());
                }
                if file_defaults.model.is_some() {
                    defaults.model = file_defaults.model;
                    source_attribution.insert("model".to_string(), config_source.clone());
                }
                if file_defaults.verbose.is_some() {
                    defaults.verbose = file_defaults.verbose;
                    source_attribution.insert("verbose".to_string(), config_source.clone());
                }
            }

            if let Some(file_llm) = file_config.llm {
                if file_llm.provider.is_some() {
                    llm.provider = file_llm.provider;
                    source_attribution.insert("llm_provider".to_string(), config_source.clone());
                }
                if file_llm.anthropic.is_some() {
                    llm.anthropic = file_llm.anthropic;
                    source_attribution
                        .insert("llm_anthropic_config".to_string(), config_source.clone());
                }
                if file_llm.openrouter.is_some() {
                    llm.openrouter = file_llm.openrouter;
                    source_attribution
                        .insert("llm_openrouter_config".to_string(), config_source.clone());
                }
            }

            if let Some(file_context) = file_config.context {
                if file_context.max_context_bytes.is_some() {
                    context.max_context_bytes = file_context.max_context_bytes;
                    source_attribution
                        .insert("max_context_bytes".to_string(), config_source.clone());
                }
                if file_context.max_tree_depth.is_some() {
                    context.max_tree_depth = file_context.max_tree_depth;
                    source_attribution.insert("max_tree_depth".to_string(), config_source.clone());
                }
                if file_context.max_recent_commits.is_some() {
                    context.max_recent_commits = file_context.max_recent_commits;
                    source_attribution
                        .insert("max_recent_commits".to_string(), config_source.clone());
                }
                if !file_context.ignore.is_empty() {
                    context.ignore = file_context.ignore;
                    source_attribution.insert("context_ignore".to_string(), config_source);
                }
            }
        }

        // Environment overrides the file
        if let Some(provider) = non_empty_env(ENV_PROVIDER) {
            llm.provider = Some(provider);
            source_attribution.insert("llm_provider".to_string(), ConfigSource::Env);
        }
        if let Some(raw) = non_empty_env(ENV_TIMEOUT_SECS) {
            let parsed = raw.parse::<f64>().with_context(|| {
                format!("{ENV_TIMEOUT_SECS} must be a number of seconds, got '{raw}'")
            })?;
            defaults.timeout_secs = Some(parsed);
            source_attribution.insert("timeout_secs".to_string(), ConfigSource::Env);
        }
        if let Some(model) = non_empty_env(ENV_MODEL) {
            defaults.model = Some(model);
            source_attribution.insert("model".to_string(), ConfigSource::Env);
        }

        // Caller overrides are highest priority
        if let Some(timeout_secs) = overrides.timeout_secs {
            defaults.timeout_secs = Some(timeout_secs);
            source_attribution.insert("timeout_secs".to_string(), ConfigSource::Cli);
        }
        if let Some(model) = &overrides.model {
            defaults.model = Some(model.clone());
            source_attribution.insert("model".to_string(), ConfigSource::Cli);
        }
        if let Some(provider) = &overrides.provider {
            llm.provider = Some(provider.clone());
            source_attribution.insert("llm_provider".to_string(), ConfigSource::Cli);
        }
        if let Some(verbose) = overrides.verbose {
            defaults.verbose = Some(verbose);
            source_attribution.insert("verbose".to_string(), ConfigSource::Cli);
        }
        if let Some(max_context_bytes) = overrides.max_context_bytes {
            context.max_context_bytes = Some(max_context_bytes);
            source_attribution.insert("max_context_bytes".to_string(), ConfigSource::Cli);
        }

        let config = Self {
            defaults,
            llm,
            context,
            source_attribution,
        };

        config.validate()?;

        Ok(config)
    }

    /// Locate a config file for `start_dir`.
    ///
    /// Walks up from `start_dir` looking for `.promptlift/config.toml`, stopping
    /// at a repository root marker or the filesystem root. Falls back to
    /// `$PROMPTLIFT_HOME/config.toml`, then `<user config dir>/promptlift/config.toml`.
    pub fn discover_config_file_from(start_dir: &Path) -> Result<Option<PathBuf>> {
        let mut current_dir = Some(start_dir);

        while let Some(dir) = current_dir {
            let candidate = dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Ok(Some(candidate));
            }
            if is_vcs_root(dir) {
                break;
            }
            current_dir = dir.parent();
        }

        if let Some(home) = non_empty_env(ENV_HOME) {
            let candidate = PathBuf::from(home).join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Ok(Some(candidate));
            }
        }

        if let Some(user_dir) = dirs::config_dir() {
            let candidate = user_dir.join("promptlift").join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Ok(Some(candidate));
            }
        }

        Ok(None)
    }

    /// Load configuration from TOML file
    fn load_config_file(path: &Path) -> Result<TomlConfig> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let config: TomlConfig = toml::from_str(&content).with_context(|| {
                    format!("Failed to parse TOML config file: {}", path.display())
                })?;
                Ok(config)
            }
            // An explicit path that vanished between discovery and load behaves like no file
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TomlConfig::default()),
            Err(e) => Err(anyhow::anyhow!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            )),
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptlift_utils::test_support::EnvGuard;
    use serial_test::serial;
    use tempfile::TempDir;

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let config_dir = dir.join(CONFIG_DIR_NAME);
        std::fs::create_dir_all(&config_dir).unwrap();
        let path = config_dir.join(CONFIG_FILE_NAME);
        std::fs::write(&path, body).unwrap();
        path
    }

    /// Keep the user-level config and env out of the picture
    fn isolate() -> Vec<EnvGuard> {
        vec![
            EnvGuard::remove(ENV_HOME),
            EnvGuard::remove(ENV_PROVIDER),
            EnvGuard::remove(ENV_TIMEOUT_SECS),
            EnvGuard::remove(ENV_MODEL),
        ]
    }

    #[test]
    #[serial]
    fn test_file_values_are_applied_with_attribution() {
        let _env = isolate();
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join(".git")).unwrap();
        let path = write_config(
            temp.path(),
            r#"
            [defaults]
            timeout_secs = 12.5

            [llm]
            provider = "openrouter"

            [llm.openrouter]
            model = "anthropic/claude-sonnet-4.5"

            [context]
            max_tree_depth = 2
            "#,
        );

        let config = Config::discover_from(temp.path(), &ConfigOverrides::default()).unwrap();

        assert_eq!(config.timeout_secs(), 12.5);
        assert_eq!(config.provider(), "openrouter");
        assert_eq!(config.max_tree_depth(), 2);
        assert_eq!(
            config.source_attribution.get("timeout_secs"),
            Some(&ConfigSource::ConfigFile(path))
        );
        assert_eq!(
            config.source_attribution.get("max_recent_commits"),
            Some(&ConfigSource::Default)
        );
    }

    #[test]
    #[serial]
    fn test_discovery_walks_upward_to_repo_root() {
        let _env = isolate();
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join(".git")).unwrap();
        let path = write_config(temp.path(), "[defaults]\ntimeout_secs = 30\n");
        let nested = temp.path().join("src").join("deep");
        std::fs::create_dir_all(&nested).unwrap();

        let found = Config::discover_config_file_from(&nested).unwrap();
        assert_eq!(found, Some(path));
    }

    #[test]
    #[serial]
    fn test_env_overrides_file_and_overrides_beat_env() {
        let _env = isolate();
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join(".git")).unwrap();
        write_config(temp.path(), "[defaults]\ntimeout_secs = 30\n");

        let _timeout = EnvGuard::set(ENV_TIMEOUT_SECS, "45");
        let config = Config::discover_from(temp.path(), &ConfigOverrides::default()).unwrap();
        assert_eq!(config.timeout_secs(), 45.0);
        assert_eq!(
            config.source_attribution.get("timeout_secs"),
            Some(&ConfigSource::Env)
        );

        let overrides = ConfigOverrides {
            timeout_secs: Some(5.0),
            ..ConfigOverrides::default()
        };
        let config = Config::discover_from(temp.path(), &overrides).unwrap();
        assert_eq!(config.timeout_secs(), 5.0);
        assert_eq!(
            config.source_attribution.get("timeout_secs"),
            Some(&ConfigSource::Cli)
        );
    }

    #[test]
    #[serial]
    fn test_invalid_env_timeout_is_rejected() {
        let _env = isolate();
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join(".git")).unwrap();
        let _timeout = EnvGuard::set(ENV_TIMEOUT_SECS, "soon");

        let err = Config::discover_from(temp.path(), &ConfigOverrides::default()).unwrap_err();
        assert!(format!("{err:#}").contains(ENV_TIMEOUT_SECS));
    }

    #[test]
    #[serial]
    fn test_unknown_section_fails_to_parse() {
        let _env = isolate();
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join(".git")).unwrap();
        write_config(temp.path(), "[runner]\nmode = \"native\"\n");

        let err = Config::discover_from(temp.path(), &ConfigOverrides::default()).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse TOML"));
    }

    #[test]
    #[serial]
    fn test_validation_runs_after_merge() {
        let _env = isolate();
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join(".git")).unwrap();
        write_config(temp.path(), "[llm]\nprovider = \"carrier-pigeon\"\n");

        let err = Config::discover_from(temp.path(), &ConfigOverrides::default()).unwrap_err();
        assert!(err.to_string().contains("llm_provider"));
    }

    #[test]
    #[serial]
    fn test_explicit_missing_path_uses_defaults() {
        let _env = isolate();
        let temp = TempDir::new().unwrap();
        let overrides = ConfigOverrides {
            config_path: Some(temp.path().join("nope.toml")),
            ..ConfigOverrides::default()
        };
        let config = Config::discover_from(temp.path(), &overrides).unwrap();
        assert_eq!(config.timeout_secs(), 60.0);
    }
}
