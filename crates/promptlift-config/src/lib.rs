//! Configuration management for promptlift
//!
//! Layered configuration with discovery and precedence:
//! caller overrides > `PROMPTLIFT_*` environment > TOML file > defaults.
//! Supports `[defaults]`, `[llm]` and `[context]` sections.

mod builder;
mod discovery;
mod model;
mod overrides;
mod sources;
mod validation;

pub use builder::ConfigBuilder;
pub use discovery::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, ENV_HOME, ENV_MODEL, ENV_PROVIDER, ENV_TIMEOUT_SECS,
};
pub use model::*;
pub use overrides::ConfigOverrides;
pub use promptlift_utils::types::ConfigSource;
