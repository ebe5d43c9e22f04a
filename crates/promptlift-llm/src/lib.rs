//! Enhancement client boundary for promptlift
//!
//! The orchestrator talks to a language model through the `EnhancementClient`
//! trait. HTTP backends for Anthropic and OpenRouter implement it; `from_config`
//! picks one based on `[llm] provider`.

mod anthropic_backend;
mod http_client;
mod openrouter_backend;
mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

use std::sync::Arc;

use promptlift_config::Config;

pub use promptlift_utils::error::LlmError;
pub use types::{Completion, CompletionRequest, EnhancementClient};

pub(crate) use anthropic_backend::AnthropicBackend;
pub(crate) use openrouter_backend::OpenRouterBackend;

/// Build the enhancement client selected by `[llm] provider`.
///
/// # Errors
///
/// Returns `LlmError::Unsupported` if the provider is unknown.
/// Returns `LlmError::Misconfiguration` if the provider's API key is missing
/// or the HTTP client cannot be constructed.
pub fn from_config(config: &Config) -> Result<Arc<dyn EnhancementClient>, LlmError> {
    let provider = config.provider();
    let client: Arc<dyn EnhancementClient> = match provider {
        "anthropic" => Arc::new(AnthropicBackend::new_from_config(config)?),
        "openrouter" => Arc::new(OpenRouterBackend::new_from_config(config)?),
        other => {
            return Err(LlmError::Unsupported(format!(
                "Unknown LLM provider '{other}'. Supported providers: anthropic, openrouter"
            )));
        }
    };

    tracing::debug!(provider = provider, "Constructed enhancement client");
    Ok(client)
}

/// Read an API key from `env_var`, naming the config section to fix on failure.
pub(crate) fn read_api_key(env_var: &str, section: &str) -> Result<String, LlmError> {
    match std::env::var(env_var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(LlmError::Misconfiguration(format!(
            "API key environment variable '{env_var}' is not set. \
             Export it or configure a different api_key_env in [{section}]."
        ))),
    }
}
