//! Core types for the enhancement client boundary

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::LlmError;

/// Input to one enhancement call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Fully rendered user prompt (project context already prepended, if any)
    pub prompt: String,
    /// System instructions sent alongside the prompt
    pub system: Option<String>,
    /// Model override; `None` uses the backend's default model
    pub model: Option<String>,
    /// Client-side timeout for this call
    pub timeout: Duration,
    /// Provider-specific parameters (e.g., temperature, max_tokens)
    pub metadata: HashMap<String, serde_json::Value>,
}

impl CompletionRequest {
    /// Create a new request for `prompt` with the given client timeout
    #[must_use]
    pub fn new(prompt: impl Into<String>, timeout: Duration) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            model: None,
            timeout,
            metadata: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Add provider metadata to the request
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Successful response from an enhancement client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    /// Completion text (the enhanced prompt)
    pub text: String,
    /// Model reasoning, when the provider exposes it
    pub reasoning: Option<String>,
    /// Provider name (e.g., "anthropic", "openrouter")
    pub provider: String,
    /// Model that was actually used
    pub model_used: String,
    pub tokens_input: u64,
    pub tokens_output: u64,
}

impl Completion {
    /// Create a new completion with zero token counts
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        provider: impl Into<String>,
        model_used: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            reasoning: None,
            provider: provider.into(),
            model_used: model_used.into(),
            tokens_input: 0,
            tokens_output: 0,
        }
    }

    #[must_use]
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    /// Set token counts
    #[must_use]
    pub fn with_tokens(mut self, input: u64, output: u64) -> Self {
        self.tokens_input = input;
        self.tokens_output = output;
        self
    }
}

/// The external call the orchestrator drives.
///
/// Implementations make exactly one attempt per `complete` call and honour
/// `request.timeout` as their own deadline. Retrying is left to callers.
#[async_trait]
pub trait EnhancementClient: Send + Sync {
    /// Send the rendered prompt and wait for the completion
    ///
    /// # Errors
    ///
    /// Returns `LlmError` for any failure during the call, including:
    /// - Transport failures (network errors)
    /// - Provider errors (auth, quota, outages)
    /// - The client's own timeout
    /// - Responses without usable text
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError>;

    /// Provider name used for logging and result attribution
    fn provider_name(&self) -> &str;
}
