//! Anthropic HTTP backend implementation
//!
//! Talks to Anthropic's Messages API. When a thinking budget is configured the
//! request enables extended thinking and the thinking blocks become the
//! completion's reasoning.

use async_trait::async_trait;
use promptlift_config::Config;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::LlmError;
use crate::http_client::HttpClient;
use crate::types::{Completion, CompletionRequest, EnhancementClient};

/// Default Anthropic API endpoint
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/messages";

/// Anthropic API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub(crate) const DEFAULT_MODEL: &str = "claude-sonnet-4-5";

const DEFAULT_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

pub(crate) struct AnthropicBackend {
    client: HttpClient,
    base_url: String,
    api_key: String,
    default_model: String,
    default_params: HttpParams,
}

/// HTTP request parameters
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HttpParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub thinking_budget_tokens: Option<u32>,
}

impl Default for HttpParams {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            temperature: 0.3,
            thinking_budget_tokens: None,
        }
    }
}

impl AnthropicBackend {
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the HTTP client cannot be constructed
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        default_model: String,
        default_params: HttpParams,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            default_model,
            default_params,
        })
    }

    /// Create a new Anthropic backend from configuration
    ///
    /// The model comes from `[defaults] model`, then `[llm.anthropic] model`,
    /// then the built-in default.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the API key environment variable
    /// is not set or the HTTP client cannot be constructed
    pub fn new_from_config(config: &Config) -> Result<Self, LlmError> {
        let section = config.llm.anthropic.clone().unwrap_or_default();

        let api_key_env = section
            .api_key_env
            .as_deref()
            .unwrap_or(DEFAULT_API_KEY_ENV);
        let api_key = crate::read_api_key(api_key_env, "llm.anthropic")?;

        let default_model = config
            .defaults
            .model
            .clone()
            .or(section.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let defaults = HttpParams::default();
        let default_params = HttpParams {
            max_tokens: section.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: section.temperature.unwrap_or(defaults.temperature),
            thinking_budget_tokens: section.thinking_budget_tokens,
        };

        Self::new(api_key, section.base_url, default_model, default_params)
    }

    /// Resolve parameters for this request
    ///
    /// `request.model` overrides the default model; `max_tokens` and
    /// `temperature` metadata override the configured parameters.
    fn resolve_params(&self, request: &CompletionRequest) -> (String, HttpParams) {
        let model = request
            .model
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.default_model.clone());

        let max_tokens = request
            .metadata
            .get("max_tokens")
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(self.default_params.max_tokens);

        let temperature = request
            .metadata
            .get("temperature")
            .and_then(|v| v.as_f64())
            .map(|v| v as f32)
            .unwrap_or(self.default_params.temperature);

        let params = HttpParams {
            max_tokens,
            temperature,
            thinking_budget_tokens: self.default_params.thinking_budget_tokens,
        };

        (model, params)
    }

    fn build_body(request: &CompletionRequest, model: &str, params: &HttpParams) -> AnthropicRequest {
        let thinking = params.thinking_budget_tokens.map(|budget| ThinkingConfig {
            kind: "enabled",
            budget_tokens: budget,
        });

        AnthropicRequest {
            model: model.to_string(),
            messages: vec![AnthropicMessage {
                role: "user",
                content: request.prompt.clone(),
            }],
            max_tokens: params.max_tokens,
            // Extended thinking only accepts the default temperature
            temperature: thinking.is_none().then_some(params.temperature),
            system: request.system.clone(),
            thinking,
        }
    }

    /// Split response blocks into (text, reasoning)
    fn collect_blocks(blocks: &[ContentBlock]) -> (String, Option<String>) {
        let mut text = String::new();
        let mut reasoning = Vec::new();

        for block in blocks {
            match block.content_type.as_str() {
                "text" => {
                    if let Some(t) = &block.text {
                        text.push_str(t);
                    }
                }
                "thinking" => {
                    if let Some(t) = &block.thinking
                        && !t.trim().is_empty()
                    {
                        reasoning.push(t.trim().to_string());
                    }
                }
                _ => {}
            }
        }

        let reasoning = (!reasoning.is_empty()).then(|| reasoning.join("\n\n"));
        (text, reasoning)
    }
}

#[async_trait]
impl EnhancementClient for AnthropicBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError> {
        let (model, params) = self.resolve_params(&request);

        debug!(
            provider = "anthropic",
            model = %model,
            max_tokens = params.max_tokens,
            thinking = params.thinking_budget_tokens.is_some(),
            timeout_ms = request.timeout.as_millis() as u64,
            "Invoking Anthropic backend"
        );

        let body = Self::build_body(&request, &model, &params);
        let http_request = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body);

        let response = self
            .client
            .send(http_request, request.timeout, "anthropic")
            .await?;

        let response_body: AnthropicResponse = response.json().await.map_err(|e| {
            LlmError::MalformedResponse(format!("Failed to parse Anthropic response: {e}"))
        })?;

        let (text, reasoning) = Self::collect_blocks(&response_body.content);
        if text.trim().is_empty() {
            return Err(LlmError::MalformedResponse(
                "Anthropic response missing text content".to_string(),
            ));
        }

        let model_used = response_body.model.unwrap_or(model);
        let mut completion = Completion::new(text, "anthropic", model_used);
        completion.reasoning = reasoning;
        if let Some(usage) = response_body.usage {
            completion = completion.with_tokens(usage.input_tokens, usage.output_tokens);
        }

        debug!(
            provider = "anthropic",
            tokens_input = completion.tokens_input,
            tokens_output = completion.tokens_output,
            "Anthropic invocation completed"
        );

        Ok(completion)
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }
}

#[derive(Debug, Clone, Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ThinkingConfig {
    #[serde(rename = "type")]
    kind: &'static str,
    budget_tokens: u32,
}

/// Anthropic request body
#[derive(Debug, Clone, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking: Option<ThinkingConfig>,
}

/// Anthropic response body
#[derive(Debug, Clone, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    model: Option<String>,
    usage: Option<Usage>,
}

/// Content block in Anthropic response
#[derive(Debug, Clone, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
    thinking: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}
