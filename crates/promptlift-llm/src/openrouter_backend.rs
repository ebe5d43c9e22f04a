//! OpenRouter HTTP backend implementation
//!
//! OpenAI-compatible chat completions API. Models that expose their reasoning
//! return it in `choices[0].message.reasoning`.

use async_trait::async_trait;
use promptlift_config::Config;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::LlmError;
use crate::http_client::HttpClient;
use crate::types::{Completion, CompletionRequest, EnhancementClient};

/// Default OpenRouter API endpoint
const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// X-Title header value
const DEFAULT_TITLE: &str = "promptlift";

pub(crate) const DEFAULT_MODEL: &str = "anthropic/claude-sonnet-4.5";

const DEFAULT_API_KEY_ENV: &str = "OPENROUTER_API_KEY";

pub(crate) struct OpenRouterBackend {
    client: HttpClient,
    base_url: String,
    api_key: String,
    default_model: String,
    default_params: HttpParams,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HttpParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for HttpParams {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            temperature: 0.3,
        }
    }
}

impl OpenRouterBackend {
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

    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the API key environment variable
    /// is not set or the HTTP client cannot be constructed
    pub fn new_from_config(config: &Config) -> Result<Self, LlmError> {
        let section = config.llm.openrouter.clone().unwrap_or_default();

        let api_key_env = section
            .api_key_env
            .as_deref()
            .unwrap_or(DEFAULT_API_KEY_ENV);
        let api_key = crate::read_api_key(api_key_env, "llm.openrouter")?;

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
        };

        Self::new(api_key, section.base_url, default_model, default_params)
    }

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

        (
            model,
            HttpParams {
                max_tokens,
                temperature,
            },
        )
    }

    fn build_messages(request: &CompletionRequest) -> Vec<OpenAiMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(OpenAiMessage {
                role: "system",
                content: system.clone(),
            });
        }
        messages.push(OpenAiMessage {
            role: "user",
            content: request.prompt.clone(),
        });
        messages
    }

    fn into_completion(response: OpenRouterResponse, model: String) -> Result<Completion, LlmError> {
        let choice = response.choices.into_iter().next().ok_or_else(|| {
            LlmError::MalformedResponse("OpenRouter response missing choices[0]".to_string())
        })?;

        let text = choice
            .message
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| {
                LlmError::MalformedResponse(
                    "OpenRouter response missing content in choices[0]".to_string(),
                )
            })?;

        let mut completion = Completion::new(text, "openrouter", response.model.unwrap_or(model));
        completion.reasoning = choice
            .message
            .reasoning
            .filter(|r| !r.trim().is_empty());
        if let Some(usage) = response.usage {
            completion = completion.with_tokens(usage.prompt_tokens, usage.completion_tokens);
        }
        Ok(completion)
    }
}

#[async_trait]
impl EnhancementClient for OpenRouterBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError> {
        let (model, params) = self.resolve_params(&request);

        debug!(
            provider = "openrouter",
            model = %model,
            max_tokens = params.max_tokens,
            temperature = params.temperature,
            timeout_ms = request.timeout.as_millis() as u64,
            "Invoking OpenRouter backend"
        );

        let body = OpenRouterRequest {
            model: model.clone(),
            messages: Self::build_messages(&request),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            stream: false,
        };

        let http_request = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("X-Title", DEFAULT_TITLE)
            .header("Content-Type", "application/json")
            .json(&body);

        let response = self
            .client
            .send(http_request, request.timeout, "openrouter")
            .await?;

        let response_body: OpenRouterResponse = response.json().await.map_err(|e| {
            LlmError::MalformedResponse(format!("Failed to parse OpenRouter response: {e}"))
        })?;

        let completion = Self::into_completion(response_body, model)?;

        debug!(
            provider = "openrouter",
            tokens_input = completion.tokens_input,
            tokens_output = completion.tokens_output,
            "OpenRouter invocation completed"
        );

        Ok(completion)
    }

    fn provider_name(&self) -> &str {
        "openrouter"
    }
}

#[derive(Debug, Clone, Serialize)]
struct OpenAiMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
    reasoning: Option<String>,
}

/// OpenRouter request body (OpenAI-compatible)
#[derive(Debug, Clone, Serialize)]
struct OpenRouterRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenRouterResponse {
    choices: Vec<Choice>,
    model: Option<String>,
    usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}
