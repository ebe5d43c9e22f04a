//! Shared HTTP client infrastructure for HTTP-based providers
//!
//! One `reqwest::Client` per backend, reused across calls. Each call is a
//! single attempt: 5xx and network failures are reported, not retried.

use promptlift_utils::logging::redact_secrets;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::debug;

use crate::LlmError;

/// Default connect timeout (30 seconds)
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest slice of an error body kept in an error message
const MAX_ERROR_BODY_CHARS: usize = 300;

#[derive(Clone)]
pub(crate) struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the client cannot be constructed
    pub fn new() -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| LlmError::Misconfiguration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url)
    }

    /// Send a request once, bounded by `request_timeout` as given.
    ///
    /// The caller's deadline is never shortened, so a request that outlives
    /// it ends with the caller's own timeout.
    ///
    /// # Errors
    ///
    /// - `LlmError::ProviderAuth` for 401/403
    /// - `LlmError::ProviderQuota` for 429
    /// - `LlmError::ProviderOutage` for 5xx
    /// - `LlmError::Timeout` when the HTTP timeout fires
    /// - `LlmError::Transport` for network errors and other 4xx
    pub async fn send(
        &self,
        request: RequestBuilder,
        request_timeout: Duration,
        provider_name: &str,
    ) -> Result<Response, LlmError> {
        debug!(
            provider = provider_name,
            timeout_ms = request_timeout.as_millis() as u64,
            "Executing HTTP request"
        );

        let response = match request.timeout(request_timeout).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return Err(LlmError::Timeout {
                    duration: request_timeout,
                });
            }
            Err(e) => {
                return Err(LlmError::Transport(format!(
                    "{provider_name} request failed: {}",
                    redact_secrets(&e.to_string())
                )));
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(map_status_error(status, provider_name, &body))
    }
}

/// Map a non-success HTTP status to an `LlmError` variant
///
/// - 401/403 → `LlmError::ProviderAuth`
/// - 429 → `LlmError::ProviderQuota`
/// - 5xx → `LlmError::ProviderOutage`
/// - Other → `LlmError::Transport`
fn map_status_error(status: StatusCode, provider_name: &str, body: &str) -> LlmError {
    let detail = error_detail(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            LlmError::ProviderAuth(format!("{provider_name} authentication failed: {status}{detail}"))
        }
        StatusCode::TOO_MANY_REQUESTS => {
            LlmError::ProviderQuota(format!("{provider_name} rate limit exceeded: {status}{detail}"))
        }
        s if s.is_server_error() => {
            LlmError::ProviderOutage(format!("{provider_name} returned server error: {status}{detail}"))
        }
        _ => LlmError::Transport(format!(
            "{provider_name} returned client error: {status}{detail}"
        )),
    }
}

fn error_detail(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let snippet: String = trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect();
    format!(" ({})", redact_secrets(&snippet))
}
