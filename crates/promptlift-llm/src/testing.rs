//! Scripted enhancement client for tests.
//!
//! Test seam; not part of public API stability guarantees.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use crate::LlmError;
use crate::types::{Completion, CompletionRequest, EnhancementClient};

#[derive(Debug, Clone)]
enum Script {
    /// Reply `"{prefix}{prompt}"`
    Echo(String),
    Reply(String),
    Fail(LlmError),
}

/// Call-counting stub with a configurable delay and canned outcome.
///
/// The delay is a `tokio::time::sleep`, so it honours paused test clocks and
/// is dropped cleanly when the caller stops polling.
#[derive(Debug)]
pub struct ScriptedClient {
    script: Script,
    reasoning: Option<String>,
    delay: Duration,
    calls: AtomicU32,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl ScriptedClient {
    fn with_script(script: Script) -> Self {
        Self {
            script,
            reasoning: None,
            delay: Duration::ZERO,
            calls: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Reply with `"Enhanced: <rendered prompt>"`
    #[must_use]
    pub fn echoing() -> Self {
        Self::with_script(Script::Echo("Enhanced: ".to_string()))
    }

    /// Always reply with `text`
    #[must_use]
    pub fn replying(text: impl Into<String>) -> Self {
        Self::with_script(Script::Reply(text.into()))
    }

    /// Always fail with `error`
    #[must_use]
    pub fn failing(error: LlmError) -> Self {
        Self::with_script(Script::Fail(error))
    }

    /// Sleep for `delay` before answering
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    /// Number of `complete` calls that started
    #[must_use]
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Rendered prompt of the most recent call
    #[must_use]
    pub fn last_prompt(&self) -> Option<String> {
        self.last_request().map(|r| r.prompt)
    }

    #[must_use]
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl EnhancementClient for ScriptedClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt = request.prompt.clone();
        *self
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(request);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let text = match &self.script {
            Script::Echo(prefix) => format!("{prefix}{prompt}"),
            Script::Reply(text) => text.clone(),
            Script::Fail(error) => return Err(error.clone()),
        };

        let tokens_in = prompt.split_whitespace().count() as u64;
        let tokens_out = text.split_whitespace().count() as u64;
        let mut completion =
            Completion::new(text, "scripted", "scripted-model").with_tokens(tokens_in, tokens_out);
        completion.reasoning = self.reasoning.clone();
        Ok(completion)
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echoing_client_counts_and_captures() {
        let client = ScriptedClient::echoing();
        let completion = client
            .complete(CompletionRequest::new("fix bug", Duration::from_secs(1)))
            .await
            .unwrap();

        assert_eq!(completion.text, "Enhanced: fix bug");
        assert_eq!(client.call_count(), 1);
        assert_eq!(client.last_prompt().as_deref(), Some("fix bug"));
    }

    #[tokio::test]
    async fn test_failing_client_returns_error() {
        let client = ScriptedClient::failing(LlmError::ProviderOutage("503".to_string()));
        let err = client
            .complete(CompletionRequest::new("x", Duration::from_secs(1)))
            .await
            .unwrap_err();
        assert_eq!(err, LlmError::ProviderOutage("503".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_uses_tokio_clock() {
        let client = ScriptedClient::replying("done").with_delay(Duration::from_secs(30));
        let started = tokio::time::Instant::now();
        client
            .complete(CompletionRequest::new("x", Duration::from_secs(60)))
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_secs(30));
    }
}
