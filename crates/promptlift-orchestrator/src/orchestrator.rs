use promptlift_analyzers::Analyzer;
use promptlift_config::Config;
use promptlift_context::{CacheStats, ContextAggregator, ProjectContext};
use promptlift_llm::{Completion, CompletionRequest, EnhancementClient, LlmError};
use promptlift_utils::error::{InputValidationError, PromptliftError};
use promptlift_utils::logging::{
    enhance_span, log_enhance_complete, log_enhance_failed, log_enhance_start,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{Instrument, debug};

use crate::progress::{self, ProgressUpdate};
use crate::prompt::{ENHANCEMENT_SYSTEM_PROMPT, render_outbound_prompt};
use crate::state::StateTracker;
use crate::{
    CancelHandle, EnhancementOutcome, EnhancementRequest, EnhancementResult, EnhancementState,
    ProgressSink,
};

/// How the external call ended
enum CallOutcome {
    Completed(Completion),
    Cancelled,
    TimedOut,
    Failed(LlmError),
}

/// Turns a short instruction into a detailed prompt through one external call.
///
/// Owns its context cache: two orchestrators never share cached project
/// context, and [`EnhancementOrchestrator::clear_cache`] is the only way to
/// drop entries. Concurrent `enhance` calls on one instance are allowed; calls
/// for the same uncached project may each run the analyzers.
pub struct EnhancementOrchestrator {
    client: Arc<dyn EnhancementClient>,
    context: ContextAggregator,
    default_timeout_secs: f64,
}

impl std::fmt::Debug for EnhancementOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnhancementOrchestrator")
            .field("provider", &self.client.provider_name())
            .field("context", &self.context)
            .field("default_timeout_secs", &self.default_timeout_secs)
            .finish()
    }
}

impl EnhancementOrchestrator {
    /// Orchestrator with the built-in analyzers and default limits.
    #[must_use]
    pub fn new(client: Arc<dyn EnhancementClient>) -> Self {
        Self::with_aggregator(client, ContextAggregator::with_defaults())
    }

    /// Orchestrator with a custom ordered analyzer list.
    #[must_use]
    pub fn with_analyzers(
        client: Arc<dyn EnhancementClient>,
        analyzers: Vec<Arc<dyn Analyzer>>,
        max_context_bytes: usize,
    ) -> Self {
        Self::with_aggregator(client, ContextAggregator::new(analyzers, max_context_bytes))
    }

    fn with_aggregator(client: Arc<dyn EnhancementClient>, context: ContextAggregator) -> Self {
        Self {
            client,
            context,
            default_timeout_secs: promptlift_config::DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Build the provider client, analyzers and default timeout from `config`.
    ///
    /// # Errors
    ///
    /// Returns `PromptliftError::Llm` when the provider is unsupported or its
    /// API key is missing, and `PromptliftError::Config` for a malformed
    /// ignore glob.
    pub fn from_config(config: &Config) -> Result<Self, PromptliftError> {
        let client = promptlift_llm::from_config(config)?;
        let context = ContextAggregator::from_config(config)?;
        Ok(Self {
            client,
            context,
            default_timeout_secs: config.timeout_secs(),
        })
    }

    /// Timeout used by [`EnhancementOrchestrator::enhance_prompt`] when none is given
    #[must_use]
    pub fn default_timeout_secs(&self) -> f64 {
        self.default_timeout_secs
    }

    /// Enhance `request.prompt()`.
    ///
    /// Every outcome after input validation, including cancellation, timeout
    /// and client failure, is reported through the returned result.
    ///
    /// # Errors
    ///
    /// Returns [`InputValidationError`] for a blank prompt or an invalid
    /// timeout, before any filesystem or network work.
    pub async fn enhance(
        &self,
        request: EnhancementRequest,
    ) -> Result<EnhancementResult, InputValidationError> {
        let start = Instant::now();
        let timeout = request.validate()?;

        let project = request.project_path.as_ref().map(|p| p.display().to_string());
        let span = enhance_span(
            request.original_prompt.chars().count(),
            project.as_deref(),
            timeout.as_millis(),
        );
        Ok(self.run(request, timeout, start).instrument(span).await)
    }

    /// Positional form of [`EnhancementOrchestrator::enhance`].
    ///
    /// `timeout_secs` falls back to the configured default.
    ///
    /// # Errors
    ///
    /// Same as [`EnhancementOrchestrator::enhance`].
    pub async fn enhance_prompt(
        &self,
        prompt: impl Into<String>,
        project_path: Option<&Path>,
        timeout_secs: Option<f64>,
        on_progress: Option<Arc<dyn ProgressSink>>,
        cancel: Option<CancelHandle>,
    ) -> Result<EnhancementResult, InputValidationError> {
        let mut request = EnhancementRequest::new(prompt)
            .timeout_secs(timeout_secs.unwrap_or(self.default_timeout_secs));
        if let Some(path) = project_path {
            request = request.project_path(path);
        }
        if let Some(sink) = on_progress {
            request = request.progress_sink(sink);
        }
        if let Some(handle) = cancel {
            request = request.cancel_handle(handle);
        }
        self.enhance(request).await
    }

    async fn run(
        &self,
        request: EnhancementRequest,
        timeout: Duration,
        start: Instant,
    ) -> EnhancementResult {
        let mut state = StateTracker::new();
        let sink = request.progress.as_deref();
        let original = request.original_prompt.as_str();

        state.advance(EnhancementState::ContextLookup);
        let context = match &request.project_path {
            Some(path) => self.context.get_context(path).await,
            None => None,
        };
        if request.project_path.is_some() && context.is_none() {
            debug!("Project context unavailable; sending prompt without it");
        }
        let rendered = render_outbound_prompt(context.as_deref(), original);

        state.advance(EnhancementState::Calling);
        log_enhance_start(context.is_some(), rendered.chars().count());
        progress::emit(
            sink,
            ProgressUpdate::new(0, state.current(), "Requesting enhancement"),
        );

        let call = CompletionRequest::new(rendered, timeout).with_system(ENHANCEMENT_SYSTEM_PROMPT);
        let outcome = self.call(call, timeout, request.cancel.as_ref()).await;

        let context = context.as_deref();
        let result = match outcome {
            CallOutcome::Completed(completion) => {
                state.advance(EnhancementState::Completed);
                let result =
                    EnhancementResult::completed(original, context, completion, start.elapsed());
                progress::emit(
                    sink,
                    ProgressUpdate::new(100, state.current(), "Enhancement complete"),
                );
                result
            }
            CallOutcome::Cancelled => Self::unsuccessful(
                &mut state,
                original,
                context,
                EnhancementOutcome::Cancelled,
                "cancelled by caller".to_string(),
                start,
            ),
            CallOutcome::TimedOut => Self::unsuccessful(
                &mut state,
                original,
                context,
                EnhancementOutcome::TimedOut,
                format!(
                    "timeout: no response within {:.2}s",
                    timeout.as_secs_f64()
                ),
                start,
            ),
            CallOutcome::Failed(error) => Self::unsuccessful(
                &mut state,
                original,
                context,
                EnhancementOutcome::Failed,
                error.to_string(),
                start,
            ),
        };

        let duration_ms = result.processing_time().as_millis();
        match (result.outcome, &result.error_message) {
            (EnhancementOutcome::TimedOut | EnhancementOutcome::Failed, Some(message)) => {
                log_enhance_failed(result.outcome.as_str(), message, duration_ms);
            }
            _ => log_enhance_complete(result.outcome.as_str(), duration_ms),
        }
        result
    }

    fn unsuccessful(
        state: &mut StateTracker,
        original: &str,
        context: Option<&ProjectContext>,
        outcome: EnhancementOutcome,
        message: String,
        start: Instant,
    ) -> EnhancementResult {
        state.advance(outcome.state());
        EnhancementResult::unsuccessful(original, context, outcome, message, start.elapsed())
    }

    /// Issue the external call under the deadline, racing the cancel handle.
    ///
    /// The call runs as its own task so a panicking client becomes a failure
    /// instead of unwinding through `enhance`. Leaving this function drops the
    /// `JoinSet`, which aborts a call still in flight.
    async fn call(
        &self,
        request: CompletionRequest,
        timeout: Duration,
        cancel: Option<&CancelHandle>,
    ) -> CallOutcome {
        if cancel.is_some_and(CancelHandle::is_cancelled) {
            debug!("Cancelled before the call was issued");
            return CallOutcome::Cancelled;
        }

        let client = Arc::clone(&self.client);
        let mut in_flight = JoinSet::new();
        in_flight.spawn(async move { client.complete(request).await });
        let deadline = tokio::time::timeout(timeout, in_flight.join_next());

        let joined = match cancel {
            Some(handle) => {
                tokio::select! {
                    biased;
                    () = handle.cancelled() => return CallOutcome::Cancelled,
                    joined = deadline => joined,
                }
            }
            None => deadline.await,
        };

        match joined {
            Err(_elapsed) => CallOutcome::TimedOut,
            Ok(None) => CallOutcome::Failed(LlmError::Transport(
                "enhancement call was not started".to_string(),
            )),
            Ok(Some(Err(join_error))) => CallOutcome::Failed(LlmError::Transport(format!(
                "enhancement client task failed: {join_error}"
            ))),
            Ok(Some(Ok(Err(error)))) => CallOutcome::Failed(error),
            Ok(Some(Ok(Ok(completion)))) if completion.text.trim().is_empty() => {
                CallOutcome::Failed(LlmError::MalformedResponse(
                    "provider returned an empty completion".to_string(),
                ))
            }
            Ok(Some(Ok(Ok(completion)))) => CallOutcome::Completed(completion),
        }
    }

    /// Drop every cached project context.
    pub fn clear_cache(&self) {
        self.context.clear_cache();
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.context.cache_stats()
    }

    /// Cached context lookup without an external call
    pub async fn project_context(&self, path: &Path) -> Option<Arc<ProjectContext>> {
        self.context.get_context(path).await
    }

    #[must_use]
    pub fn context_aggregator(&self) -> &ContextAggregator {
        &self.context
    }

    #[must_use]
    pub fn provider_name(&self) -> &str {
        self.client.provider_name()
    }
}
