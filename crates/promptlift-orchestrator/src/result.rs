use promptlift_context::ProjectContext;
use promptlift_llm::Completion;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::EnhancementState;

/// How an enhancement call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnhancementOutcome {
    Completed,
    /// Caller cancelled before a response arrived
    Cancelled,
    /// The orchestrator's deadline expired
    TimedOut,
    /// The client reported an error
    Failed,
}

impl EnhancementOutcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::TimedOut => "timed_out",
            Self::Failed => "failed",
        }
    }

    /// Terminal state this outcome corresponds to
    #[must_use]
    pub const fn state(self) -> EnhancementState {
        match self {
            Self::Completed => EnhancementState::Completed,
            Self::Cancelled => EnhancementState::Cancelled,
            Self::TimedOut => EnhancementState::TimedOut,
            Self::Failed => EnhancementState::Failed,
        }
    }
}

impl fmt::Display for EnhancementOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one `enhance()` call. Every call that passes input validation
/// returns one of these, whatever happened along the way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnhancementResult {
    pub original: String,
    /// Present exactly when `success` is true
    pub enhanced: Option<String>,
    pub reasoning: Option<String>,
    /// Wall time of the whole call, context lookup included
    pub processing_time_seconds: f64,
    pub success: bool,
    /// Verbatim client error, or a `timeout:`/`cancelled` message
    pub error_message: Option<String>,
    pub context_injected: bool,
    pub context_summary: Option<String>,
    pub outcome: EnhancementOutcome,
    pub tokens_input: u64,
    pub tokens_output: u64,
    pub provider: Option<String>,
    pub model: Option<String>,
}

impl EnhancementResult {
    fn base(
        original: &str,
        context: Option<&ProjectContext>,
        outcome: EnhancementOutcome,
        elapsed: Duration,
    ) -> Self {
        Self {
            original: original.to_string(),
            enhanced: None,
            reasoning: None,
            processing_time_seconds: elapsed.as_secs_f64(),
            success: false,
            error_message: None,
            context_injected: context.is_some(),
            context_summary: context.map(|c| c.summary.clone()),
            outcome,
            tokens_input: 0,
            tokens_output: 0,
            provider: None,
            model: None,
        }
    }

    pub(crate) fn completed(
        original: &str,
        context: Option<&ProjectContext>,
        completion: Completion,
        elapsed: Duration,
    ) -> Self {
        Self {
            enhanced: Some(completion.text),
            reasoning: completion.reasoning,
            success: true,
            tokens_input: completion.tokens_input,
            tokens_output: completion.tokens_output,
            provider: Some(completion.provider),
            model: Some(completion.model_used),
            ..Self::base(original, context, EnhancementOutcome::Completed, elapsed)
        }
    }

    pub(crate) fn unsuccessful(
        original: &str,
        context: Option<&ProjectContext>,
        outcome: EnhancementOutcome,
        message: String,
        elapsed: Duration,
    ) -> Self {
        Self {
            error_message: Some(message),
            ..Self::base(original, context, outcome, elapsed)
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.outcome == EnhancementOutcome::Cancelled
    }

    #[must_use]
    pub fn is_timed_out(&self) -> bool {
        self.outcome == EnhancementOutcome::TimedOut
    }

    #[must_use]
    pub fn processing_time(&self) -> Duration {
        Duration::from_secs_f64(self.processing_time_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_result_carries_completion() {
        let completion = Completion::new("better prompt", "scripted", "m1")
            .with_reasoning("because")
            .with_tokens(3, 2);

        let result =
            EnhancementResult::completed("fix bug", None, completion, Duration::from_millis(1500));

        assert!(result.success);
        assert_eq!(result.enhanced.as_deref(), Some("better prompt"));
        assert_eq!(result.reasoning.as_deref(), Some("because"));
        assert_eq!((result.tokens_input, result.tokens_output), (3, 2));
        assert_eq!(result.model.as_deref(), Some("m1"));
        assert!(!result.context_injected);
        assert!(result.error_message.is_none());
        assert_eq!(result.processing_time(), Duration::from_millis(1500));
    }

    #[test]
    fn test_unsuccessful_result_with_context() {
        let context = ProjectContext::from_records(Vec::new(), 1024);
        let result = EnhancementResult::unsuccessful(
            "x",
            Some(&context),
            EnhancementOutcome::TimedOut,
            "timeout: no response".to_string(),
            Duration::from_millis(10),
        );

        assert!(!result.success);
        assert!(result.enhanced.is_none());
        assert!(result.is_timed_out());
        assert!(!result.is_cancelled());
        assert!(result.context_injected);
        assert_eq!(result.context_summary.as_deref(), Some(context.summary.as_str()));
    }

    #[test]
    fn test_serializes_outcome_in_snake_case() {
        let result = EnhancementResult::unsuccessful(
            "x",
            None,
            EnhancementOutcome::Cancelled,
            "cancelled".to_string(),
            Duration::ZERO,
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["outcome"], "cancelled");
        assert_eq!(json["success"], false);
        assert!(json["enhanced"].is_null());
    }

    #[test]
    fn test_outcome_maps_to_terminal_state() {
        for outcome in [
            EnhancementOutcome::Completed,
            EnhancementOutcome::Cancelled,
            EnhancementOutcome::TimedOut,
            EnhancementOutcome::Failed,
        ] {
            assert!(outcome.state().is_terminal());
            assert_eq!(outcome.as_str(), outcome.state().as_str());
        }
    }
}
