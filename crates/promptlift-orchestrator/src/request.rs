use promptlift_config::DEFAULT_TIMEOUT_SECS;
use promptlift_utils::error::InputValidationError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::{CancelHandle, ProgressSink};

/// Input to one `enhance()` call.
///
/// ```rust
/// use promptlift_orchestrator::{CancelHandle, EnhancementRequest, ProgressUpdate};
///
/// let cancel = CancelHandle::new();
/// let request = EnhancementRequest::new("add pagination to the users endpoint")
///     .project_path(".")
///     .timeout_secs(30.0)
///     .on_progress(|update: &ProgressUpdate| eprintln!("{}%", update.percent))
///     .cancel_handle(cancel.clone());
/// assert_eq!(request.timeout_secs_value(), 30.0);
/// ```
#[derive(Clone)]
pub struct EnhancementRequest {
    pub(crate) original_prompt: String,
    pub(crate) project_path: Option<PathBuf>,
    pub(crate) timeout_secs: f64,
    pub(crate) progress: Option<Arc<dyn ProgressSink>>,
    pub(crate) cancel: Option<CancelHandle>,
}

impl fmt::Debug for EnhancementRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnhancementRequest")
            .field("original_prompt", &self.original_prompt)
            .field("project_path", &self.project_path)
            .field("timeout_secs", &self.timeout_secs)
            .field("progress", &self.progress.is_some())
            .field("cancel", &self.cancel)
            .finish()
    }
}

impl EnhancementRequest {
    /// Request with no project, no observers and the default 60 second timeout
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            original_prompt: prompt.into(),
            project_path: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            progress: None,
            cancel: None,
        }
    }

    #[must_use]
    pub fn project_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.project_path = Some(path.into());
        self
    }

    /// Overall deadline in seconds; validated when the call starts.
    #[must_use]
    pub fn timeout_secs(mut self, secs: f64) -> Self {
        self.timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn timeout(self, timeout: Duration) -> Self {
        self.timeout_secs(timeout.as_secs_f64())
    }

    #[must_use]
    pub fn on_progress(self, sink: impl ProgressSink + 'static) -> Self {
        self.progress_sink(Arc::new(sink))
    }

    #[must_use]
    pub fn progress_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(sink);
        self
    }

    #[must_use]
    pub fn cancel_handle(mut self, handle: CancelHandle) -> Self {
        self.cancel = Some(handle);
        self
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.original_prompt
    }

    #[must_use]
    pub fn project(&self) -> Option<&Path> {
        self.project_path.as_deref()
    }

    #[must_use]
    pub fn timeout_secs_value(&self) -> f64 {
        self.timeout_secs
    }

    /// Check the prompt and timeout; returns the deadline.
    pub(crate) fn validate(&self) -> Result<Duration, InputValidationError> {
        if self.original_prompt.trim().is_empty() {
            return Err(InputValidationError::EmptyPrompt);
        }
        let secs = self.timeout_secs;
        if !secs.is_finite() || secs <= 0.0 {
            return Err(InputValidationError::InvalidTimeout(secs));
        }
        Duration::try_from_secs_f64(secs).map_err(|_| InputValidationError::InvalidTimeout(secs))
    }
}
