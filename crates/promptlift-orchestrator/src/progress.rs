use serde::Serialize;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tracing::warn;

use crate::EnhancementState;

/// One progress notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    /// 0 to 100
    pub percent: u8,
    pub state: EnhancementState,
    pub message: String,
}

impl ProgressUpdate {
    #[must_use]
    pub fn new(percent: u8, state: EnhancementState, message: impl Into<String>) -> Self {
        Self {
            percent: percent.min(100),
            state,
            message: message.into(),
        }
    }
}

/// Receives best-effort progress updates.
///
/// Updates may be skipped or coalesced; a sink must not rely on seeing every
/// percentage. Any `Fn(&ProgressUpdate)` closure is a sink.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, update: &ProgressUpdate);
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressUpdate) + Send + Sync,
{
    fn on_progress(&self, update: &ProgressUpdate) {
        self(update);
    }
}

/// Deliver `update`, containing a panicking sink.
pub(crate) fn emit(sink: Option<&dyn ProgressSink>, update: ProgressUpdate) {
    let Some(sink) = sink else {
        return;
    };
    if catch_unwind(AssertUnwindSafe(|| sink.on_progress(&update))).is_err() {
        warn!(
            percent = update.percent,
            state = %update.state,
            "Progress callback panicked; continuing"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_closure_is_a_sink() {
        let seen = Mutex::new(Vec::new());
        let sink = |u: &ProgressUpdate| seen.lock().unwrap().push(u.percent);

        emit(Some(&sink), ProgressUpdate::new(0, EnhancementState::Calling, "start"));
        emit(Some(&sink), ProgressUpdate::new(250, EnhancementState::Completed, "done"));

        assert_eq!(*seen.lock().unwrap(), vec![0, 100]);
    }

    #[test]
    fn test_panicking_sink_is_contained() {
        let sink = |u: &ProgressUpdate| {
            if u.percent == 0 {
                panic!("observer bug");
            }
        };
        emit(Some(&sink), ProgressUpdate::new(0, EnhancementState::Calling, "start"));
    }

    #[test]
    fn test_no_sink_is_a_no_op() {
        emit(None, ProgressUpdate::new(0, EnhancementState::Calling, "start"));
    }
}
