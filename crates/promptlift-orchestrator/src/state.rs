//! Lifecycle of one `enhance()` call

use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::warn;

/// States of an enhancement call.
///
/// `Init -> ContextLookup -> Calling -> {Completed | Cancelled | TimedOut | Failed}`.
/// The four terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnhancementState {
    Init,
    ContextLookup,
    Calling,
    Completed,
    Cancelled,
    TimedOut,
    Failed,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Invalid enhancement state transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: EnhancementState,
    pub to: EnhancementState,
}

impl EnhancementState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::ContextLookup => "context_lookup",
            Self::Calling => "calling",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::TimedOut => "timed_out",
            Self::Failed => "failed",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Cancelled | Self::TimedOut | Self::Failed
        )
    }

    /// States reachable in one step
    #[must_use]
    pub const fn legal_next(self) -> &'static [Self] {
        match self {
            Self::Init => &[Self::ContextLookup],
            // Lookup is not cancellable and always proceeds to the call
            Self::ContextLookup => &[Self::Calling],
            Self::Calling => &[Self::Completed, Self::Cancelled, Self::TimedOut, Self::Failed],
            Self::Completed | Self::Cancelled | Self::TimedOut | Self::Failed => &[],
        }
    }

    /// Validate a transition from `self` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] if `to` is not reachable in one step.
    pub fn transition(self, to: Self) -> Result<Self, InvalidTransition> {
        if self.legal_next().contains(&to) {
            Ok(to)
        } else {
            Err(InvalidTransition { from: self, to })
        }
    }
}

impl fmt::Display for EnhancementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current state of one call; illegal moves are logged and ignored.
#[derive(Debug)]
pub(crate) struct StateTracker {
    current: EnhancementState,
}

impl StateTracker {
    pub(crate) const fn new() -> Self {
        Self {
            current: EnhancementState::Init,
        }
    }

    pub(crate) const fn current(&self) -> EnhancementState {
        self.current
    }

    pub(crate) fn advance(&mut self, to: EnhancementState) -> EnhancementState {
        match self.current.transition(to) {
            Ok(next) => self.current = next,
            Err(e) => warn!(error = %e, "Ignoring state transition"),
        }
        self.current
    }
}
