use tokio_util::sync::CancellationToken;

/// Caller-owned cooperative cancellation signal.
///
/// Clones share one signal. The orchestrator checks it before issuing the
/// external call and races it against the call; once a call has reached a
/// terminal state, cancelling has no effect on its result.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once cancellation is requested
    pub(crate) async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}

impl From<CancellationToken> for CancelHandle {
    fn from(token: CancellationToken) -> Self {
        Self { token }
    }
}
