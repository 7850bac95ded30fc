//! Per-call context threaded through handlers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

/// A cloneable cancellation signal.
///
/// All clones observe the same flag; once cancelled it stays cancelled.
#[derive(Clone, Debug)]
pub struct Cancellation {
    tx: Arc<watch::Sender<bool>>,
}

impl Cancellation {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Trigger the signal.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the signal has been triggered.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Cancel automatically once `after` has elapsed. Needs a running Tokio runtime.
    pub fn cancel_after(&self, after: Duration) {
        let token = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            token.cancel();
        });
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}

/// Typed per-call state plus the cancellation signal.
///
/// `state` carries whatever a pipeline needs between stages: the record
/// being built, an open transaction, accumulators.
#[derive(Debug)]
pub struct Ctx<S> {
    pub state: S,
    cancel: Cancellation,
}

impl<S> Ctx<S> {
    pub fn new(state: S) -> Self {
        Self::with_cancellation(state, Cancellation::new())
    }

    pub fn with_cancellation(state: S, cancel: Cancellation) -> Self {
        Self { state, cancel }
    }

    pub fn cancellation(&self) -> &Cancellation {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn into_state(self) -> S {
        self.state
    }
}

impl<S: Default> Default for Ctx<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}
