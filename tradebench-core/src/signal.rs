//! Run-wide cancellation signal
//!
//! Two layered cancellation tokens: one for the benchmark deadline and one
//! for external aborts (operator interrupt, error budget exceeded). Callers
//! that observe cancellation ask the signal which error to surface, so work
//! cut short by the deadline is distinguishable from work that was aborted.

use tokio_util::sync::CancellationToken;

use crate::error::BenchError;

/// Cancellation signal threaded through every task and client call
#[derive(Debug, Clone, Default)]
pub struct RunSignal {
    abort: CancellationToken,
    deadline: CancellationToken,
}

impl RunSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Child signal: cancelling the child never cancels the parent
    pub fn child(&self) -> Self {
        Self {
            abort: self.abort.child_token(),
            deadline: self.deadline.child_token(),
        }
    }

    /// Abort the run (operator interrupt, error budget exceeded)
    pub fn cancel(&self) {
        self.abort.cancel();
    }

    /// Mark the benchmark deadline as reached
    pub fn expire(&self) {
        self.deadline.cancel();
    }

    pub fn is_over(&self) -> bool {
        self.abort.is_cancelled() || self.deadline.is_cancelled()
    }

    /// Resolves once the run is over, for either reason
    pub async fn over(&self) {
        tokio::select! {
            _ = self.abort.cancelled() => {}
            _ = self.deadline.cancelled() => {}
        }
    }

    /// The error a call interrupted by this signal should return
    pub fn as_error(&self) -> BenchError {
        if self.deadline.is_cancelled() {
            BenchError::DeadlineExceeded
        } else {
            BenchError::Canceled
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deadline_maps_to_deadline_error() {
        let signal = RunSignal::new();
        assert!(!signal.is_over());

        signal.expire();
        assert!(signal.is_over());
        assert!(matches!(signal.as_error(), BenchError::DeadlineExceeded));
        signal.over().await;
    }

    #[tokio::test]
    async fn abort_maps_to_canceled() {
        let signal = RunSignal::new();
        signal.cancel();
        assert!(matches!(signal.as_error(), BenchError::Canceled));
    }

    #[tokio::test]
    async fn child_cancellation_stays_local() {
        let parent = RunSignal::new();
        let child = parent.child();
        child.cancel();
        assert!(child.is_over());
        assert!(!parent.is_over());

        parent.expire();
        let other = parent.child();
        assert!(other.is_over());
    }
}
