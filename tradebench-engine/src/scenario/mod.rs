//! Scenario lifecycles
//!
//! A scenario is one simulated user's behavioral state machine. It produces
//! tasks for the worker: a bootstrap sequence first, then keep-alive tasks
//! on each orchestration tick. Variants differ only in what their tasks do;
//! the manager drives them all through the same contract.

mod brute;
mod normal;

pub use brute::BruteForceScenario;
pub use normal::NormalScenario;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use tradebench_core::{BenchError, RunSignal};
use tradebench_http::Client;
use tradebench_scheduler::BoxTask;

use crate::score::{EventSender, ScoreKind, ScoreMsg};

/// One simulated user's lifecycle
pub trait Scenario: Send + Sync {
    /// The bootstrap sequence (top page through first order listing) as a
    /// single composite task
    fn bootstrap(self: Arc<Self>, ctx: &RunSignal, events: EventSender) -> BoxTask;

    /// The next keep-alive task for this tick, or `None` when the scenario
    /// has nothing due
    fn next_task(self: Arc<Self>, ctx: &RunSignal, events: EventSender) -> Option<BoxTask>;

    fn is_signed_in(&self) -> bool;

    /// Retired scenarios emit no further tasks and leave population counts
    fn is_retired(&self) -> bool;

    fn bank_id(&self) -> String;

    /// Client handle for post-test verification; `None` excludes the
    /// scenario from selection
    fn verification_client(&self) -> Option<Arc<Client>>;
}

/// Run one scored operation: report the outcome on the event queue and
/// convert failures into the already-reported marker so composite sequences
/// abort without double-counting.
pub(crate) async fn step<T>(
    events: &EventSender,
    kind: ScoreKind,
    result: Result<T, BenchError>,
) -> Result<T, BenchError> {
    match result {
        Ok(value) => {
            send(events, ScoreMsg::success(kind)).await;
            Ok(value)
        }
        Err(err) => {
            let summary = err.to_string();
            send(events, ScoreMsg::failure(kind, err)).await;
            Err(BenchError::StepFailed(summary))
        }
    }
}

/// Like [`step`], but successes are not reported: used by the adversarial
/// brute-force variant, which must not contribute score.
pub(crate) async fn silent_step<T>(
    events: &EventSender,
    kind: ScoreKind,
    result: Result<T, BenchError>,
) -> Result<T, BenchError> {
    match result {
        Ok(value) => Ok(value),
        Err(err) => {
            let summary = err.to_string();
            send(events, ScoreMsg::failure(kind, err)).await;
            Err(BenchError::StepFailed(summary))
        }
    }
}

pub(crate) async fn send(events: &EventSender, msg: ScoreMsg) {
    if events.send(msg).await.is_err() {
        debug!("score event queue closed; event dropped");
    }
}

/// Pacing gate for one stream of scenario work: at most one task in flight,
/// at most one begin per interval.
pub(crate) struct Lane {
    interval: Duration,
    due: Mutex<Instant>,
    busy: Arc<AtomicBool>,
}

impl Lane {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            due: Mutex::new(Instant::now()),
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Claim the lane if it is due and idle. The returned guard keeps the
    /// lane busy until dropped; the next slot opens `interval` after the
    /// claim.
    pub(crate) fn try_begin(&self) -> Option<LaneGuard> {
        let now = Instant::now();
        if now < *self.due.lock() {
            return None;
        }
        if self.busy.swap(true, Ordering::AcqRel) {
            return None;
        }
        *self.due.lock() = now + self.interval;
        Some(LaneGuard {
            busy: self.busy.clone(),
        })
    }
}

/// Releases the lane on drop, panics included
pub(crate) struct LaneGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for LaneGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lane_admits_one_claim_per_interval() {
        let lane = Lane::new(Duration::from_secs(60));
        let guard = lane.try_begin().expect("fresh lane is ready");
        // Busy and not yet due again.
        assert!(lane.try_begin().is_none());
        drop(guard);
        // Idle but the interval has not elapsed.
        assert!(lane.try_begin().is_none());
    }

    #[test]
    fn lane_reopens_after_the_interval() {
        let lane = Lane::new(Duration::ZERO);
        let guard = lane.try_begin().unwrap();
        drop(guard);
        assert!(lane.try_begin().is_some());
    }

    #[tokio::test]
    async fn step_reports_and_converts_failures() {
        let (tx, mut rx) = tokio::sync::mpsc::channel(4);

        let ok: Result<i64, BenchError> = Ok(7);
        assert_eq!(step(&tx, ScoreKind::GetInfo, ok).await.unwrap(), 7);
        let msg = rx.recv().await.unwrap();
        assert!(msg.err.is_none());
        assert_eq!(msg.kind, ScoreKind::GetInfo);

        let failed: Result<i64, BenchError> =
            Err(BenchError::Assertion("bad shape".to_string()));
        let err = step(&tx, ScoreKind::GetInfo, failed).await.unwrap_err();
        assert!(matches!(err, BenchError::StepFailed(_)));
        let msg = rx.recv().await.unwrap();
        assert!(matches!(msg.err, Some(BenchError::Assertion(_))));
    }

    #[tokio::test]
    async fn silent_step_reports_only_failures() {
        let (tx, mut rx) = tokio::sync::mpsc::channel(4);
        let ok: Result<(), BenchError> = Ok(());
        silent_step(&tx, ScoreKind::Signin, ok).await.unwrap();
        assert!(rx.try_recv().is_err());
    }
}
