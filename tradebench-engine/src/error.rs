//! Engine-level error type

use tradebench_backoffice::BackofficeError;
use tradebench_core::BenchError;
use tradebench_scheduler::SchedulerError;

/// Failures surfaced by the orchestration layer
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("initialize failed: {0}")]
    Initialize(String),

    #[error("pre-test probe failed: {0}")]
    PreTest(String),

    #[error("post-test verification failed: {0}")]
    PostTest(String),

    #[error("accumulated errors exceeded the allowed budget")]
    ErrorBudgetExceeded,

    #[error("setup failed: {0}")]
    Setup(String),

    #[error(transparent)]
    Client(#[from] BenchError),

    #[error(transparent)]
    Backoffice(#[from] BackofficeError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
