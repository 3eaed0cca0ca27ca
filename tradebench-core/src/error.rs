//! Failure taxonomy for the benchmarker
//!
//! One error type flows through the client, the scheduler and the manager,
//! so policy code can classify failures by matching on variants instead of
//! string inspection. Classification helpers encode the three policies that
//! matter: which errors permanently disable a client, which are expected
//! wind-down noise excluded from the error budget, and which zero a task's
//! score.

use std::time::Duration;

/// Error type shared across the benchmarker
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    /// The client was already retired; no network attempt was made
    #[error("already retired client")]
    AlreadyRetired,

    /// Cumulative elapsed time crossed the retirement budget mid-call
    #[error("client gave up after {elapsed:?}: {reason}")]
    RetireTimeout { elapsed: Duration, reason: String },

    /// The run-wide cancellation signal fired during the call
    #[error("request canceled")]
    Canceled,

    /// The benchmark deadline elapsed; partial work still counts
    #[error("benchmark deadline exceeded")]
    DeadlineExceeded,

    /// Transport-level failure talking to the target
    #[error("{context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP status with a truncated diagnostic body
    #[error("{context} [status:{status}, body:{body}]")]
    Status {
        context: String,
        status: u16,
        body: String,
    },

    /// Response body did not decode as the expected shape
    #[error("{context}: body decode failed: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Response violated a contract the target must uphold
    #[error("{0}")]
    Assertion(String),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// A task body panicked; captured at the scheduler boundary
    #[error("task panic: {0}")]
    Panicked(String),

    /// A scenario step failed after already reporting the real error
    /// through the score event stream; recorded on the task so composite
    /// sequences abort without the failure being counted twice
    #[error("{0}")]
    StepFailed(String),
}

/// Status-error bodies are truncated for diagnostics; HTML error pages
/// carry no useful detail and are collapsed entirely.
const MAX_BODY_CHARS: usize = 200;

impl BenchError {
    /// Build a status error with the body truncated for diagnostics
    pub fn status(context: impl Into<String>, status: u16, body: &str) -> Self {
        let body = body.trim();
        let body = if body.chars().count() > MAX_BODY_CHARS {
            if body.to_lowercase().contains("<html") {
                "(html)".to_string()
            } else {
                let cut: String = body.chars().take(MAX_BODY_CHARS).collect();
                format!("{cut}...")
            }
        } else {
            body.to_string()
        };
        BenchError::Status {
            context: context.into(),
            status,
            body,
        }
    }

    /// Errors that permanently disable the owning client
    pub fn disables_client(&self) -> bool {
        matches!(
            self,
            BenchError::AlreadyRetired | BenchError::RetireTimeout { .. }
        )
    }

    /// Expected wind-down noise, excluded from the error budget
    pub fn is_noise(&self) -> bool {
        matches!(
            self,
            BenchError::AlreadyRetired | BenchError::Canceled | BenchError::DeadlineExceeded
        )
    }

    /// Whether a task carrying this error keeps its accumulated score
    pub fn keeps_score(&self) -> bool {
        matches!(self, BenchError::DeadlineExceeded)
    }

    /// HTTP status code, when this is a status error
    pub fn status_code(&self) -> Option<u16> {
        match self {
            BenchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this error is charged to the run's error budget. Wind-down
    /// noise is free, and retirement disables the client instead of
    /// counting as a run-level error.
    pub fn counts_against_budget(&self) -> bool {
        !self.is_noise() && !self.disables_client()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_body_is_truncated() {
        let long = "x".repeat(500);
        let err = BenchError::status("GET /info failed", 502, &long);
        match err {
            BenchError::Status { body, .. } => {
                assert_eq!(body.chars().count(), MAX_BODY_CHARS + 3);
                assert!(body.ends_with("..."));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn html_bodies_are_collapsed() {
        let page = format!("<HTML><body>{}</body>", "y".repeat(400));
        let err = BenchError::status("GET / failed", 503, &page);
        assert_eq!(err.status_code(), Some(503));
        match err {
            BenchError::Status { body, .. } => assert_eq!(body, "(html)"),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn classification_policies() {
        assert!(BenchError::AlreadyRetired.disables_client());
        assert!(BenchError::AlreadyRetired.is_noise());
        assert!(!BenchError::AlreadyRetired.keeps_score());

        let gave_up = BenchError::RetireTimeout {
            elapsed: Duration::from_secs(11),
            reason: "timed out".into(),
        };
        assert!(gave_up.disables_client());
        assert!(!gave_up.is_noise());

        assert!(BenchError::DeadlineExceeded.is_noise());
        assert!(BenchError::DeadlineExceeded.keeps_score());

        let status = BenchError::status("POST /orders failed", 400, "invalid price");
        assert!(!status.is_noise());
        assert!(!status.keeps_score());
    }
}
