//! Clients for the back-office collaborator services
//!
//! The bank funds simulated users and is the ground truth for settlement;
//! the event log collects the target's tagged audit stream. Both are
//! internal services reached over plain HTTP with no retry policy: a
//! failure here is an operator problem, not a score event.

pub mod bank;
pub mod eventlog;

pub use bank::BankClient;
pub use eventlog::{LogClient, LogEntry};

/// Error type for back-office calls
#[derive(Debug, thiserror::Error)]
pub enum BackofficeError {
    #[error("{context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{context} [status:{status}] {message}")]
    Rejected {
        context: String,
        status: u16,
        message: String,
    },

    #[error("{context}: decode failed: {source}")]
    Decode {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}
