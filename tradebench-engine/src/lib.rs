//! The tradebench load-generation engine
//!
//! Scenario lifecycles produce tasks for the scheduler; the manager owns the
//! global scoreboard, error budget and population policy; the runner
//! sequences initialize, probes and the timed benchmark into a final result.

pub mod error;
pub mod fixtures;
pub mod ident;
pub mod manager;
pub mod probe;
pub mod runlog;
pub mod runner;
pub mod scenario;
pub mod score;
pub mod state;

pub use error::EngineError;
pub use manager::Manager;
pub use probe::{Probe, SmokeProbe};
pub use runner::{BenchResult, Runner};
pub use scenario::Scenario;
pub use score::{EventSender, ScoreBoard, ScoreKind, ScoreMsg};
pub use state::FinalState;
