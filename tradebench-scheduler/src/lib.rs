//! Task scheduling for tradebench
//!
//! A [`Task`] is one schedulable, scoreable unit of work; the [`Worker`]
//! fans every submitted task out onto its own concurrent execution and
//! funnels finished tasks, panics included, onto a completion queue.

pub mod task;
pub mod worker;

pub use task::{BoxTask, ExecTask, SequenceTask, Task};
pub use worker::{SchedulerError, Worker};
