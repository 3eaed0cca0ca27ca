//! Schedulable units of work

use std::collections::VecDeque;
use std::future::Future;

use async_trait::async_trait;
use futures::future::BoxFuture;

use tradebench_core::{BenchError, RunSignal};

/// One unit of deferred, scoreable work
///
/// A task is executed exactly once. Its score is authoritative only when no
/// error is recorded or the error is the deadline sentinel; any other error
/// reads as zero.
#[async_trait]
pub trait Task: Send {
    async fn run(&mut self, ctx: &RunSignal) -> Result<(), BenchError>;

    /// Record the failure that ended this task
    fn record_error(&mut self, err: BenchError);

    fn error(&self) -> Option<&BenchError>;

    fn score(&self) -> i64;
}

pub type BoxTask = Box<dyn Task>;

type TaskFn = Box<dyn FnOnce(RunSignal) -> BoxFuture<'static, Result<(), BenchError>> + Send>;

/// A task wrapping a single async closure worth a fixed number of points
pub struct ExecTask {
    points: i64,
    error: Option<BenchError>,
    runner: Option<TaskFn>,
}

impl ExecTask {
    pub fn new<F, Fut>(points: i64, f: F) -> Self
    where
        F: FnOnce(RunSignal) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BenchError>> + Send + 'static,
    {
        Self {
            points,
            error: None,
            runner: Some(Box::new(move |ctx| Box::pin(f(ctx)))),
        }
    }

    /// Box the task for submission to a worker
    pub fn boxed(self) -> BoxTask {
        Box::new(self)
    }
}

#[async_trait]
impl Task for ExecTask {
    async fn run(&mut self, ctx: &RunSignal) -> Result<(), BenchError> {
        match self.runner.take() {
            Some(runner) => runner(ctx.clone()).await,
            None => Err(BenchError::Assertion("task executed twice".to_string())),
        }
    }

    fn record_error(&mut self, err: BenchError) {
        self.error = Some(err);
    }

    fn error(&self) -> Option<&BenchError> {
        self.error.as_ref()
    }

    fn score(&self) -> i64 {
        match &self.error {
            Some(err) if !err.keeps_score() => 0,
            _ => self.points,
        }
    }
}

/// An ordered sequence of tasks run serially
///
/// Aborts on the first failing sub-task. Unlike a plain task, the sequence
/// keeps the partial credit of the sub-tasks that did complete.
#[derive(Default)]
pub struct SequenceTask {
    pending: VecDeque<BoxTask>,
    completed_score: i64,
    error: Option<BenchError>,
}

impl SequenceTask {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, task: impl Task + 'static) {
        self.pending.push_back(Box::new(task));
    }

    pub fn with(mut self, task: impl Task + 'static) -> Self {
        self.push(task);
        self
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn boxed(self) -> BoxTask {
        Box::new(self)
    }
}

#[async_trait]
impl Task for SequenceTask {
    async fn run(&mut self, ctx: &RunSignal) -> Result<(), BenchError> {
        while let Some(mut task) = self.pending.pop_front() {
            let outcome = task.run(ctx).await;
            self.completed_score += task.score();
            outcome?;
        }
        Ok(())
    }

    fn record_error(&mut self, err: BenchError) {
        self.error = Some(err);
    }

    fn error(&self) -> Option<&BenchError> {
        self.error.as_ref()
    }

    fn score(&self) -> i64 {
        self.completed_score
    }
}
