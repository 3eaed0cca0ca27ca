//! Unbounded fan-out task executor
//!
//! Every task pulled from the input queue runs on its own spawned
//! execution; panics are caught at the boundary and converted into a task
//! error. Every submitted task reaches the completion queue exactly once,
//! whatever happened to its body. The worker itself imposes no concurrency
//! ceiling: the effective limit is how much the orchestrator chooses to
//! submit, and the per-client timeouts downstream.

use std::any::Any;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

use tradebench_core::{BenchError, RunSignal};

use crate::task::BoxTask;

/// Queue capacity; a back-pressure safety valve, not a working limit
const QUEUE_CAPACITY: usize = 1000;

/// Scheduler-level failures
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("worker input queue is closed")]
    Closed,

    #[error("worker is already running")]
    AlreadyRunning,

    #[error("completion queue was already taken")]
    CompletionsTaken,
}

/// The task scheduler: one input queue in, one completion queue out
pub struct Worker {
    input_tx: Mutex<Option<mpsc::Sender<BoxTask>>>,
    input_rx: Mutex<Option<mpsc::Receiver<BoxTask>>>,
    output_tx: mpsc::Sender<BoxTask>,
    output_rx: Mutex<Option<mpsc::Receiver<BoxTask>>>,
}

impl Worker {
    pub fn new() -> Self {
        let (input_tx, input_rx) = mpsc::channel(QUEUE_CAPACITY);
        let (output_tx, output_rx) = mpsc::channel(QUEUE_CAPACITY);
        Self {
            input_tx: Mutex::new(Some(input_tx)),
            input_rx: Mutex::new(Some(input_rx)),
            output_tx,
            output_rx: Mutex::new(Some(output_rx)),
        }
    }

    /// Enqueue one task; blocks only on queue back-pressure
    pub async fn submit(&self, task: BoxTask) -> Result<(), SchedulerError> {
        let sender = self.input_tx.lock().clone().ok_or(SchedulerError::Closed)?;
        sender.send(task).await.map_err(|_| SchedulerError::Closed)
    }

    /// Enqueue several tasks in order
    pub async fn submit_all(&self, tasks: Vec<BoxTask>) -> Result<(), SchedulerError> {
        for task in tasks {
            self.submit(task).await?;
        }
        Ok(())
    }

    /// Take the completion queue; may be taken once
    pub fn completions(&self) -> Result<mpsc::Receiver<BoxTask>, SchedulerError> {
        self.output_rx
            .lock()
            .take()
            .ok_or(SchedulerError::CompletionsTaken)
    }

    /// Stop accepting new submissions; idempotent
    pub fn close(&self) {
        self.input_tx.lock().take();
    }

    /// The scheduling loop
    ///
    /// Returns when the input queue is closed and drained, or when the run
    /// signal fires. Dispatched tasks keep running either way; their
    /// completions still land on the output queue.
    pub async fn run(&self, ctx: &RunSignal, seed: Vec<BoxTask>) -> Result<(), SchedulerError> {
        let mut input = self
            .input_rx
            .lock()
            .take()
            .ok_or(SchedulerError::AlreadyRunning)?;

        if !seed.is_empty() {
            // Feed seeds from a side execution so a seed list larger than
            // the queue capacity cannot deadlock the loop before it starts.
            let sender = self.input_tx.lock().clone();
            if let Some(sender) = sender {
                tokio::spawn(async move {
                    for task in seed {
                        if sender.send(task).await.is_err() {
                            break;
                        }
                    }
                });
            }
        }

        loop {
            tokio::select! {
                _ = ctx.over() => {
                    debug!("worker stopping on run signal");
                    return Ok(());
                }
                next = input.recv() => {
                    let Some(task) = next else {
                        debug!("worker input queue closed and drained");
                        return Ok(());
                    };
                    self.dispatch(ctx, task);
                }
            }
        }
    }

    fn dispatch(&self, ctx: &RunSignal, mut task: BoxTask) {
        let output = self.output_tx.clone();
        let signal = ctx.clone();
        tokio::spawn(async move {
            let outcome = std::panic::AssertUnwindSafe(task.run(&signal))
                .catch_unwind()
                .await;
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => task.record_error(err),
                Err(panic) => task.record_error(BenchError::Panicked(panic_message(&panic))),
            }
            if output.send(task).await.is_err() {
                debug!("completion queue dropped before task could be reported");
            }
        });
    }
}

impl Default for Worker {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(panic: &Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "opaque panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{ExecTask, Task};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn every_task_reaches_the_completion_queue_once() {
        let worker = Arc::new(Worker::new());
        let mut completions = worker.completions().unwrap();
        let ctx = RunSignal::new();

        let runner = {
            let worker = worker.clone();
            let ctx = ctx.clone();
            tokio::spawn(async move { worker.run(&ctx, Vec::new()).await })
        };

        worker
            .submit(ExecTask::new(5, |_ctx| async { Ok(()) }).boxed())
            .await
            .unwrap();
        worker
            .submit(
                ExecTask::new(3, |_ctx| async {
                    Err(BenchError::Assertion("boom".to_string()))
                })
                .boxed(),
            )
            .await
            .unwrap();
        worker
            .submit(ExecTask::new(1, |_ctx| async { panic!("task body panicked") }).boxed())
            .await
            .unwrap();
        worker.close();

        let mut finished = Vec::new();
        while let Some(task) = completions.recv().await {
            finished.push(task);
            if finished.len() == 3 {
                break;
            }
        }
        runner.await.unwrap().unwrap();

        let scores: i64 = finished.iter().map(|t| t.score()).sum();
        assert_eq!(scores, 5);
        let panics = finished
            .iter()
            .filter(|t| matches!(t.error(), Some(BenchError::Panicked(_))))
            .count();
        assert_eq!(panics, 1);
        assert!(completions.try_recv().is_err());
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let worker = Arc::new(Worker::new());
        let ctx = RunSignal::new();
        let runner = {
            let worker = worker.clone();
            let ctx = ctx.clone();
            tokio::spawn(async move { worker.run(&ctx, Vec::new()).await })
        };

        worker.close();
        worker.close();
        assert!(matches!(
            worker.submit(ExecTask::new(1, |_ctx| async { Ok(()) }).boxed()).await,
            Err(SchedulerError::Closed)
        ));
        runner.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn cancellation_stops_intake_promptly() {
        let worker = Arc::new(Worker::new());
        let ctx = RunSignal::new();
        let runner = {
            let worker = worker.clone();
            let ctx = ctx.clone();
            tokio::spawn(async move { worker.run(&ctx, Vec::new()).await })
        };

        // A long sleeper is already dispatched when the signal fires.
        worker
            .submit(
                ExecTask::new(1, |ctx| async move {
                    ctx.over().await;
                    Ok(())
                })
                .boxed(),
            )
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        ctx.cancel();
        tokio::time::timeout(Duration::from_secs(1), runner)
            .await
            .expect("worker did not stop promptly")
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn seed_tasks_run_without_explicit_submission() {
        let worker = Arc::new(Worker::new());
        let mut completions = worker.completions().unwrap();
        let ctx = RunSignal::new();
        let seed = vec![
            ExecTask::new(2, |_ctx| async { Ok(()) }).boxed(),
            ExecTask::new(4, |_ctx| async { Ok(()) }).boxed(),
        ];

        let runner = {
            let worker = worker.clone();
            let ctx = ctx.clone();
            tokio::spawn(async move { worker.run(&ctx, seed).await })
        };

        let first = completions.recv().await.unwrap();
        let second = completions.recv().await.unwrap();
        assert_eq!(first.score() + second.score(), 6);

        worker.close();
        runner.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn run_twice_is_an_error() {
        let worker = Arc::new(Worker::new());
        let ctx = RunSignal::new();
        let runner = {
            let worker = worker.clone();
            let ctx = ctx.clone();
            tokio::spawn(async move { worker.run(&ctx, Vec::new()).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(matches!(
            worker.run(&ctx, Vec::new()).await,
            Err(SchedulerError::AlreadyRunning)
        ));
        worker.close();
        runner.await.unwrap().unwrap();
    }
}
