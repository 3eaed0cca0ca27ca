//! Top-level run sequencing
//!
//! initialize → pre-test probe → timed benchmark → settle → post-test
//! verification → final result. Setup and probe failures abort with a zero
//! score; the benchmark deadline is the normal way a run ends.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use tradebench_core::RunSignal;

use crate::error::EngineError;
use crate::manager::Manager;

/// The outcome of a benchmark run
#[derive(Debug, Serialize)]
pub struct BenchResult {
    pub pass: bool,
    pub score: i64,
    pub errors: Vec<String>,
    pub logs: Vec<String>,
    pub load_level: u32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Filled in by the caller
    pub job_id: String,
    pub target: String,
    pub message: String,
}

/// Sequences one benchmark run end to end
pub struct Runner {
    manager: Arc<Manager>,
    started: DateTime<Utc>,
    ended: DateTime<Utc>,
    failed: bool,
}

impl Runner {
    pub fn new(manager: Arc<Manager>) -> Self {
        let now = Utc::now();
        Self {
            manager,
            started: now,
            ended: now,
            failed: false,
        }
    }

    pub async fn run(&mut self, ctx: &RunSignal) -> Result<(), EngineError> {
        self.started = Utc::now();
        let scope = ctx.child();
        let fetcher = {
            let manager = self.manager.clone();
            let scope = scope.clone();
            tokio::spawn(async move { manager.run_id_fetcher(scope).await })
        };

        let outcome = self.sequence(ctx).await;
        scope.cancel();
        let _ = fetcher.await;

        self.ended = Utc::now();
        if outcome.is_err() {
            self.failed = true;
        }
        outcome
    }

    async fn sequence(&mut self, ctx: &RunSignal) -> Result<(), EngineError> {
        let manager = &self.manager;

        manager.log().note("# initialize");
        manager.initialize(ctx).await?;

        manager.log().note("# pre test");
        manager.pre_test(ctx).await?;

        manager.log().note("# benchmark");
        let bench = ctx.child();
        let watchdog = {
            let bench = bench.clone();
            let duration = manager.config().benchmark.duration;
            tokio::spawn(async move {
                tokio::time::sleep(duration).await;
                bench.expire();
            })
        };
        let outcome = manager.clone().benchmark(&bench).await;
        watchdog.abort();
        bench.expire();
        manager.dump_scoreboard();
        outcome?;

        // Give cancellations a moment to settle before inspecting state.
        tokio::time::sleep(Duration::from_millis(50)).await;

        manager.log().note("# post test");
        manager.post_test(ctx).await?;
        Ok(())
    }

    /// The final result; always available, even for runs that stopped early
    pub fn result(&self) -> BenchResult {
        let manager = &self.manager;
        let mut score = manager.final_score();
        if self.failed {
            score = 0;
        }
        let pass = score > 0;
        if pass {
            manager.log().note(format!(
                "Pass: score={score} (level: {}, errors: {}, users: {}/{})",
                manager.level(),
                manager.error_count(),
                manager.active_users(),
                manager.all_users(),
            ));
        } else {
            manager.log().note(format!(
                "Fail: score={score} (level: {}, errors: {}, users: {}/{}, raw score: {})",
                manager.level(),
                manager.error_count(),
                manager.active_users(),
                manager.all_users(),
                manager.total_score(),
            ));
        }

        BenchResult {
            pass,
            score,
            errors: manager.errors(),
            logs: manager.log().lines(),
            load_level: manager.level(),
            start_time: self.started,
            end_time: self.ended,
            job_id: String::new(),
            target: String::new(),
            message: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradebench_config::BenchConfig;

    #[test]
    fn a_failed_run_scores_zero_even_with_points_on_the_board() {
        let manager = Arc::new(Manager::new(BenchConfig::default(), None).unwrap());
        manager.add_score(500);

        let mut runner = Runner::new(manager);
        runner.failed = true;
        let result = runner.result();
        assert!(!result.pass);
        assert_eq!(result.score, 0);
        // The failure is still explainable from the attached log.
        assert!(result.logs.iter().any(|line| line.contains("Fail")));
    }

    #[test]
    fn a_clean_run_reports_its_score() {
        let manager = Arc::new(Manager::new(BenchConfig::default(), None).unwrap());
        manager.add_score(500);

        let runner = Runner::new(manager);
        let result = runner.result();
        assert!(result.pass);
        assert_eq!(result.score, 500);
    }
}
