//! The adversarial brute-force scenario
//!
//! Hammers sign-in with rotating wrong passwords against a pre-seeded
//! account. It never signs in and contributes no score; its job is to
//! verify the target does not become trivially exploitable under load. A
//! 403 lockout after repeated attempts is correct target behavior and is
//! honored by coasting for as many ticks as attempts were made.

use std::sync::Arc;

use rand::Rng;
use tokio::sync::Mutex;

use tradebench_config::BenchConfig;
use tradebench_core::{BenchError, RunSignal};
use tradebench_http::Client;
use tradebench_scheduler::{BoxTask, ExecTask, SequenceTask};

use crate::score::{EventSender, ScoreKind};

use super::{silent_step, Lane, Scenario};

#[derive(Debug, Default)]
struct BruteState {
    cursor: i64,
    attempts: u32,
    coast: u32,
}

/// An attacker cycling known-bad passwords at a fixed interval
pub struct BruteForceScenario {
    client: Arc<Client>,
    lane: Lane,
    state: Mutex<BruteState>,
}

impl BruteForceScenario {
    pub fn new(client: Arc<Client>, config: Arc<BenchConfig>) -> Self {
        Self {
            client,
            lane: Lane::new(config.benchmark.brute_force_delay),
            state: Mutex::new(BruteState::default()),
        }
    }

    async fn attempt_once(&self, ctx: &RunSignal, events: &EventSender) -> Result<(), BenchError> {
        silent_step(events, ScoreKind::GetTop, self.client.top(ctx).await).await?;

        let cursor = self.state.lock().await.cursor;
        let info = silent_step(events, ScoreKind::GetInfo, self.client.info(ctx, cursor).await).await?;

        let mut st = self.state.lock().await;
        if info.cursor > 0 {
            st.cursor = info.cursor;
        }
        if st.coast > 0 {
            st.coast -= 1;
            return Ok(());
        }

        let guess = {
            let mut rng = rand::thread_rng();
            format!("password{:03}", rng.gen_range(0..1000))
        };
        self.client.set_password(guess);
        st.attempts += 1;
        let attempts = st.attempts;
        drop(st);

        let outcome = match self.client.signin(ctx).await {
            Ok(()) => {
                self.state.lock().await.attempts = 0;
                Err(BenchError::Assertion(
                    "POST /signin accepted an invalid password".to_string(),
                ))
            }
            Err(err) => match err.status_code() {
                Some(403) if attempts > 5 => {
                    // Locked out after sustained attempts: correct behavior,
                    // back off for as long as we hammered.
                    self.state.lock().await.coast = attempts;
                    Ok(())
                }
                Some(404) => Ok(()),
                Some(403) => Err(err),
                _ => {
                    self.state.lock().await.attempts = 0;
                    Err(err)
                }
            },
        };
        silent_step(events, ScoreKind::Signin, outcome).await?;
        Ok(())
    }
}

impl Scenario for BruteForceScenario {
    fn bootstrap(self: Arc<Self>, _ctx: &RunSignal, events: EventSender) -> BoxTask {
        // No signup or sign-in: the bootstrap is a single probe of the
        // public pages, unscored.
        let this = self.clone();
        SequenceTask::new()
            .with(ExecTask::new(0, move |ctx| async move {
                silent_step(&events, ScoreKind::GetTop, this.client.top(&ctx).await).await?;
                let info =
                    silent_step(&events, ScoreKind::GetInfo, this.client.info(&ctx, 0).await)
                        .await?;
                if info.cursor > 0 {
                    this.state.lock().await.cursor = info.cursor;
                }
                Ok(())
            }))
            .boxed()
    }

    fn next_task(self: Arc<Self>, _ctx: &RunSignal, events: EventSender) -> Option<BoxTask> {
        if self.is_retired() {
            return None;
        }
        let guard = self.lane.try_begin()?;
        let this = self.clone();
        Some(
            ExecTask::new(0, move |ctx| async move {
                let _lane = guard;
                this.attempt_once(&ctx, &events).await
            })
            .boxed(),
        )
    }

    fn is_signed_in(&self) -> bool {
        self.client.user_id() > 0
    }

    fn is_retired(&self) -> bool {
        self.client.is_retired()
    }

    fn bank_id(&self) -> String {
        self.client.bank_id()
    }

    fn verification_client(&self) -> Option<Arc<Client>> {
        None
    }
}
