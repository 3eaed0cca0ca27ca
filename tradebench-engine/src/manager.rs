//! The orchestrator
//!
//! Owns the global score, the error budget, the difficulty level and the
//! scenario population. Scenario-growth decisions are made in one place
//! (the tick loop and the event consumer); the scenarios themselves run
//! concurrently through the worker. Score/error counters and the
//! population list are guarded separately so score bookkeeping is never
//! blocked by population maintenance.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::seq::SliceRandom;
use rand::Rng;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use tradebench_backoffice::{BankClient, LogClient};
use tradebench_config::{BenchConfig, Validatable};
use tradebench_core::{BenchError, RunSignal};
use tradebench_http::{Client, Credentials};
use tradebench_scheduler::{BoxTask, Worker};

use crate::error::EngineError;
use crate::fixtures::{self, TestUser};
use crate::ident::IdGen;
use crate::probe::{Probe, SmokeProbe};
use crate::runlog::RunLog;
use crate::scenario::{BruteForceScenario, NormalScenario, Scenario};
use crate::score::{EventSender, ScoreBoard, ScoreMsg};
use crate::state::FinalState;

const EVENT_QUEUE_CAPACITY: usize = 2000;
const ID_QUEUE_CAPACITY: usize = 10;

/// Password the brute-force variant starts from; known-bad for every
/// fixture account
const BRUTE_FORCE_SEED_PASSWORD: &str = "12345";

/// The benchmark orchestrator
pub struct Manager {
    config: Arc<BenchConfig>,
    log: Arc<RunLog>,
    bank: Arc<BankClient>,
    eventlog: Arc<LogClient>,
    idgen: IdGen,
    id_tx: mpsc::Sender<String>,
    id_rx: tokio::sync::Mutex<mpsc::Receiver<String>>,
    worker: Arc<Worker>,

    score: AtomicI64,
    errors: Mutex<Vec<String>>,
    over_error: AtomicBool,
    level: AtomicU32,
    counter: AtomicU32,
    scoreboard: ScoreBoard,

    /// Every scenario ever created; retained for post-test selection
    scenarios: Mutex<Vec<Arc<dyn Scenario>>>,
    /// Scenarios still eligible for keep-alive tasks; pruned of retired
    active: Mutex<Vec<Arc<dyn Scenario>>>,

    test_users: Mutex<Vec<TestUser>>,
    state_path: Option<PathBuf>,

    tasks_finished: AtomicU64,
    task_score: AtomicI64,
}

impl Manager {
    pub fn new(config: BenchConfig, state_path: Option<PathBuf>) -> Result<Self, EngineError> {
        config
            .validate()
            .map_err(|err| EngineError::Setup(err.to_string()))?;

        let idgen = IdGen::new();
        let bank = BankClient::new(&config.target.internal_bank_url, idgen.bank_id())?;
        let eventlog = LogClient::new(&config.target.internal_log_url, idgen.bank_id())?;

        let mut roster = fixtures::roster();
        roster.shuffle(&mut rand::thread_rng());

        let (id_tx, id_rx) = mpsc::channel(ID_QUEUE_CAPACITY);
        Ok(Self {
            config: Arc::new(config),
            log: Arc::new(RunLog::new()),
            bank: Arc::new(bank),
            eventlog: Arc::new(eventlog),
            idgen,
            id_tx,
            id_rx: tokio::sync::Mutex::new(id_rx),
            worker: Arc::new(Worker::new()),
            score: AtomicI64::new(0),
            errors: Mutex::new(Vec::new()),
            over_error: AtomicBool::new(false),
            level: AtomicU32::new(0),
            counter: AtomicU32::new(0),
            scoreboard: ScoreBoard::new(),
            scenarios: Mutex::new(Vec::new()),
            active: Mutex::new(Vec::new()),
            test_users: Mutex::new(roster),
            state_path,
            tasks_finished: AtomicU64::new(0),
            task_score: AtomicI64::new(0),
        })
    }

    pub fn config(&self) -> &Arc<BenchConfig> {
        &self.config
    }

    pub fn log(&self) -> &Arc<RunLog> {
        &self.log
    }

    pub fn add_score(&self, points: i64) {
        self.score.fetch_add(points, Ordering::AcqRel);
    }

    pub fn score(&self) -> i64 {
        self.score.load(Ordering::Acquire)
    }

    pub fn level(&self) -> u32 {
        self.level.load(Ordering::Acquire)
    }

    pub fn error_count(&self) -> usize {
        self.errors.lock().len()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().clone()
    }

    pub fn over_error(&self) -> bool {
        self.over_error.load(Ordering::Acquire)
    }

    pub fn all_users(&self) -> usize {
        self.scenarios.lock().len()
    }

    pub fn active_users(&self) -> usize {
        self.scenarios
            .lock()
            .iter()
            .filter(|s| !s.is_retired())
            .count()
    }

    /// Record an error; the limit scales with score as
    /// `clamp(score/divisor, min, max)`
    pub fn append_error(&self, message: String) -> Result<(), EngineError> {
        let mut errors = self.errors.lock();
        errors.push(message);
        let count = errors.len() as i64;
        let limit = self.config.benchmark.error_limit(self.score());
        if limit <= count {
            self.over_error.store(true, Ordering::Release);
            return Err(EngineError::ErrorBudgetExceeded);
        }
        Ok(())
    }

    /// Raw score minus the error demerit; every error costs more as the
    /// score grows, bounded at half the raw score
    pub fn total_score(&self) -> i64 {
        let score = self.score();
        let demerit = self.config.benchmark.error_demerit(score);
        score - demerit * self.error_count() as i64
    }

    /// The score a run ends with: zero once the error budget was exceeded
    pub fn final_score(&self) -> i64 {
        if self.over_error() {
            return 0;
        }
        self.total_score()
    }

    pub fn dump_scoreboard(&self) {
        self.scoreboard.dump(&self.config.benchmark.scores);
        debug!(
            tasks = self.tasks_finished.load(Ordering::Relaxed),
            task_score = self.task_score.load(Ordering::Relaxed),
            "scheduler totals"
        );
    }

    /// Register bank ids ahead of demand so account creation never stalls
    /// a scenario spawn
    pub async fn run_id_fetcher(&self, ctx: RunSignal) {
        loop {
            if ctx.is_over() {
                return;
            }
            let id = self.idgen.bank_id();
            if let Err(err) = self.bank.register(&id).await {
                warn!(%err, "bank id registration failed");
            }
            tokio::select! {
                _ = ctx.over() => return,
                sent = self.id_tx.send(id) => {
                    if sent.is_err() {
                        return;
                    }
                }
            }
        }
    }

    async fn fetch_new_id(&self, ctx: &RunSignal) -> Result<String, EngineError> {
        let mut rx = self.id_rx.lock().await;
        tokio::select! {
            _ = ctx.over() => Err(EngineError::Setup(
                "benchmark stopped before a bank id was available".to_string(),
            )),
            id = rx.recv() => id.ok_or_else(|| {
                EngineError::Setup("bank id source closed".to_string())
            }),
        }
    }

    /// Point the target at its back-office services; must succeed before
    /// any scenario runs
    pub async fn initialize(&self, ctx: &RunSignal) -> Result<(), EngineError> {
        self.eventlog
            .initialize()
            .await
            .map_err(|err| EngineError::Initialize(format!("event log reset failed: {err}")))?;

        let guest = Client::with_request_timeout(
            &self.config.target.app_url,
            Credentials {
                bank_id: String::new(),
                name: String::new(),
                password: String::new(),
            },
            &self.config.client,
            self.config.client.init_timeout,
        )
        .map_err(|err| EngineError::Initialize(err.to_string()))?;

        guest
            .initialize(
                ctx,
                &self.config.target.bank_url,
                self.bank.app_id(),
                &self.config.target.log_url,
                self.eventlog.app_id(),
            )
            .await
            .map_err(|err| EngineError::Initialize(err.to_string()))
    }

    /// One-shot correctness probe before load generation begins
    pub async fn pre_test(&self, ctx: &RunSignal) -> Result<(), EngineError> {
        let bank_id = self.idgen.bank_id();
        self.bank
            .register(&bank_id)
            .await
            .map_err(|err| EngineError::PreTest(err.to_string()))?;
        let probe = SmokeProbe::new(
            &self.config.target.app_url,
            self.config.client.clone(),
            Credentials {
                bank_id,
                name: self.idgen.display_name(),
                password: self.idgen.password(),
            },
        );
        probe.run(ctx).await
    }

    /// Verify one surviving signed-in scenario and snapshot its final state
    pub async fn post_test(&self, ctx: &RunSignal) -> Result<(), EngineError> {
        let candidates: Vec<Arc<Client>> = {
            let scenarios = self.scenarios.lock();
            scenarios
                .iter()
                .filter(|s| !s.is_retired() && s.is_signed_in())
                .filter_map(|s| s.verification_client())
                .collect()
        };
        let Some(client) = candidates.first() else {
            self.log
                .note("no surviving scenario is eligible for post-test verification");
            return Ok(());
        };

        let mut last_err: Option<BenchError> = None;
        for _ in 0..5 {
            match FinalState::capture(client, ctx).await {
                Ok(state) => {
                    if let Some(path) = &self.state_path {
                        state.write(path)?;
                    }
                    return Ok(());
                }
                Err(err) => last_err = Some(err),
            }
        }
        Err(EngineError::PostTest(
            last_err
                .map(|err| err.to_string())
                .unwrap_or_else(|| "final state could not be captured".to_string()),
        ))
    }

    fn next_test_user(&self, cost: i64) -> Option<TestUser> {
        let mut users = self.test_users.lock();
        let mut cost = cost;
        loop {
            if users.is_empty() {
                return None;
            }
            if let Some(pos) = users.iter().position(|u| u.cost >= cost) {
                return Some(users.remove(pos));
            }
            if cost <= 0 {
                return None;
            }
            cost -= 1;
        }
    }

    /// Build the next scenario according to the recipe counter
    async fn new_scenario(&self, ctx: &RunSignal) -> Result<Arc<dyn Scenario>, EngineError> {
        let n = self.counter.fetch_add(1, Ordering::AcqRel) + 1;
        let client_config = &self.config.client;
        let app_url = &self.config.target.app_url;

        if n % 10 == 3 {
            if let Some(user) = self.next_test_user(10) {
                let client = Arc::new(Client::new(
                    app_url,
                    Credentials {
                        bank_id: user.bank_id.to_string(),
                        name: user.name.to_string(),
                        password: BRUTE_FORCE_SEED_PASSWORD.to_string(),
                    },
                    client_config,
                )?);
                debug!(bank_id = user.bank_id, cost = user.cost, "adding a brute-force actor");
                return Ok(Arc::new(BruteForceScenario::new(client, self.config.clone())));
            }
        }
        if n % 10 == 3 || n % 5 == 2 {
            if let Some(user) = self.next_test_user(6) {
                let client = Arc::new(Client::new(
                    app_url,
                    Credentials {
                        bank_id: user.bank_id.to_string(),
                        name: user.name.to_string(),
                        password: user.password.to_string(),
                    },
                    client_config,
                )?);
                let credit = self.bank.credit(user.bank_id).await?;
                debug!(
                    bank_id = user.bank_id,
                    cost = user.cost,
                    orders = user.orders,
                    "adding a scripted existing user"
                );
                return Ok(Arc::new(NormalScenario::existing(
                    client,
                    self.config.clone(),
                    credit,
                    10,
                    3,
                    false,
                )));
            }
        }

        // Fixture-starved scripted slots fall back to market-price users.
        let (credit, stock, unit, market) =
            if n % 10 == 3 || n % 5 == 2 || n == 10 || n == 20 || n == 30 {
                // Flush buyer taking the ask.
                (5_000_000, 0, 5, true)
            } else if n == 11 || n == 21 || n == 31 {
                // Flush seller hitting the bid.
                (0, 200, 5, true)
            } else if n < 16 {
                (30_000, 5, 1, false)
            } else {
                (35_000, 7, 3, false)
            };

        let creds = Credentials {
            bank_id: self.fetch_new_id(ctx).await?,
            name: self.idgen.display_name(),
            password: self.idgen.password(),
        };
        let client = Arc::new(Client::new(app_url, creds, client_config)?);
        if credit > 0 {
            if let Err(err) = self.bank.add_credit(&client.bank_id(), credit).await {
                warn!(%err, "could not fund a new scenario");
            }
        }
        Ok(Arc::new(NormalScenario::new(
            client,
            self.config.clone(),
            credit,
            stock,
            unit,
            market,
        )))
    }

    /// Spawn `count` new scenario lifecycles; each bootstraps through the
    /// worker after a small jitter
    fn spawn_scenarios(self: Arc<Self>, run: &RunSignal, events: &EventSender, count: usize) {
        for _ in 0..count {
            let mgr = self.clone();
            let run = run.clone();
            let events = events.clone();
            tokio::spawn(async move {
                let jitter = rand::thread_rng().gen_range(0..100);
                tokio::time::sleep(Duration::from_millis(jitter)).await;
                match mgr.new_scenario(&run).await {
                    Ok(scenario) => {
                        mgr.scenarios.lock().push(scenario.clone());
                        mgr.active.lock().push(scenario.clone());
                        let task = scenario.clone().bootstrap(&run, events.clone());
                        if mgr.worker.submit(task).await.is_err() {
                            debug!("worker closed before a scenario could bootstrap");
                        }
                    }
                    Err(err) => warn!(%err, "scenario creation failed"),
                }
            });
        }
    }

    /// The timed load-generation phase
    ///
    /// Returns `Ok` when stopped by the deadline and
    /// [`EngineError::ErrorBudgetExceeded`] when stopped by the budget.
    pub async fn benchmark(self: Arc<Self>, ctx: &RunSignal) -> Result<(), EngineError> {
        let run = ctx.child();
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let completions = self.worker.completions()?;

        let recv = tokio::spawn(
            self.clone()
                .recv_events(run.clone(), events_rx, events_tx.clone()),
        );
        let drain = tokio::spawn(self.clone().drain_completions(run.clone(), completions));
        let tick = tokio::spawn(self.clone().tick_loop(run.clone(), events_tx.clone()));

        self.clone()
            .spawn_scenarios(&run, &events_tx, self.config.benchmark.population.seed);
        drop(events_tx);

        let outcome = self.worker.run(&run, Vec::new()).await;
        self.worker.close();

        let _ = recv.await;
        let _ = tick.await;
        let _ = drain.await;
        outcome?;

        if self.over_error() {
            Err(EngineError::ErrorBudgetExceeded)
        } else {
            Ok(())
        }
    }

    async fn recv_events(
        self: Arc<Self>,
        run: RunSignal,
        mut events: mpsc::Receiver<ScoreMsg>,
        growth: EventSender,
    ) {
        loop {
            let msg = tokio::select! {
                _ = run.over() => return,
                msg = events.recv() => match msg {
                    Some(msg) => msg,
                    None => return,
                },
            };
            match msg.err {
                Some(err) if err.counts_against_budget() => {
                    self.log.note(format!("error: {err}"));
                    if self.append_error(err.to_string()).is_err() {
                        self.log
                            .note("accumulated errors exceeded the allowed budget; stopping");
                        run.cancel();
                        return;
                    }
                }
                Some(err) => debug!(%err, "ignoring wind-down noise"),
                None => {
                    self.add_score(msg.kind.points(&self.config.benchmark.scores));
                    self.scoreboard.add(msg.kind);
                    if msg.shared {
                        self.log
                            .note("a result was shared externally; population grows");
                        self.clone().spawn_scenarios(
                            &run,
                            &growth,
                            self.config.benchmark.population.add_on_share,
                        );
                    }
                }
            }
        }
    }

    async fn drain_completions(
        self: Arc<Self>,
        run: RunSignal,
        mut completions: mpsc::Receiver<BoxTask>,
    ) {
        loop {
            tokio::select! {
                _ = run.over() => break,
                task = completions.recv() => match task {
                    Some(task) => self.account_completion(&run, task),
                    None => return,
                },
            }
        }
        // Grace window: account for work that settles right after the
        // signal fires.
        while let Ok(Some(task)) =
            tokio::time::timeout(Duration::from_millis(100), completions.recv()).await
        {
            self.account_completion(&run, task);
        }
    }

    fn account_completion(&self, run: &RunSignal, task: BoxTask) {
        self.tasks_finished.fetch_add(1, Ordering::Relaxed);
        self.task_score.fetch_add(task.score(), Ordering::Relaxed);
        if let Some(err) = task.error() {
            // Task bodies report their own failures through the score
            // queue; only failures the body could not report land here.
            if matches!(err, BenchError::Panicked(_)) {
                self.log.note(format!("error: {err}"));
                if self.append_error(err.to_string()).is_err() {
                    self.log
                        .note("accumulated errors exceeded the allowed budget; stopping");
                    run.cancel();
                }
            } else {
                debug!(%err, "task finished with an error");
            }
        }
    }

    async fn tick_loop(self: Arc<Self>, run: RunSignal, events: EventSender) {
        let mut ticker = tokio::time::interval(self.config.benchmark.tick_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = run.over() => return,
                _ = ticker.tick() => {}
            }

            // Purge retired scenarios and collect due keep-alive tasks.
            let due: Vec<BoxTask> = {
                let mut active = self.active.lock();
                active.retain(|s| !s.is_retired());
                active
                    .iter()
                    .filter_map(|s| s.clone().next_task(&run, events.clone()))
                    .collect()
            };
            for task in due {
                if self.worker.submit(task).await.is_err() {
                    return;
                }
            }

            // Natural growth: one level per power-of-two score threshold,
            // gated on a lenient error count.
            loop {
                let level = self.level.load(Ordering::Acquire);
                if level >= 62 {
                    break;
                }
                let next = (1i64 << level) * 100;
                if self.score() < next {
                    break;
                }
                if self.config.benchmark.allow_error_min < self.error_count() as i64 {
                    break;
                }
                self.level.store(level + 1, Ordering::Release);
                self.log
                    .note("score threshold crossed; active user population grows");
                self.clone().spawn_scenarios(
                    &run,
                    &events,
                    self.config.benchmark.population.add_on_natural,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> Arc<Manager> {
        Arc::new(Manager::new(BenchConfig::default(), None).unwrap())
    }

    #[test]
    fn error_budget_trips_the_over_flag() {
        let mgr = manager();
        let limit = mgr.config.benchmark.error_limit(0);
        for i in 0..limit - 1 {
            assert!(mgr.append_error(format!("error {i}")).is_ok());
        }
        assert!(matches!(
            mgr.append_error("one too many".to_string()),
            Err(EngineError::ErrorBudgetExceeded)
        ));
        assert!(mgr.over_error());
        assert_eq!(mgr.final_score(), 0);
    }

    #[test]
    fn final_score_applies_the_error_demerit() {
        let mgr = manager();
        mgr.add_score(10_000);
        for i in 0..5 {
            mgr.append_error(format!("error {i}")).unwrap();
        }
        let demerit = mgr.config.benchmark.error_demerit(10_000);
        assert_eq!(mgr.final_score(), 10_000 - demerit * 5);
        assert_eq!(mgr.total_score(), mgr.final_score());
    }

    #[test]
    fn fixture_selection_falls_back_to_cheaper_users() {
        let mgr = manager();
        // Drain every user costing >= 10.
        while mgr.next_test_user(10).map(|u| u.cost >= 10).unwrap_or(false) {}
        // Asking for cost 10 again falls back to the best remaining user.
        if let Some(user) = mgr.next_test_user(10) {
            assert!(user.cost < 10);
        }
        // The roster eventually runs dry.
        while mgr.next_test_user(0).is_some() {}
        assert!(mgr.next_test_user(10).is_none());
    }

    #[test]
    fn population_counts_start_empty() {
        let mgr = manager();
        assert_eq!(mgr.all_users(), 0);
        assert_eq!(mgr.active_users(), 0);
        assert_eq!(mgr.level(), 0);
    }
}
