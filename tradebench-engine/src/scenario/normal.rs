//! The normal trading scenario
//!
//! Signs up, signs in, then alternates between polling the market snapshot
//! and working its order book: placing buy/sell orders around the last
//! trade price, cancelling the order farthest from the market when too many
//! are waiting, and claiming trade-success score when its orders settle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use tokio::sync::Mutex;
use tracing::debug;

use tradebench_config::BenchConfig;
use tradebench_core::{BenchError, InfoResponse, Order, RunSignal, TradeKind};
use tradebench_http::Client;
use tradebench_scheduler::{BoxTask, ExecTask, SequenceTask};

use crate::score::{EventSender, ScoreKind, ScoreMsg};

use super::{send, step, Lane, Scenario};

/// Position and market view of one trading scenario
#[derive(Debug, Default)]
struct TradingState {
    cursor: i64,
    orders: Vec<Order>,
    lowest_sell: i64,
    highest_buy: i64,
    last_trade_price: i64,
    enable_share: bool,
    default_credit: i64,
    default_stock: i64,
    current_credit: i64,
    current_stock: i64,
    reserved_credit: i64,
    reserved_stock: i64,
    gap_count: i64,
}

enum PlannedAction {
    Cancel(i64),
    Place {
        kind: TradeKind,
        amount: i64,
        price: i64,
    },
}

/// A simulated trader
pub struct NormalScenario {
    client: Arc<Client>,
    config: Arc<BenchConfig>,
    existing_user: bool,
    exclude_from_verification: bool,
    market_price: bool,
    unit: i64,
    poll_lane: Lane,
    order_lane: Lane,
    polls: AtomicU64,
    state: Mutex<TradingState>,
}

impl NormalScenario {
    pub fn new(
        client: Arc<Client>,
        config: Arc<BenchConfig>,
        credit: i64,
        stock: i64,
        unit: i64,
        market_price: bool,
    ) -> Self {
        let poll_lane = Lane::new(config.benchmark.polling_interval);
        let order_lane = Lane::new(config.benchmark.order_interval);
        Self {
            client,
            config,
            existing_user: false,
            exclude_from_verification: false,
            market_price,
            unit: unit.max(1),
            poll_lane,
            order_lane,
            polls: AtomicU64::new(0),
            state: Mutex::new(TradingState {
                default_credit: credit,
                default_stock: stock,
                current_credit: credit,
                current_stock: stock,
                ..TradingState::default()
            }),
        }
    }

    /// A scenario replaying a pre-seeded account: skips signup and is left
    /// out of post-test verification because its history predates this run
    pub fn existing(
        client: Arc<Client>,
        config: Arc<BenchConfig>,
        credit: i64,
        stock: i64,
        unit: i64,
        market_price: bool,
    ) -> Self {
        let mut scenario = Self::new(client, config, credit, stock, unit, market_price);
        scenario.existing_user = true;
        scenario.exclude_from_verification = true;
        scenario
    }

    async fn apply_info(&self, info: &InfoResponse) -> bool {
        let mut st = self.state.lock().await;
        st.lowest_sell = info.lowest_sell_price;
        st.highest_buy = info.highest_buy_price;
        st.enable_share = info.enable_share;
        if let Some(last) = info.chart_by_hour.last() {
            st.last_trade_price = last.close;
        }
        if info.cursor > 0 {
            st.cursor = info.cursor;
        }
        info.traded_orders.iter().any(|order| {
            st.orders
                .iter()
                .any(|mine| mine.id == order.id && mine.trade_id == 0)
        })
    }

    /// Fetch `GET /orders`, reconcile it against the local book and return
    /// the orders that traded since the last sync.
    async fn sync_orders(
        &self,
        ctx: &RunSignal,
        skip_reflect_check: bool,
    ) -> Result<Vec<Order>, BenchError> {
        let mut st = self.state.lock().await;
        let fetched = self.client.get_orders(ctx).await?;

        if !skip_reflect_check {
            // The most recent open sell order must be reflected; open buy
            // orders may be auto-cancelled by the target and are not
            // checked.
            if let Some(last_open) = st.orders.iter().rev().find(|o| o.closed_at.is_none()) {
                if last_open.kind == TradeKind::Sell
                    && !fetched.iter().any(|remote| remote.id == last_open.id)
                {
                    return Err(BenchError::Assertion(format!(
                        "GET /orders does not reflect a submitted sell order [id:{}]",
                        last_open.id
                    )));
                }
            }
        }

        let mut traded = Vec::new();
        for local in st.orders.iter_mut() {
            match fetched.iter().find(|remote| remote.id == local.id) {
                Some(remote) => {
                    if remote.trade.is_some() && local.trade_id == 0 {
                        traded.push(remote.clone());
                    }
                    *local = remote.clone();
                }
                None => {
                    if !local.is_removed() {
                        if local.kind == TradeKind::Sell {
                            return Err(BenchError::Assertion(format!(
                                "GET /orders dropped a sell order [id:{}]",
                                local.id
                            )));
                        }
                        local.closed_at = Some(Utc::now());
                    }
                }
            }
        }

        let mut reserved_credit = 0;
        let mut reserved_stock = 0;
        let mut traded_credit = 0;
        let mut traded_stock = 0;
        for order in &fetched {
            match (&order.trade, order.kind) {
                (Some(trade), TradeKind::Sell) => {
                    traded_stock -= order.amount;
                    traded_credit += order.amount * trade.price;
                }
                (Some(trade), TradeKind::Buy) => {
                    traded_stock += order.amount;
                    traded_credit -= order.amount * trade.price;
                }
                (None, TradeKind::Sell) => reserved_stock += order.amount,
                (None, TradeKind::Buy) => reserved_credit += order.amount * order.price,
            }
        }
        st.reserved_credit = reserved_credit;
        st.reserved_stock = reserved_stock;
        st.current_credit = st.default_credit + traded_credit;
        st.current_stock = st.default_stock + traded_stock;
        Ok(traded)
    }

    async fn report_trades(&self, events: &EventSender, traded: Vec<Order>) {
        if traded.is_empty() {
            return;
        }
        let shared = self.state.lock().await.enable_share;
        for _ in traded {
            send(events, ScoreMsg::shared(ScoreKind::TradeSuccess, shared)).await;
        }
    }

    async fn poll_once(&self, ctx: &RunSignal, events: &EventSender) -> Result<(), BenchError> {
        let cursor = self.state.lock().await.cursor;
        let info = step(events, ScoreKind::GetInfo, self.client.info(ctx, cursor).await).await?;
        let traded = self.apply_info(&info).await;
        self.polls.fetch_add(1, Ordering::Release);
        if traded {
            let traded = step(events, ScoreKind::GetOrders, self.sync_orders(ctx, false).await).await?;
            self.report_trades(events, traded).await;
        }
        Ok(())
    }

    async fn order_once(&self, ctx: &RunSignal, events: &EventSender) -> Result<(), BenchError> {
        let Some(action) = self.plan_action().await else {
            return Ok(());
        };
        match action {
            PlannedAction::Cancel(order_id) => {
                let result = match self.client.delete_order(ctx, order_id).await {
                    // An order can settle or vanish between planning and
                    // the delete reaching the target.
                    Err(err) if err.status_code() == Some(404) => {
                        debug!(order_id, "delete raced a close, accepting 404");
                        Ok(())
                    }
                    other => other,
                };
                step(events, ScoreKind::DeleteOrders, result).await?;
                self.mark_closed(order_id).await;
            }
            PlannedAction::Place {
                kind,
                amount,
                price,
            } => {
                match self.client.add_order(ctx, kind, amount, price).await {
                    Ok(order) => {
                        self.state.lock().await.orders.push(order);
                        send(events, ScoreMsg::success(ScoreKind::PostOrders)).await;
                    }
                    Err(err) if is_insufficient_funds(&err) => {
                        debug!(%kind, amount, price, "order rejected for lack of funds");
                        send(events, ScoreMsg::success(ScoreKind::PostOrders)).await;
                    }
                    Err(err) => {
                        let summary = err.to_string();
                        send(events, ScoreMsg::failure(ScoreKind::PostOrders, err)).await;
                        return Err(BenchError::StepFailed(summary));
                    }
                }
            }
        }

        let traded = step(events, ScoreKind::GetOrders, self.sync_orders(ctx, false).await).await?;
        self.report_trades(events, traded).await;

        // A crossed book means the matcher is backed up; ease off the
        // longer it stays crossed.
        let backoff = {
            let mut st = self.state.lock().await;
            if st.lowest_sell < st.highest_buy {
                st.gap_count += 1;
                (st.gap_count >= 5)
                    .then(|| std::time::Duration::from_millis(((st.gap_count - 5) as u64) * 100))
            } else {
                st.gap_count = 0;
                None
            }
        };
        if let Some(backoff) = backoff {
            tokio::time::sleep(backoff).await;
        }
        Ok(())
    }

    async fn plan_action(&self) -> Option<PlannedAction> {
        let st = self.state.lock().await;
        let mut rng = rand::thread_rng();

        let waiting = st.orders.iter().filter(|o| o.closed_at.is_none()).count() as i64;
        if waiting >= rng.gen_range(4..=5) {
            // Cancel the open order farthest from the market.
            let mut candidate: Option<(i64, i64)> = None;
            for order in st.orders.iter().filter(|o| o.closed_at.is_none()) {
                let distance = match order.kind {
                    TradeKind::Sell => order.price - st.highest_buy,
                    TradeKind::Buy => st.lowest_sell - order.price,
                };
                if candidate.map_or(true, |(_, best)| best < distance) {
                    candidate = Some((order.id, distance));
                }
            }
            return candidate.map(|(id, _)| PlannedAction::Cancel(id));
        }

        let liquid_credit = st.current_credit - st.reserved_credit;
        let liquid_stock = st.current_stock - st.reserved_stock;
        let amount = rng.gen_range(1..=self.unit);
        let buyable = if st.lowest_sell > 0 {
            liquid_credit / st.lowest_sell
        } else if st.last_trade_price > 0 {
            liquid_credit / st.last_trade_price
        } else {
            0
        };

        // Off-market orders drift one step around the last trade price.
        let mut price = st.last_trade_price;
        match rng.gen_range(0..5) {
            1 | 2 => price += 1,
            3 | 4 => price -= 1,
            _ => {}
        }

        let kind = if self.market_price && buyable / amount > 10 {
            // Funds for ten more rounds of buying: take the ask.
            price = st.lowest_sell;
            TradeKind::Buy
        } else if self.market_price && liquid_stock / amount > 10 {
            // Inventory for ten more rounds of selling: hit the bid.
            price = st.highest_buy;
            TradeKind::Sell
        } else if liquid_stock < amount {
            TradeKind::Buy
        } else if buyable < 1 {
            TradeKind::Sell
        } else if rng.gen_range(0..2) == 0 {
            TradeKind::Buy
        } else {
            TradeKind::Sell
        };

        let amount = match kind {
            TradeKind::Buy => {
                if price < 1 {
                    return None;
                }
                if liquid_credit < price * amount {
                    liquid_credit / price
                } else {
                    amount
                }
            }
            TradeKind::Sell => amount.min(liquid_stock),
        };
        if amount < 1 || price < 1 {
            return None;
        }
        Some(PlannedAction::Place {
            kind,
            amount,
            price,
        })
    }

    async fn mark_closed(&self, order_id: i64) {
        let mut st = self.state.lock().await;
        if let Some(order) = st.orders.iter_mut().find(|o| o.id == order_id) {
            order.closed_at = Some(Utc::now());
        }
    }
}

fn is_insufficient_funds(err: &BenchError) -> bool {
    match err {
        BenchError::Status { status: 400, body, .. } => {
            let body = body.to_lowercase();
            body.contains("insufficient") || body.contains("balance")
        }
        _ => false,
    }
}

impl Scenario for NormalScenario {
    fn bootstrap(self: Arc<Self>, _ctx: &RunSignal, events: EventSender) -> BoxTask {
        let scores = self.config.benchmark.scores.clone();
        let mut sequence = SequenceTask::new();

        {
            let this = self.clone();
            let events = events.clone();
            sequence.push(ExecTask::new(scores.get_top, move |ctx| async move {
                step(&events, ScoreKind::GetTop, this.client.top(&ctx).await).await?;
                Ok(())
            }));
        }
        {
            let this = self.clone();
            let events = events.clone();
            sequence.push(ExecTask::new(scores.get_info, move |ctx| async move {
                let info =
                    step(&events, ScoreKind::GetInfo, this.client.info(&ctx, 0).await).await?;
                this.apply_info(&info).await;
                Ok(())
            }));
        }
        if !self.existing_user {
            let this = self.clone();
            let events = events.clone();
            sequence.push(ExecTask::new(scores.signup, move |ctx| async move {
                step(&events, ScoreKind::Signup, this.client.signup(&ctx).await).await?;
                Ok(())
            }));
        }
        {
            let this = self.clone();
            let events = events.clone();
            sequence.push(ExecTask::new(scores.signin, move |ctx| async move {
                step(&events, ScoreKind::Signin, this.client.signin(&ctx).await).await?;
                Ok(())
            }));
        }
        {
            let this = self.clone();
            sequence.push(ExecTask::new(scores.get_orders, move |ctx| async move {
                step(&events, ScoreKind::GetOrders, this.sync_orders(&ctx, true).await).await?;
                Ok(())
            }));
        }
        sequence.boxed()
    }

    fn next_task(self: Arc<Self>, _ctx: &RunSignal, events: EventSender) -> Option<BoxTask> {
        if self.is_retired() || !self.is_signed_in() {
            return None;
        }

        if let Some(guard) = self.poll_lane.try_begin() {
            let this = self.clone();
            let points = self.config.benchmark.scores.get_info;
            return Some(
                ExecTask::new(points, move |ctx| async move {
                    let _lane = guard;
                    this.poll_once(&ctx, &events).await
                })
                .boxed(),
            );
        }

        // Order actions only start once at least one poll has refreshed
        // the market view.
        if self.polls.load(Ordering::Acquire) > 0 {
            if let Some(guard) = self.order_lane.try_begin() {
                let this = self.clone();
                let points = self.config.benchmark.scores.post_orders;
                return Some(
                    ExecTask::new(points, move |ctx| async move {
                        let _lane = guard;
                        this.order_once(&ctx, &events).await
                    })
                    .boxed(),
                );
            }
        }
        None
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
        if self.exclude_from_verification {
            None
        } else {
            Some(self.client.clone())
        }
    }
}
