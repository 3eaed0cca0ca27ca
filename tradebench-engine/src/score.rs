//! Scoring: event messages and the per-category scoreboard

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::info;

use tradebench_config::ScoreValues;
use tradebench_core::BenchError;

/// Queue on which scenarios report score and error events
pub type EventSender = mpsc::Sender<ScoreMsg>;

/// Category of a scoreable operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreKind {
    GetTop,
    Signup,
    Signin,
    GetInfo,
    PostOrders,
    GetOrders,
    DeleteOrders,
    TradeSuccess,
}

impl ScoreKind {
    pub const ALL: [ScoreKind; 8] = [
        ScoreKind::GetTop,
        ScoreKind::Signup,
        ScoreKind::Signin,
        ScoreKind::GetInfo,
        ScoreKind::PostOrders,
        ScoreKind::GetOrders,
        ScoreKind::DeleteOrders,
        ScoreKind::TradeSuccess,
    ];

    /// Point value of one success in this category
    pub fn points(&self, values: &ScoreValues) -> i64 {
        match self {
            ScoreKind::GetTop => values.get_top,
            ScoreKind::Signup => values.signup,
            ScoreKind::Signin => values.signin,
            ScoreKind::GetInfo => values.get_info,
            ScoreKind::PostOrders => values.post_orders,
            ScoreKind::GetOrders => values.get_orders,
            ScoreKind::DeleteOrders => values.delete_orders,
            ScoreKind::TradeSuccess => values.trade_success,
        }
    }
}

impl std::fmt::Display for ScoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ScoreKind::GetTop => "GetTop",
            ScoreKind::Signup => "Signup",
            ScoreKind::Signin => "Signin",
            ScoreKind::GetInfo => "GetInfo",
            ScoreKind::PostOrders => "PostOrders",
            ScoreKind::GetOrders => "GetOrders",
            ScoreKind::DeleteOrders => "DeleteOrders",
            ScoreKind::TradeSuccess => "TradeSuccess",
        };
        f.write_str(name)
    }
}

/// One event on the score queue: a success worth points, or a failure
#[derive(Debug)]
pub struct ScoreMsg {
    pub kind: ScoreKind,
    pub err: Option<BenchError>,
    /// The success was shared externally, triggering population growth
    pub shared: bool,
}

impl ScoreMsg {
    pub fn success(kind: ScoreKind) -> Self {
        Self {
            kind,
            err: None,
            shared: false,
        }
    }

    pub fn shared(kind: ScoreKind, shared: bool) -> Self {
        Self {
            kind,
            err: None,
            shared,
        }
    }

    pub fn failure(kind: ScoreKind, err: BenchError) -> Self {
        Self {
            kind,
            err: Some(err),
            shared: false,
        }
    }
}

/// Success counts per category, dumped at the end of a run
#[derive(Debug, Default)]
pub struct ScoreBoard {
    counts: Mutex<HashMap<ScoreKind, i64>>,
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, kind: ScoreKind) {
        *self.counts.lock().entry(kind).or_insert(0) += 1;
    }

    pub fn count(&self, kind: ScoreKind) -> i64 {
        self.counts.lock().get(&kind).copied().unwrap_or(0)
    }

    /// Sum of points across all counted successes
    pub fn total_points(&self, values: &ScoreValues) -> i64 {
        let counts = self.counts.lock();
        counts
            .iter()
            .map(|(kind, count)| kind.points(values) * count)
            .sum()
    }

    /// Log one line per category with its count and subtotal
    pub fn dump(&self, values: &ScoreValues) {
        for kind in ScoreKind::ALL {
            let count = self.count(kind);
            if count > 0 {
                info!(
                    "{:<13} score={:<6} count={}",
                    kind.to_string(),
                    count * kind.points(values),
                    count
                );
            }
        }
    }
}
