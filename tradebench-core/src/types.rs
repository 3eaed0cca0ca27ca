//! Wire model of the exchange under test

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Order side, encoded as `"sell"` / `"buy"` on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeKind {
    Sell,
    Buy,
}

impl TradeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeKind::Sell => "sell",
            TradeKind::Buy => "buy",
        }
    }
}

impl std::fmt::Display for TradeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account as echoed by `POST /signin` and embedded in orders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
}

/// A settled trade embedded in an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: i64,
    pub amount: i64,
    pub price: i64,
    pub created_at: DateTime<Utc>,
}

/// An order as returned by `GET /orders` and `GET /info`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: TradeKind,
    #[serde(default)]
    pub user_id: i64,
    pub amount: i64,
    pub price: i64,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub trade_id: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade: Option<Trade>,
}

impl Order {
    /// Closed without ever trading, i.e. canceled or reserve-failed
    pub fn is_removed(&self) -> bool {
        self.closed_at.is_some() && self.trade_id == 0
    }
}

/// One candle of a chart series in `GET /info`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandlestickData {
    pub time: DateTime<Utc>,
    pub open: i64,
    pub close: i64,
    pub high: i64,
    pub low: i64,
}

/// Response shape of `GET /info`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfoResponse {
    pub cursor: i64,
    pub traded_orders: Vec<Order>,
    pub lowest_sell_price: i64,
    pub highest_buy_price: i64,
    pub chart_by_sec: Vec<CandlestickData>,
    pub chart_by_min: Vec<CandlestickData>,
    pub chart_by_hour: Vec<CandlestickData>,
    pub enable_share: bool,
}

/// Response shape of `POST /orders` and `DELETE /order/:id`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderActionResponse {
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_removed_requires_closed_without_trade() {
        let mut order = Order {
            id: 1,
            kind: TradeKind::Sell,
            user_id: 7,
            amount: 2,
            price: 100,
            closed_at: None,
            trade_id: 0,
            created_at: None,
            user: None,
            trade: None,
        };
        assert!(!order.is_removed());

        order.closed_at = Some(Utc::now());
        assert!(order.is_removed());

        order.trade_id = 9;
        assert!(!order.is_removed());
    }

    #[test]
    fn trade_kind_wire_encoding() {
        assert_eq!(serde_json::to_string(&TradeKind::Sell).unwrap(), "\"sell\"");
        let kind: TradeKind = serde_json::from_str("\"buy\"").unwrap();
        assert_eq!(kind, TradeKind::Buy);
        assert_eq!(kind.to_string(), "buy");
    }

    #[test]
    fn info_response_tolerates_missing_fields() {
        let info: InfoResponse = serde_json::from_str(r#"{"cursor": 42}"#).unwrap();
        assert_eq!(info.cursor, 42);
        assert!(info.traded_orders.is_empty());
        assert!(!info.enable_share);
    }
}
