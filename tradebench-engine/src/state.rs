//! Final-state snapshot
//!
//! At the end of a run the manager captures one verified user's orders and
//! market view as JSON, so a separate process can re-verify the target's
//! consistency after a reboot.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use tradebench_config::ClientConfig;
use tradebench_core::{BenchError, CandlestickData, InfoResponse, Order, RunSignal};
use tradebench_http::{Client, Credentials};

use crate::error::EngineError;

/// Snapshot of one account's state at the end of a run
#[derive(Debug, Serialize, Deserialize)]
pub struct FinalState {
    pub base_url: String,
    pub bank_id: String,
    pub name: String,
    pub password: String,
    pub orders: Vec<Order>,
    pub info: InfoResponse,
}

impl FinalState {
    /// Capture the current state through an already signed-in client
    pub async fn capture(client: &Client, ctx: &RunSignal) -> Result<Self, BenchError> {
        let orders = client.get_orders(ctx).await?;
        let info = client.info(ctx, 0).await?;
        Ok(Self {
            base_url: client.base_url().to_string(),
            bank_id: client.bank_id(),
            name: client.name(),
            password: client.password(),
            orders,
            info,
        })
    }

    pub fn write(&self, path: &Path) -> Result<(), EngineError> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, EngineError> {
        Ok(serde_json::from_reader(File::open(path)?)?)
    }

    /// Re-verify the snapshot against a (possibly rebooted) target
    pub async fn check(&self, ctx: &RunSignal, config: &ClientConfig) -> Result<(), EngineError> {
        let fail = |what: &str, detail: String| EngineError::PostTest(format!("{what}: {detail}"));

        let client = Client::new(
            &self.base_url,
            Credentials {
                bank_id: self.bank_id.clone(),
                name: self.name.clone(),
                password: self.password.clone(),
            },
            config,
        )
        .map_err(|err| fail("client construction", err.to_string()))?;

        client
            .signin(ctx)
            .await
            .map_err(|err| fail("sign-in", err.to_string()))?;

        let info = client
            .info(ctx, 0)
            .await
            .map_err(|err| fail("market snapshot", err.to_string()))?;
        let charts = [
            ("chart_by_sec", &self.info.chart_by_sec, &info.chart_by_sec),
            ("chart_by_min", &self.info.chart_by_min, &info.chart_by_min),
            ("chart_by_hour", &self.info.chart_by_hour, &info.chart_by_hour),
        ];
        for (name, expected, got) in charts {
            if !charts_match(expected, got) {
                return Err(EngineError::PostTest(format!("{name} diverged after restart")));
            }
        }

        let orders = client
            .get_orders(ctx)
            .await
            .map_err(|err| fail("order listing", err.to_string()))?;
        if orders != self.orders {
            return Err(EngineError::PostTest("orders diverged after restart".to_string()));
        }
        Ok(())
    }
}

/// The most recent candles may still be settling when the snapshot is
/// taken; only the stable prefix has to match.
fn charts_match(expected: &[CandlestickData], got: &[CandlestickData]) -> bool {
    if expected.len() < 2 {
        return true;
    }
    let cut = expected.len() - 2;
    got.len() >= cut && expected[..cut] == got[..cut]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn candle(close: i64) -> CandlestickData {
        CandlestickData {
            time: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            open: close - 1,
            close,
            high: close + 1,
            low: close - 2,
        }
    }

    #[test]
    fn charts_match_ignores_the_trailing_candles() {
        let expected = vec![candle(100), candle(101), candle(102), candle(103)];
        let mut got = expected.clone();
        got[3] = candle(999);
        got[2] = candle(998);
        assert!(charts_match(&expected, &got));

        got[0] = candle(997);
        assert!(!charts_match(&expected, &got));
    }

    #[test]
    fn short_charts_always_match() {
        assert!(charts_match(&[candle(1)], &[]));
        assert!(charts_match(&[], &[candle(1)]));
    }

    #[test]
    fn snapshot_round_trips_as_json() {
        let state = FinalState {
            base_url: "http://localhost:5000/".to_string(),
            bank_id: "tb-1".to_string(),
            name: "casey".to_string(),
            password: "pw".to_string(),
            orders: Vec::new(),
            info: InfoResponse::default(),
        };
        let dir = std::env::temp_dir().join("tradebench-state-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("state.json");
        state.write(&path).unwrap();
        let back = FinalState::load(&path).unwrap();
        assert_eq!(back.bank_id, state.bank_id);
        assert_eq!(back.orders, state.orders);
        std::fs::remove_file(&path).ok();
    }
}
