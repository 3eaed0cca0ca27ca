//! Shared types for the tradebench workspace
//!
//! The wire model of the exchange under test and the failure taxonomy used
//! by every layer of the benchmarker.

pub mod error;
pub mod signal;
pub mod types;

pub use error::BenchError;
pub use signal::RunSignal;
pub use types::{
    CandlestickData, InfoResponse, Order, OrderActionResponse, Trade, TradeKind, User,
};
