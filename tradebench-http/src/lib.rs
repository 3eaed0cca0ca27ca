//! Resilient HTTP client for the exchange under test
//!
//! Each simulated user owns one [`Client`]: a cookie-backed session with
//! automatic retry on server errors, a conditional-request cache, per-category
//! latency accounting, and a permanent retirement timeout.

pub mod cache;
pub mod client;
pub mod statics;
pub mod stats;

pub use cache::{CacheStore, CachedEntry};
pub use client::{Client, Credentials};
pub use statics::{default_assets, hash_bytes, StaticAsset};
pub use stats::{ElapsedSnapshot, ElapsedStats, RequestCategory};
