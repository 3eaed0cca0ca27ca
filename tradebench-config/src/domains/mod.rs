//! Domain-specific configuration modules

pub mod benchmark;
pub mod client;
pub mod target;
