//! Domain-driven configuration for tradebench
//!
//! Configuration is split by functional domain (target endpoints, the HTTP
//! client, benchmark policy), each with serde support, defaults, and
//! validation.

pub mod domains;
pub mod error;
pub mod validation;

pub use domains::benchmark::{BenchmarkConfig, PopulationConfig, ScoreValues};
pub use domains::client::ClientConfig;
pub use domains::target::TargetConfig;
pub use error::{ConfigError, ConfigResult};
pub use validation::Validatable;

use serde::{Deserialize, Serialize};

/// Top-level configuration for a benchmark run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    pub target: TargetConfig,
    pub client: ClientConfig,
    pub benchmark: BenchmarkConfig,
}

impl Validatable for BenchConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.target.validate()?;
        self.client.validate()?;
        self.benchmark.validate()?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "bench"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = BenchConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = BenchConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: BenchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.benchmark.duration, config.benchmark.duration);
        assert_eq!(back.client.retire_after, config.client.retire_after);
    }
}
