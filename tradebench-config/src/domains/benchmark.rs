//! Benchmark policy configuration
//!
//! Timing, population growth, scoring weights and the error budget. The
//! defaults are the canonical constants of the benchmark; operators only
//! override them for local experiments.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};
use crate::validation::{validate_positive, Validatable};

/// Benchmark run policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Total load-generation time
    #[serde(with = "humantime_serde")]
    pub duration: Duration,

    /// Interval of the manager's orchestration tick
    #[serde(with = "humantime_serde")]
    pub tick_interval: Duration,

    /// Interval between a scenario's info polls
    #[serde(with = "humantime_serde")]
    pub polling_interval: Duration,

    /// Interval between a scenario's order actions
    #[serde(with = "humantime_serde")]
    pub order_interval: Duration,

    /// Interval between brute-force sign-in attempts
    #[serde(with = "humantime_serde")]
    pub brute_force_delay: Duration,

    pub population: PopulationConfig,
    pub scores: ScoreValues,

    /// Errors tolerated regardless of score
    pub allow_error_min: i64,

    /// Errors never tolerated beyond, regardless of score
    pub allow_error_max: i64,

    /// Score divisor feeding the dynamic error limit
    pub error_limit_divisor: i64,
}

/// Scenario population policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Scenarios seeded at benchmark start
    pub seed: usize,

    /// Scenarios added on each natural level-up
    pub add_on_natural: usize,

    /// Scenarios added when a result is shared externally
    pub add_on_share: usize,
}

/// Points awarded per successful operation category
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreValues {
    pub get_top: i64,
    pub signup: i64,
    pub signin: i64,
    pub get_info: i64,
    pub post_orders: i64,
    pub get_orders: i64,
    pub delete_orders: i64,
    pub trade_success: i64,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(60),
            tick_interval: Duration::from_millis(20),
            polling_interval: Duration::from_millis(1000),
            order_interval: Duration::from_millis(1500),
            brute_force_delay: Duration::from_millis(500),
            population: PopulationConfig::default(),
            scores: ScoreValues::default(),
            allow_error_min: 20,
            allow_error_max: 50,
            error_limit_divisor: 500,
        }
    }
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            seed: 10,
            add_on_natural: 2,
            add_on_share: 3,
        }
    }
}

impl Default for ScoreValues {
    fn default() -> Self {
        Self {
            get_top: 1,
            signup: 3,
            signin: 3,
            get_info: 1,
            post_orders: 5,
            get_orders: 1,
            delete_orders: 5,
            trade_success: 10,
        }
    }
}

impl BenchmarkConfig {
    /// Dynamic error limit for the given score: `clamp(score/divisor, min, max)`
    pub fn error_limit(&self, score: i64) -> i64 {
        (score / self.error_limit_divisor).clamp(self.allow_error_min, self.allow_error_max)
    }

    /// Demerit subtracted per recorded error, bounding total loss at 50%
    pub fn error_demerit(&self, score: i64) -> i64 {
        score / (self.allow_error_max * 2)
    }
}

impl Validatable for BenchmarkConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.duration.as_millis() as u64, "duration", self.domain_name())?;
        validate_positive(
            self.tick_interval.as_millis() as u64,
            "tick_interval",
            self.domain_name(),
        )?;
        validate_positive(self.population.seed as u64, "population.seed", self.domain_name())?;
        validate_positive(self.error_limit_divisor as u64, "error_limit_divisor", self.domain_name())?;
        if self.allow_error_min > self.allow_error_max {
            return Err(ConfigError::InvalidValue {
                domain: self.domain_name(),
                field: "allow_error_min",
                reason: "must not exceed allow_error_max".to_string(),
            });
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "benchmark"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_limit_clamps_both_ends() {
        let config = BenchmarkConfig::default();
        // Zero score sits on the lower clamp.
        assert_eq!(config.error_limit(0), 20);
        // A huge score sits on the upper clamp.
        assert_eq!(config.error_limit(100_000), 50);
        // 5000/500 = 10, clamped up to the minimum.
        assert_eq!(config.error_limit(5_000), 20);
        // In-range values pass through.
        assert_eq!(config.error_limit(15_000), 30);
    }

    #[test]
    fn demerit_caps_loss_at_half() {
        let config = BenchmarkConfig::default();
        let score = 10_000;
        let demerit = config.error_demerit(score);
        // Hitting the max error count costs exactly half the score.
        assert_eq!(score - demerit * config.allow_error_max, score / 2);
    }

    #[test]
    fn min_must_not_exceed_max() {
        let config = BenchmarkConfig {
            allow_error_min: 60,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
