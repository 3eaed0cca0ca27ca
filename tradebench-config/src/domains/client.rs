//! HTTP client configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigResult;
use crate::validation::{validate_required_string, Validatable};

/// Knobs for the resilient per-user HTTP client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Timeout used for the one-shot `/initialize` call
    #[serde(with = "humantime_serde")]
    pub init_timeout: Duration,

    /// Cumulative elapsed time after which a client retires permanently
    #[serde(with = "humantime_serde")]
    pub retire_after: Duration,

    /// Fixed sleep between retries of a failed request
    #[serde(with = "humantime_serde")]
    pub retry_interval: Duration,

    /// User agent string sent on every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            init_timeout: Duration::from_secs(30),
            retire_after: Duration::from_secs(10),
            retry_interval: Duration::from_millis(500),
            user_agent: "tradebench/0.1.0".to_string(),
        }
    }
}

impl Validatable for ClientConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.user_agent, "user_agent", self.domain_name())?;
        if self.timeout.is_zero() || self.init_timeout.is_zero() || self.retire_after.is_zero() {
            return Err(crate::error::ConfigError::InvalidValue {
                domain: self.domain_name(),
                field: "timeout",
                reason: "timeouts must be non-zero".to_string(),
            });
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "client"
    }
}
