//! Target endpoint configuration
//!
//! The exchange application under test plus the two back-office
//! collaborators it is wired to at `/initialize` time. The bank and log
//! services are reachable on two addresses: the one handed to the target
//! (what the target calls) and the one the benchmarker itself uses.

use serde::{Deserialize, Serialize};

use crate::error::ConfigResult;
use crate::validation::{validate_url, Validatable};

/// Endpoints of the application under test and its collaborators
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Base URL of the exchange web application
    pub app_url: String,

    /// Bank endpoint passed to the target on `/initialize`
    pub bank_url: String,

    /// Log endpoint passed to the target on `/initialize`
    pub log_url: String,

    /// Bank endpoint the benchmarker itself talks to
    pub internal_bank_url: String,

    /// Log endpoint the benchmarker itself talks to
    pub internal_log_url: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            app_url: "http://localhost:5000".to_string(),
            bank_url: "http://localhost:5515".to_string(),
            log_url: "http://localhost:5516".to_string(),
            internal_bank_url: "http://localhost:5515".to_string(),
            internal_log_url: "http://localhost:5516".to_string(),
        }
    }
}

impl Validatable for TargetConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_url(&self.app_url, "app_url", self.domain_name())?;
        validate_url(&self.bank_url, "bank_url", self.domain_name())?;
        validate_url(&self.log_url, "log_url", self.domain_name())?;
        validate_url(&self.internal_bank_url, "internal_bank_url", self.domain_name())?;
        validate_url(&self.internal_log_url, "internal_log_url", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "target"
    }
}
