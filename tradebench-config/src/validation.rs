//! Validation helpers shared by the configuration domains

use crate::error::{ConfigError, ConfigResult};

/// Trait implemented by every configuration domain
pub trait Validatable {
    /// Validate the configuration, returning the first violation found
    fn validate(&self) -> ConfigResult<()>;

    /// Name of the domain, used in error messages
    fn domain_name(&self) -> &'static str;
}

/// Validate that a numeric value is strictly positive
pub fn validate_positive(value: u64, field: &'static str, domain: &'static str) -> ConfigResult<()> {
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            domain,
            field,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}

/// Validate that a string is non-empty
pub fn validate_required_string(
    value: &str,
    field: &'static str,
    domain: &'static str,
) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingValue { domain, field });
    }
    Ok(())
}

/// Validate that a string parses as an absolute URL
pub fn validate_url(value: &str, field: &'static str, domain: &'static str) -> ConfigResult<()> {
    validate_required_string(value, field, domain)?;
    url::Url::parse(value).map_err(|source| ConfigError::InvalidUrl {
        domain,
        field,
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_rejects_zero() {
        assert!(validate_positive(0, "timeout", "client").is_err());
        assert!(validate_positive(1, "timeout", "client").is_ok());
    }

    #[test]
    fn url_rejects_relative_paths() {
        assert!(validate_url("/info", "app_url", "target").is_err());
        assert!(validate_url("http://localhost:5000", "app_url", "target").is_ok());
    }
}
