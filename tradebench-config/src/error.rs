//! Configuration error types

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Error type for configuration loading and validation
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {domain}.{field}: {reason}")]
    InvalidValue {
        domain: &'static str,
        field: &'static str,
        reason: String,
    },

    #[error("missing required value for {domain}.{field}")]
    MissingValue {
        domain: &'static str,
        field: &'static str,
    },

    #[error("invalid URL in {domain}.{field}: {source}")]
    InvalidUrl {
        domain: &'static str,
        field: &'static str,
        #[source]
        source: url::ParseError,
    },
}
