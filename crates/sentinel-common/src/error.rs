//! Error types for Sentinel.

use thiserror::Error;

/// Top-level error type for Sentinel operations.
#[derive(Debug, Error)]
pub enum SentinelError {
    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration and archetype-table errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A tunable failed validation
    #[error("invalid value for `{field}`: {reason}")]
    Invalid {
        /// Offending field, qualified with the archetype when relevant
        field: String,
        /// Why the value was rejected
        reason: String,
    },

    /// Failed to parse a configuration or manifest document
    #[error("failed to parse {format}: {message}")]
    Parse {
        /// Document format ("toml", "ron")
        format: &'static str,
        /// Parser message
        message: String,
    },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::Invalid`].
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for Sentinel operations.
pub type SentinelResult<T> = Result<T, SentinelError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
