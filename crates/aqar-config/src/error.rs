use thiserror::Error;

/// Errors raised while loading configuration at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("{0} must be set")]
    Missing(&'static str),

    /// A variable is set but cannot be interpreted.
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
