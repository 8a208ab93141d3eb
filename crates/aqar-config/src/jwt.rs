//! JWT signing configuration.
//!
//! # Environment Variables
//!
//! - `JWT_SECRET`: HMAC signing secret (required)
//! - `JWT_EXPIRE`: access token lifetime as a duration string (default `"7d"`)
//!
//! Refresh tokens always live for 30 days.

use std::fmt;
use std::time::Duration;

use crate::duration::parse_duration;
use crate::error::ConfigError;

/// Lifetime applied to access tokens when `JWT_EXPIRE` is unset.
pub const DEFAULT_ACCESS_EXPIRY: &str = "7d";

/// Fixed lifetime of refresh tokens.
pub const REFRESH_EXPIRY: &str = "30d";

/// Secret and token lifetimes used by the token codec.
///
/// The secret is read once at startup and shared by every token the process
/// issues or verifies; changing it invalidates all outstanding tokens.
#[derive(Clone, PartialEq, Eq)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expiry: Duration,
    pub refresh_token_expiry: Duration,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_token_expiry", &self.access_token_expiry)
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .finish()
    }
}

impl JwtConfig {
    /// Builds a config with the default lifetimes.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            access_token_expiry: Duration::from_secs(7 * 24 * 60 * 60),
            refresh_token_expiry: Duration::from_secs(30 * 24 * 60 * 60),
        }
    }

    /// Loads the config from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when `JWT_SECRET` is unset and
    /// [`ConfigError::Invalid`] when `JWT_EXPIRE` cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(crate::env_lookup)
    }

    /// Loads the config through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`JwtConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let raw_expiry = lookup("JWT_EXPIRE").unwrap_or_else(|| DEFAULT_ACCESS_EXPIRY.to_string());
        let access_token_expiry = parse_expiry("JWT_EXPIRE", &raw_expiry)?;
        let refresh_token_expiry = parse_expiry("JWT_REFRESH_EXPIRE", REFRESH_EXPIRY)?;

        Ok(Self {
            secret,
            access_token_expiry,
            refresh_token_expiry,
        })
    }
}

fn parse_expiry(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let duration = parse_duration(raw).ok_or_else(|| ConfigError::Invalid {
        key,
        reason: format!("'{raw}' is not a duration"),
    })?;

    if duration.as_secs() == 0 {
        return Err(ConfigError::Invalid {
            key,
            reason: "token lifetime must be at least one second".to_string(),
        });
    }

    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = JwtConfig::from_lookup(lookup_from(&[("JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.secret, "s3cret");
        assert_eq!(config.access_token_expiry, Duration::from_secs(604_800));
        assert_eq!(config.refresh_token_expiry, Duration::from_secs(2_592_000));
        assert_eq!(config, JwtConfig::new("s3cret"));
    }

    #[test]
    fn test_custom_access_expiry() {
        let config = JwtConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("JWT_EXPIRE", "12h"),
        ]))
        .unwrap();
        assert_eq!(config.access_token_expiry, Duration::from_secs(43_200));
        assert_eq!(config.refresh_token_expiry, Duration::from_secs(2_592_000));
    }

    #[test]
    fn test_missing_secret() {
        let result = JwtConfig::from_lookup(lookup_from(&[]));
        assert_eq!(result, Err(ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn test_invalid_expiry() {
        let result = JwtConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("JWT_EXPIRE", "forever"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { key: "JWT_EXPIRE", .. })
        ));
    }

    #[test]
    fn test_sub_second_expiry_rejected() {
        let result = JwtConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("JWT_EXPIRE", "500"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", JwtConfig::new("do-not-print"));
        assert!(!debug.contains("do-not-print"));
        assert!(debug.contains("<redacted>"));
    }
}
