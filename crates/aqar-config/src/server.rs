//! Listener and database settings.
//!
//! - `PORT`: TCP port to bind on all interfaces (default: 5000)
//! - `DATABASE_URL`: PostgreSQL connection string (required)

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 5000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub database_url: String,
}

impl ServerConfig {
    /// # Errors
    ///
    /// Fails when `DATABASE_URL` is missing or `PORT` is not a valid port.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(crate::env_lookup)
    }

    /// # Errors
    ///
    /// See [`ServerConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                reason: format!("'{raw}' is not a port number"),
            })?,
            None => DEFAULT_PORT,
        };

        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        Ok(Self { port, database_url })
    }

    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_port() {
        let config = ServerConfig::from_lookup(|key| {
            (key == "DATABASE_URL").then(|| "postgres://localhost/aqar".to_string())
        })
        .unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
    }

    #[test]
    fn test_invalid_port() {
        let result = ServerConfig::from_lookup(|key| match key {
            "PORT" => Some("http".to_string()),
            "DATABASE_URL" => Some("postgres://localhost/aqar".to_string()),
            _ => None,
        });
        assert!(matches!(result, Err(ConfigError::Invalid { key: "PORT", .. })));
    }

    #[test]
    fn test_missing_database_url() {
        let result = ServerConfig::from_lookup(|_| None);
        assert_eq!(result, Err(ConfigError::Missing("DATABASE_URL")));
    }
}
