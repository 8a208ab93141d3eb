//! # Aqar Config
//!
//! Configuration types for the Aqar API.
//!
//! Every structure is loaded from environment variables through `from_env()`,
//! which delegates to a `from_lookup()` constructor so tests can feed values
//! without touching the process environment:
//!
//! - [`jwt`]: signing secret and token lifetimes
//! - [`environment`]: development/production mode
//! - [`server`]: listen port and database URL
//! - [`cors`]: allowed client origin
//! - [`rate_limit`]: per-IP request quota
//! - [`upload`]: listing image upload limits and storage location
//!
//! # Example
//!
//! ```ignore
//! use aqar_config::{Environment, JwtConfig, RateLimitConfig};
//!
//! let jwt_config = JwtConfig::from_env()?;
//! let environment = Environment::from_env();
//! let rate_limit = RateLimitConfig::from_env();
//! ```

pub mod cors;
pub mod duration;
pub mod environment;
pub mod error;
pub mod jwt;
pub mod rate_limit;
pub mod server;
pub mod upload;

// Re-export commonly used types at crate root
pub use cors::CorsConfig;
pub use duration::parse_duration;
pub use environment::Environment;
pub use error::ConfigError;
pub use jwt::JwtConfig;
pub use rate_limit::RateLimitConfig;
pub use server::ServerConfig;
pub use upload::UploadConfig;

/// Reads a variable from the process environment.
///
/// Empty values are treated as unset.
pub(crate) fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
