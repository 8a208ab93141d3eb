//! Rate limiting configuration for API endpoints.
//!
//! Each client IP gets a quota of `max_requests` per `window`. The limiter
//! is a GCRA bucket from the `governor` crate: the bucket holds up to
//! `max_requests` cells and one cell is replenished every
//! `window / max_requests`.
//!
//! # Environment Variables
//!
//! - `RATE_LIMIT_WINDOW_SECS`: Length of the window in seconds (default: 900)
//! - `RATE_LIMIT_MAX_REQUESTS`: Requests allowed per window (default: 100)
//! - `TRUST_PROXY`: Key on the first `x-forwarded-for` hop instead of the
//!   peer address (default: false). Enable only behind a proxy that
//!   overwrites the header.
//!
//! # Example
//!
//! ```ignore
//! use aqar_config::RateLimitConfig;
//!
//! let limiter = RateLimitConfig::from_env().build_limiter();
//! if limiter.check_key(&client_ip).is_err() {
//!     // reject with 429
//! }
//! ```

use std::net::IpAddr;
use std::num::NonZeroU32;
use std::time::Duration;

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

/// Per-IP request quota.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Length of the accounting window.
    pub window: Duration,

    /// Requests a single IP may make within one window.
    pub max_requests: u32,

    /// Whether `x-forwarded-for` identifies the client.
    pub trust_proxy: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(15 * 60),
            max_requests: 100,
            trust_proxy: false,
        }
    }
}

impl RateLimitConfig {
    /// Creates a new `RateLimitConfig` from environment variables.
    ///
    /// Falls back to default values if environment variables are not set
    /// or cannot be parsed.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(crate::env_lookup)
    }

    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            window: lookup("RATE_LIMIT_WINDOW_SECS")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.window),
            max_requests: lookup("RATE_LIMIT_MAX_REQUESTS")
                .and_then(|v| v.trim().parse::<u32>().ok())
                .filter(|max| *max > 0)
                .unwrap_or(defaults.max_requests),
            trust_proxy: lookup("TRUST_PROXY")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.trust_proxy),
        }
    }

    /// The governor quota equivalent to this config.
    #[must_use]
    pub fn quota(&self) -> Quota {
        let burst = NonZeroU32::new(self.max_requests).unwrap_or(NonZeroU32::MIN);
        let replenish = self.window / burst.get();
        Quota::with_period(replenish.max(Duration::from_nanos(1)))
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst)
    }

    /// Builds a limiter keyed by client IP address.
    #[must_use]
    pub fn build_limiter(&self) -> DefaultKeyedRateLimiter<IpAddr> {
        RateLimiter::keyed(self.quota())
    }
}
