//! Per-client-IP request throttling.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use governor::DefaultKeyedRateLimiter;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use aqar_core::ApiError;

use crate::metrics::track_rate_limited;
use crate::state::AppState;

/// How often idle client entries are dropped from the limiter.
pub const LIMITER_UPKEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Client address used as the rate-limit key.
///
/// The peer address, unless `trust_proxy` is set and the first
/// `x-forwarded-for` hop parses. Requests with neither share the
/// unspecified address.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> IpAddr {
    let forwarded = trust_proxy
        .then(|| {
            headers
                .get("x-forwarded-for")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.split(',').next())
                .and_then(|first| first.trim().parse().ok())
        })
        .flatten();

    forwarded
        .or_else(|| peer.map(|addr| addr.ip()))
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

pub async fn rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let ip = client_ip(req.headers(), peer, state.trust_proxy);

    if state.rate_limiter.check_key(&ip).is_err() {
        warn!(%ip, path = %req.uri().path(), "rate limit exceeded");
        track_rate_limited();
        return Err(ApiError::RateLimited);
    }

    Ok(next.run(req).await)
}

/// Periodically forgets clients whose quota has fully replenished.
pub fn spawn_limiter_upkeep(
    limiter: Arc<DefaultKeyedRateLimiter<IpAddr>>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            limiter.retain_recent();
            limiter.shrink_to_fit();
            debug!(tracked_clients = limiter.len(), "rate limiter upkeep");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aqar_config::RateLimitConfig;
    use axum::http::HeaderValue;

    fn forwarded(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_peer_address_is_the_key() {
        let peer: SocketAddr = "198.51.100.2:5555".parse().unwrap();
        let headers = forwarded("203.0.113.7");
        assert_eq!(client_ip(&headers, Some(peer), false), peer.ip());
    }

    #[test]
    fn test_trusted_proxy_uses_first_hop() {
        let peer: SocketAddr = "10.0.0.1:4000".parse().unwrap();
        let headers = forwarded("203.0.113.7, 10.0.0.1");
        assert_eq!(
            client_ip(&headers, Some(peer), true),
            "203.0.113.7".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_trusted_proxy_falls_back_to_peer() {
        let peer: SocketAddr = "198.51.100.2:5555".parse().unwrap();
        assert_eq!(client_ip(&forwarded("garbage"), Some(peer), true), peer.ip());
    }

    #[test]
    fn test_unknown_client() {
        assert_eq!(
            client_ip(&HeaderMap::new(), None, false),
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        );
    }

    #[tokio::test]
    async fn test_upkeep_drops_replenished_clients() {
        let config = RateLimitConfig {
            window: Duration::from_millis(10),
            max_requests: 1,
            trust_proxy: false,
        };
        let limiter = Arc::new(config.build_limiter());
        for last_octet in 1..=5 {
            let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, last_octet));
            assert!(limiter.check_key(&ip).is_ok());
        }
        assert_eq!(limiter.len(), 5);

        let upkeep = spawn_limiter_upkeep(Arc::clone(&limiter), Duration::from_millis(20));
        let mut remaining = limiter.len();
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            remaining = limiter.len();
            if remaining == 0 {
                break;
            }
        }
        upkeep.abort();
        assert_eq!(remaining, 0);
    }
}
