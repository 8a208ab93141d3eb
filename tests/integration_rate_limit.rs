mod common;

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};

use aqar::aqar_config::RateLimitConfig;
use common::{TestApp, from_peer, test_config};

fn health_from(peer: &str) -> Request<Body> {
    from_peer(
        Request::get("/api/health").body(Body::empty()).unwrap(),
        peer,
    )
}

fn health_via(peer: &str, forwarded_for: &str) -> Request<Body> {
    from_peer(
        Request::get("/api/health")
            .header("x-forwarded-for", forwarded_for)
            .body(Body::empty())
            .unwrap(),
        peer,
    )
}

fn strict_app(trust_proxy: bool) -> TestApp {
    let mut config = test_config();
    config.rate_limit = RateLimitConfig {
        window: Duration::from_secs(3600),
        max_requests: 2,
        trust_proxy,
    };
    TestApp::with_config(config)
}

#[tokio::test]
async fn test_rate_limit_exceeded() {
    let app = strict_app(false);

    assert_eq!(app.send(health_from("203.0.113.10:4000")).await.status, StatusCode::OK);
    assert_eq!(app.send(health_from("203.0.113.10:4001")).await.status, StatusCode::OK);

    let res = app.send(health_from("203.0.113.10:4002")).await;
    res.assert_error(
        StatusCode::TOO_MANY_REQUESTS,
        "Too many requests, please try again later",
        "طلبات كثيرة جداً، يرجى المحاولة لاحقاً",
    );
}

#[tokio::test]
async fn test_rate_limit_is_per_client() {
    let app = strict_app(false);

    for _ in 0..2 {
        app.send(health_from("203.0.113.20:4000")).await;
    }
    assert_eq!(
        app.send(health_from("203.0.113.20:4000")).await.status,
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(app.send(health_from("203.0.113.21:4000")).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_forwarded_for_ignored_without_trusted_proxy() {
    let app = strict_app(false);

    let mut succeeded = 0;
    for hop in 1..=20 {
        let res = app
            .send(health_via("203.0.113.40:4000", &format!("198.51.100.{hop}")))
            .await;
        if res.status == StatusCode::OK {
            succeeded += 1;
        }
    }
    assert_eq!(succeeded, 2);
}

#[tokio::test]
async fn test_trusted_proxy_limits_per_forwarded_client() {
    let app = strict_app(true);

    for _ in 0..2 {
        let res = app.send(health_via("10.0.0.1:4000", "198.51.100.7")).await;
        assert_eq!(res.status, StatusCode::OK);
    }
    assert_eq!(
        app.send(health_via("10.0.0.1:4000", "198.51.100.7")).await.status,
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(
        app.send(health_via("10.0.0.1:4000", "198.51.100.8")).await.status,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_unmatched_routes_are_not_counted() {
    let app = strict_app(false);

    for _ in 0..3 {
        let req = from_peer(
            Request::get("/nowhere").body(Body::empty()).unwrap(),
            "203.0.113.30:4000",
        );
        assert_eq!(app.send(req).await.status, StatusCode::NOT_FOUND);
    }
    assert_eq!(app.send(health_from("203.0.113.30:4000")).await.status, StatusCode::OK);
}
