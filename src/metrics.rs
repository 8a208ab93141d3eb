use std::sync::OnceLock;
use std::time::{Duration, Instant};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
    routing::get,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

use crate::middleware::auth::FailurePolicy;

static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();

/// Check if observability is enabled via OBSERVABILITY_ENABLED env var
pub fn is_observability_enabled() -> bool {
    *OBSERVABILITY_ENABLED.get_or_init(|| {
        std::env::var("OBSERVABILITY_ENABLED")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true)
    })
}

/// Installs the Prometheus recorder and its upkeep task.
///
/// Returns `Ok(None)` when observability is disabled.
pub fn init_metrics() -> Result<Option<PrometheusHandle>, BuildError> {
    if !is_observability_enabled() {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[
                0.001, 0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5,
                10.0,
            ],
        )?
        .install_recorder()?;

    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep_handle.run_upkeep();
        }
    });

    Ok(Some(handle))
}

/// Metrics middleware to track HTTP requests
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    gauge!("http_requests_active").increment(1.0);

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!("http_requests_total", "method" => method.clone(), "path" => path.clone(), "status" => status).increment(1);
    histogram!("http_request_duration_seconds", "method" => method, "path" => path).record(latency);

    gauge!("http_requests_active").decrement(1.0);

    response
}

/// Router exposing the Prometheus scrape endpoint.
pub fn metrics_app<S>(handle: PrometheusHandle) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

pub fn track_auth_failure(kind: &'static str, policy: FailurePolicy) {
    if !is_observability_enabled() {
        return;
    }
    let mode = match policy {
        FailurePolicy::Propagate => "required",
        FailurePolicy::Absorb => "optional",
    };
    counter!("auth_failures_total", "kind" => kind, "mode" => mode).increment(1);
}

pub fn track_tokens_issued(reason: &'static str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("jwt_tokens_issued_total", "reason" => reason).increment(1);
}

pub fn track_user_registered(user_type: &'static str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("users_registered_total", "user_type" => user_type).increment(1);
}

pub fn track_login_failure(reason: &'static str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("user_logins_total", "status" => "failure", "reason" => reason).increment(1);
}

pub fn track_rate_limited() {
    if !is_observability_enabled() {
        return;
    }
    counter!("rate_limited_requests_total").increment(1);
}

pub fn track_images_uploaded(count: usize) {
    if !is_observability_enabled() {
        return;
    }
    counter!("property_images_uploaded_total").increment(count as u64);
}

pub fn track_socket_open(open: bool) {
    if !is_observability_enabled() {
        return;
    }
    if open {
        gauge!("socket_connections_active").increment(1.0);
    } else {
        gauge!("socket_connections_active").decrement(1.0);
    }
}

pub fn track_message_relayed(receivers: usize) {
    if !is_observability_enabled() {
        return;
    }
    let delivered = if receivers > 0 { "true" } else { "false" };
    counter!("socket_messages_relayed_total", "delivered" => delivered).increment(1);
}
