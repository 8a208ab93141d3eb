use std::net::SocketAddr;

use dotenvy::dotenv;
use tracing::{error, info, warn};

use aqar::logging::init_tracing;
use aqar::metrics::{init_metrics, metrics_app};
use aqar::middleware::rate_limit::{LIMITER_UPKEEP_INTERVAL, spawn_limiter_upkeep};
use aqar::router::init_router;
use aqar::state::{AppConfig, init_app_state};

#[tokio::main]
async fn main() {
    dotenv().ok();

    if let Err(err) = init_tracing() {
        eprintln!("⚠️  Failed to initialize tracing: {err}");
    }

    if let Err(err) = run().await {
        error!(error = ?err, "server exited with error");
        eprintln!("❌ {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    let state = init_app_state(&config).await?;
    spawn_limiter_upkeep(state.rate_limiter.clone(), LIMITER_UPKEEP_INTERVAL);

    let mut app = init_router(state);
    match init_metrics() {
        Ok(Some(handle)) => app = app.merge(metrics_app(handle)),
        Ok(None) => info!("Observability disabled, /metrics not mounted"),
        Err(err) => warn!(error = %err, "Failed to install metrics recorder"),
    }

    let address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(%address, environment = config.environment.as_str(), "Aqar API listening");
    println!("🚀 Server running on http://localhost:{}", config.server.port);
    println!("📖 Scalar UI available at http://localhost:{}/scalar", config.server.port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
