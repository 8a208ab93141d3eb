//! # Aqar DB
//!
//! Postgres connection pool and embedded schema migrations.
//!
//! # Example
//!
//! ```ignore
//! use aqar_db::{init_db_pool, run_migrations};
//!
//! let pool = init_db_pool(&server_config.database_url).await?;
//! run_migrations(&pool).await?;
//! ```

use std::time::Duration;

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, instrument};

pub use sqlx::PgPool;

/// Upper bound on pooled connections per process.
pub const MAX_CONNECTIONS: u32 = 10;

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

fn pool_options() -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(Duration::from_secs(5))
}

/// Connects to Postgres and returns a shared pool.
///
/// # Errors
///
/// Fails when the URL is invalid or the first connection cannot be made.
#[instrument(skip(database_url))]
pub async fn init_db_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = pool_options().connect(database_url).await?;
    info!(max_connections = MAX_CONNECTIONS, "database pool ready");
    Ok(pool)
}

/// Builds a pool that connects on first use.
///
/// Used where a pool must exist but may never be queried, such as routers
/// assembled in tests.
///
/// # Errors
///
/// Fails only when the URL cannot be parsed.
pub fn lazy_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    pool_options().connect_lazy(database_url)
}

/// Applies every pending migration in `migrations/`.
///
/// # Errors
///
/// Returns the migrator error when a migration fails or the applied history
/// no longer matches the files on disk.
#[instrument(skip(pool))]
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await?;
    info!(count = MIGRATOR.iter().count(), "migrations applied");
    Ok(())
}
