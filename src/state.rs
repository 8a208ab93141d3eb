use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use governor::DefaultKeyedRateLimiter;
use sqlx::PgPool;

use aqar_auth::TokenCodec;
use aqar_config::{
    CorsConfig, Environment, JwtConfig, RateLimitConfig, ServerConfig, UploadConfig,
};
use aqar_core::file_storage::{FileStorage, LocalFileStorage, UploadLimits};

use crate::modules::messaging::hub::RoomHub;
use crate::modules::users::identity::IdentityResolver;
use crate::modules::users::repository::{PgUserRepository, UserRepository};

/// Every configuration value the server reads at startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub jwt: JwtConfig,
    pub environment: Environment,
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub rate_limit: RateLimitConfig,
    pub upload: UploadConfig,
}

impl AppConfig {
    /// # Errors
    ///
    /// Fails when a required variable is missing or malformed.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            jwt: JwtConfig::from_env().context("invalid JWT configuration")?,
            environment: Environment::from_env(),
            server: ServerConfig::from_env().context("invalid server configuration")?,
            cors: CorsConfig::from_env(),
            rate_limit: RateLimitConfig::from_env(),
            upload: UploadConfig::from_env(),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub tokens: Arc<TokenCodec>,
    pub users: Arc<dyn UserRepository>,
    pub identity: IdentityResolver,
    pub environment: Environment,
    pub cors_config: CorsConfig,
    pub rate_limiter: Arc<DefaultKeyedRateLimiter<IpAddr>>,
    pub trust_proxy: bool,
    pub upload_limits: UploadLimits,
    pub upload_dir: PathBuf,
    pub storage: Arc<dyn FileStorage>,
    pub rooms: RoomHub,
}

impl AppState {
    /// Assembles state around an existing pool and user store.
    pub fn new(config: &AppConfig, db: PgPool, users: Arc<dyn UserRepository>) -> Self {
        let storage = LocalFileStorage::new(config.upload.dir.clone(), config.upload.base_url.clone());

        Self {
            db,
            tokens: Arc::new(TokenCodec::new(&config.jwt)),
            identity: IdentityResolver::new(Arc::clone(&users)),
            users,
            environment: config.environment,
            cors_config: config.cors.clone(),
            rate_limiter: Arc::new(config.rate_limit.build_limiter()),
            trust_proxy: config.rate_limit.trust_proxy,
            upload_limits: UploadLimits::new(config.upload.max_file_size, config.upload.max_files),
            upload_dir: config.upload.dir.clone(),
            storage: Arc::new(storage),
            rooms: RoomHub::new(),
        }
    }
}

/// Connects to Postgres and builds the production state.
///
/// # Errors
///
/// Fails when the database is unreachable.
pub async fn init_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let db = aqar_db::init_db_pool(&config.server.database_url)
        .await
        .context("failed to connect to database")?;
    let users: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(db.clone()));

    Ok(AppState::new(config, db, users))
}
