use axum::http::{HeaderValue, Method, header};
use axum::{Router, extract::DefaultBodyLimit, middleware};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};

use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::metrics::metrics_middleware;
use crate::middleware::auth::require_auth;
use crate::middleware::errors::{expose_error_trace, handle_panic, route_not_found};
use crate::middleware::rate_limit::rate_limit;
use crate::modules::auth::router::init_auth_router;
use crate::modules::health::router::init_health_router;
use crate::modules::messaging::router::init_messaging_router;
use crate::modules::properties::router::init_properties_router;
use crate::modules::users::router::init_users_router;
use crate::state::AppState;

/// Largest request body accepted, uploads included.
pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

pub fn init_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(init_health_router())
        .nest("/auth", init_auth_router())
        .nest(
            "/users",
            init_users_router()
                .route_layer(middleware::from_fn_with_state(state.clone(), require_auth)),
        )
        .nest("/properties", init_properties_router(state.clone()))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    Router::new()
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .nest("/api", api)
        .merge(init_messaging_router())
        .nest_service("/uploads", ServeDir::new(&state.upload_dir))
        .fallback(route_not_found)
        .with_state(state.clone())
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            expose_error_trace,
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(cors_layer(&state))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = state
        .cors_config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}
