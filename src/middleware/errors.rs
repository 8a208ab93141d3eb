//! Response-level error handling shared by every route.
//!
//! [`ApiError`] bodies never include the diagnostic `stack`; the full
//! [`ErrorEnvelope`] rides along in the response extensions.
//! [`expose_error_trace`] rewrites the body with it in development.

use std::any::Any;

use axum::{
    Json,
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};

use aqar_core::{ApiError, ErrorEnvelope};

use crate::state::AppState;

/// Re-renders error bodies with their trace when the environment allows it.
pub async fn expose_error_trace(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let response = next.run(req).await;

    if !state.environment.exposes_error_traces() {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let Some(envelope) = parts.extensions.remove::<ErrorEnvelope>() else {
        return Response::from_parts(parts, body);
    };

    let (rendered_parts, rendered_body) = Json(envelope).into_response().into_parts();

    parts.headers.remove(header::CONTENT_LENGTH);
    if let Some(content_type) = rendered_parts.headers.get(header::CONTENT_TYPE) {
        parts
            .headers
            .insert(header::CONTENT_TYPE, content_type.clone());
    }
    Response::from_parts(parts, rendered_body)
}

/// Turns a handler panic into an unclassified 500.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };

    ApiError::internal(anyhow::anyhow!("handler panicked: {detail}")).into_response()
}

/// Router fallback for unmatched paths.
pub async fn route_not_found() -> ApiError {
    ApiError::RouteNotFound
}
