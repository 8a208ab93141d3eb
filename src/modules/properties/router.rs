use axum::{
    Router, middleware,
    routing::{get, post},
};

use super::controller::{
    create_property, delete_property, get_property, list_properties, upload_images,
};
use crate::middleware::auth::{optional_auth, require_auth};
use crate::middleware::guards::{require_landlord, require_verified_email};
use crate::state::AppState;

/// Listing reads run [`optional_auth`]; writes are landlord-only.
///
/// Creation is guarded by middleware (outermost first: authentication,
/// landlord role, verified email). Delete and upload check through the
/// [`RequireLandlord`](crate::middleware::guards::RequireLandlord) extractor.
pub fn init_properties_router(state: AppState) -> Router<AppState> {
    let create = post(create_property)
        .route_layer(middleware::from_fn(require_verified_email))
        .route_layer(middleware::from_fn(require_landlord))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));
    let list = get(list_properties)
        .route_layer(middleware::from_fn_with_state(state.clone(), optional_auth));
    let show = get(get_property).route_layer(middleware::from_fn_with_state(state, optional_auth));

    Router::new()
        .route("/", list.merge(create))
        .route("/{id}", show.delete(delete_property))
        .route("/{id}/images", post(upload_images))
}
