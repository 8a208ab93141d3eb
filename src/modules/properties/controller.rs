use axum::{
    Json,
    extract::{Multipart, Query, State},
    http::StatusCode,
};
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;

use aqar_core::{ApiError, PaginationParams};
use aqar_models::{
    CreatePropertyDto, PaginatedPropertiesResponse, Property, PropertyFilter, PropertyImage,
    PropertyListing,
};

use super::service::PropertyService;
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::middleware::guards::RequireLandlord;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::{PathId, ValidatedJson};

#[derive(Serialize, ToSchema)]
pub struct PropertyResponse {
    pub success: bool,
    pub data: Property,
}

#[derive(Serialize, ToSchema)]
pub struct ListingResponse {
    pub success: bool,
    pub data: PropertyListing,
}

#[derive(Serialize, ToSchema)]
pub struct ImagesResponse {
    pub success: bool,
    pub data: Vec<PropertyImage>,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// List properties
///
/// Listings carry `isOwner` when the request is authenticated.
#[utoipa::path(
    get,
    path = "/api/properties",
    params(PaginationParams, PropertyFilter),
    responses(
        (status = 200, description = "Paginated listings", body = PaginatedPropertiesResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        (),
        ("bearer_auth" = [])
    ),
    tag = "Properties"
)]
#[instrument(skip(state, viewer))]
pub async fn list_properties(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<PropertyFilter>,
) -> Result<Json<PaginatedPropertiesResponse>, ApiError> {
    let viewer_id = viewer.actor().map(|a| a.id);
    let response = PropertyService::list(&state.db, &pagination, &filter, viewer_id).await?;
    Ok(Json(response))
}

/// Get a property by ID
#[utoipa::path(
    get,
    path = "/api/properties/{id}",
    params(
        ("id" = Uuid, Path, description = "Property ID")
    ),
    responses(
        (status = 200, description = "Listing", body = ListingResponse),
        (status = 404, description = "Property not found", body = ErrorResponse)
    ),
    security(
        (),
        ("bearer_auth" = [])
    ),
    tag = "Properties"
)]
#[instrument(skip(state, viewer))]
pub async fn get_property(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    PathId(id): PathId,
) -> Result<Json<ListingResponse>, ApiError> {
    let viewer_id = viewer.actor().map(|a| a.id);
    let listing = PropertyService::get(&state.db, id, viewer_id).await?;
    Ok(Json(ListingResponse {
        success: true,
        data: listing,
    }))
}

/// Create a property listing
///
/// Requires a landlord account with a verified email.
#[utoipa::path(
    post,
    path = "/api/properties",
    request_body = CreatePropertyDto,
    responses(
        (status = 201, description = "Property created", body = PropertyResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorResponse),
        (status = 403, description = "Not a landlord or email not verified", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Properties"
)]
#[instrument(skip(state, auth_user, dto), fields(user_id = %auth_user.id))]
pub async fn create_property(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreatePropertyDto>,
) -> Result<(StatusCode, Json<PropertyResponse>), ApiError> {
    let property = PropertyService::create(&state.db, auth_user.id, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(PropertyResponse {
            success: true,
            data: property,
        }),
    ))
}

/// Delete one of your property listings
#[utoipa::path(
    delete,
    path = "/api/properties/{id}",
    params(
        ("id" = Uuid, Path, description = "Property ID")
    ),
    responses(
        (status = 200, description = "Property deleted", body = MessageResponse),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorResponse),
        (status = 403, description = "Not a landlord", body = ErrorResponse),
        (status = 404, description = "Property not found or not owned", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Properties"
)]
#[instrument(skip(state, landlord), fields(user_id = %landlord.id))]
pub async fn delete_property(
    State(state): State<AppState>,
    landlord: RequireLandlord,
    PathId(id): PathId,
) -> Result<Json<MessageResponse>, ApiError> {
    PropertyService::delete(&state.db, state.storage.as_ref(), landlord.id, id).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Property deleted successfully".to_string(),
    }))
}

/// Upload images for one of your property listings
///
/// Multipart body; every part with a file name is treated as an image.
#[utoipa::path(
    post,
    path = "/api/properties/{id}/images",
    params(
        ("id" = Uuid, Path, description = "Property ID")
    ),
    request_body(content_type = "multipart/form-data", description = "One or more image files"),
    responses(
        (status = 201, description = "Images stored", body = ImagesResponse),
        (status = 400, description = "Too many files, file too large or not an image", body = ErrorResponse),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorResponse),
        (status = 403, description = "Not a landlord", body = ErrorResponse),
        (status = 404, description = "Property not found or not owned", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Properties"
)]
#[instrument(skip(state, landlord, multipart), fields(user_id = %landlord.id))]
pub async fn upload_images(
    State(state): State<AppState>,
    landlord: RequireLandlord,
    PathId(id): PathId,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ImagesResponse>), ApiError> {
    let uploads = PropertyService::collect_uploads(&mut multipart, &state.upload_limits).await?;
    let images =
        PropertyService::add_images(&state.db, state.storage.as_ref(), landlord.id, id, uploads)
            .await?;
    Ok((
        StatusCode::CREATED,
        Json(ImagesResponse {
            success: true,
            data: images,
        }),
    ))
}
