use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use aqar_auth::TokenPair;
use aqar_core::{PaginationMeta, PaginationParams};
use aqar_models::{
    AuthResponse, CreatePropertyDto, LoginRequest, PaginatedPropertiesResponse, Property,
    PropertyImage, PropertyListing, RefreshRequest, RegisterRequest, UpdateProfileDto, User,
    UserType,
};

use crate::modules::auth::controller::ErrorResponse;
use crate::modules::health::controller::HealthResponse;
use crate::modules::properties::controller::{
    ImagesResponse, ListingResponse, MessageResponse, PropertyResponse,
};
use crate::modules::users::controller::ProfileResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::health::controller::health,
        crate::modules::auth::controller::register,
        crate::modules::auth::controller::login,
        crate::modules::auth::controller::refresh,
        crate::modules::users::controller::get_me,
        crate::modules::users::controller::update_me,
        crate::modules::properties::controller::list_properties,
        crate::modules::properties::controller::get_property,
        crate::modules::properties::controller::create_property,
        crate::modules::properties::controller::delete_property,
        crate::modules::properties::controller::upload_images,
    ),
    components(
        schemas(
            User,
            UserType,
            UpdateProfileDto,
            ProfileResponse,
            RegisterRequest,
            LoginRequest,
            RefreshRequest,
            AuthResponse,
            TokenPair,
            Property,
            PropertyImage,
            PropertyListing,
            CreatePropertyDto,
            PaginatedPropertiesResponse,
            PropertyResponse,
            ListingResponse,
            ImagesResponse,
            MessageResponse,
            PaginationMeta,
            PaginationParams,
            HealthResponse,
            ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login and token refresh"),
        (name = "Users", description = "Profile of the authenticated user"),
        (name = "Properties", description = "Property listings and images"),
        (name = "Health", description = "Service liveness")
    ),
    info(
        title = "Aqar API",
        version = "0.1.0",
        description = "Real-estate listing API. Errors are returned in English and Arabic.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
