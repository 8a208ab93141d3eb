use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;

use aqar_core::ApiError;
use aqar_models::{UpdateProfileDto, User};

use super::service::UserService;
use crate::middleware::auth::AuthUser;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[derive(Serialize, ToSchema)]
pub struct ProfileResponse {
    pub success: bool,
    pub user: User,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            success: true,
            user,
        }
    }
}

/// Get the authenticated user's profile
#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Current profile", body = ProfileResponse),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorResponse),
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.id))]
pub async fn get_me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = UserService::get_profile(state.users.as_ref(), auth_user.id).await?;
    Ok(Json(user.into()))
}

/// Update the authenticated user's profile
#[utoipa::path(
    put,
    path = "/api/users/me",
    request_body = UpdateProfileDto,
    responses(
        (status = 200, description = "Updated profile", body = ProfileResponse),
        (status = 400, description = "Validation error or phone already registered", body = ErrorResponse),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorResponse),
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
#[instrument(skip(state, auth_user, dto), fields(user_id = %auth_user.id))]
pub async fn update_me(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<UpdateProfileDto>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = UserService::update_profile(state.users.as_ref(), auth_user.id, dto).await?;
    Ok(Json(user.into()))
}
