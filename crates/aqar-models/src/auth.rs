//! Authentication request and response payloads.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use aqar_auth::TokenPair;

use crate::users::{User, UserType, validate_phone};

/// Account registration.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    #[schema(example = "Lina Haddad")]
    pub name: String,
    #[validate(email(message = "Please provide a valid email"))]
    #[schema(example = "lina@example.com")]
    pub email: String,
    #[validate(custom(function = "validate_phone"))]
    #[schema(example = "+962791234567")]
    pub phone: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[serde(default)]
    pub user_type: UserType,
}

impl RegisterRequest {
    /// Email as stored: trimmed and lowercased.
    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "password123")]
    pub password: String,
}

/// Exchange a refresh token for a new token pair.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Tokens plus the authenticated user, returned by register and login.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub success: bool,
    pub token: String,
    pub refresh_token: String,
    pub user: User,
}

impl AuthResponse {
    pub fn new(tokens: TokenPair, user: User) -> Self {
        Self {
            success: true,
            token: tokens.token,
            refresh_token: tokens.refresh_token,
            user,
        }
    }
}
