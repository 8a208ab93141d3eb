//! User domain models and DTOs.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// What a user does on the platform.
///
/// Stored as the Postgres enum `user_type`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "user_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    /// Browses and enquires about listings.
    #[default]
    Tenant,
    /// Publishes listings.
    Landlord,
    /// Both of the above.
    Both,
}

impl UserType {
    /// User types allowed to manage listings.
    pub const LANDLORD_TYPES: [UserType; 2] = [UserType::Landlord, UserType::Both];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tenant => "tenant",
            Self::Landlord => "landlord",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tenant" => Ok(Self::Tenant),
            "landlord" => Ok(Self::Landlord),
            "both" => Ok(Self::Both),
            other => Err(format!("unknown user type '{other}'")),
        }
    }
}

/// A registered user, as returned by the API.
///
/// The password hash is never part of this struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub user_type: UserType,
    pub avatar: Option<String>,
    pub is_active: bool,
    pub is_email_verified: bool,
    pub last_active: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The subset of fields authorization decisions depend on.
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.id,
            user_type: self.user_type,
            is_active: self.is_active,
            is_email_verified: self.is_email_verified,
            last_active: self.last_active,
        }
    }
}

/// The authenticated principal attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: Uuid,
    pub user_type: UserType,
    pub is_active: bool,
    pub is_email_verified: bool,
    pub last_active: DateTime<Utc>,
}

impl Actor {
    pub fn has_type(&self, allowed: &[UserType]) -> bool {
        allowed.contains(&self.user_type)
    }

    pub fn is_landlord(&self) -> bool {
        self.has_type(&UserType::LANDLORD_TYPES)
    }
}

/// A user row together with its password hash, used only by login.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    #[sqlx(flatten)]
    pub user: User,
    #[sqlx(rename = "password")]
    pub password_hash: String,
}

/// Insert payload built by registration after hashing the password.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub user_type: UserType,
}

/// Partial profile update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileDto {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    #[schema(example = "+962791234567")]
    pub phone: Option<String>,
    pub user_type: Option<UserType>,
    #[validate(url(message = "Avatar must be a valid URL"))]
    pub avatar: Option<String>,
}

impl UpdateProfileDto {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone.is_none()
            && self.user_type.is_none()
            && self.avatar.is_none()
    }
}

/// Accepts an optional leading `+` followed by 7 to 15 digits.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    let valid = (7..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit());

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("phone")
            .with_message(Cow::Borrowed("Please provide a valid phone number")))
    }
}
