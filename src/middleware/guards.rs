//! Authorization checks that run after authentication.
//!
//! The checks are plain functions over an [`Actor`]. They are exposed two
//! ways:
//!
//! - middleware ([`require_landlord`], [`require_verified_email`]) for use
//!   with `route_layer` behind [`require_auth`](super::auth::require_auth)
//! - extractors ([`RequireLandlord`], [`RequireVerifiedLandlord`]) that
//!   authenticate and check in one step

use axum::{extract::Request, middleware::Next, response::Response};

use aqar_core::ApiError;
use aqar_models::{Actor, UserType};

/// Fails with [`ApiError::InsufficientRole`] unless the actor's type is allowed.
pub fn require_role(actor: &Actor, allowed: &[UserType]) -> Result<(), ApiError> {
    if actor.has_type(allowed) {
        return Ok(());
    }
    Err(ApiError::InsufficientRole {
        required: allowed.iter().map(|t| t.as_str().to_string()).collect(),
    })
}

/// Fails with [`ApiError::UnverifiedAccount`] unless the email is verified.
pub fn require_verified(actor: &Actor) -> Result<(), ApiError> {
    if actor.is_email_verified {
        Ok(())
    } else {
        Err(ApiError::UnverifiedAccount)
    }
}

fn attached_actor(req: &Request) -> Result<&Actor, ApiError> {
    req.extensions()
        .get::<Actor>()
        .ok_or(ApiError::CredentialRequired)
}

pub async fn require_landlord(req: Request, next: Next) -> Result<Response, ApiError> {
    require_role(attached_actor(&req)?, &UserType::LANDLORD_TYPES)?;
    Ok(next.run(req).await)
}

pub async fn require_verified_email(req: Request, next: Next) -> Result<Response, ApiError> {
    require_verified(attached_actor(&req)?)?;
    Ok(next.run(req).await)
}

/// Defines an extractor that authenticates and then applies guard checks.
#[macro_export]
macro_rules! require_guard {
    ($(#[$meta:meta])* $name:ident, |$actor:ident| $check:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name(pub $crate::middleware::auth::AuthUser);

        impl std::ops::Deref for $name {
            type Target = aqar_models::Actor;

            fn deref(&self) -> &aqar_models::Actor {
                &self.0
            }
        }

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = aqar_core::ApiError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let auth_user = <$crate::middleware::auth::AuthUser as axum::extract::FromRequestParts<
                    $crate::state::AppState,
                >>::from_request_parts(parts, state)
                .await?;
                {
                    let $actor: &aqar_models::Actor = &auth_user;
                    $check?;
                }
                Ok($name(auth_user))
            }
        }
    };
}

require_guard!(
    /// Authenticated landlord (or both).
    RequireLandlord,
    |actor| require_role(actor, &UserType::LANDLORD_TYPES)
);

require_guard!(
    /// Authenticated landlord (or both) with a verified email.
    RequireVerifiedLandlord,
    |actor| require_role(actor, &UserType::LANDLORD_TYPES).and_then(|()| require_verified(actor))
);

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn actor(user_type: UserType, verified: bool) -> Actor {
        Actor {
            id: Uuid::new_v4(),
            user_type,
            is_active: true,
            is_email_verified: verified,
            last_active: Utc::now(),
        }
    }

    #[test]
    fn test_landlord_role_guard() {
        let allowed = UserType::LANDLORD_TYPES;
        assert!(require_role(&actor(UserType::Landlord, false), &allowed).is_ok());
        assert!(require_role(&actor(UserType::Both, false), &allowed).is_ok());

        let err = require_role(&actor(UserType::Tenant, true), &allowed).unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert_eq!(err.message(), "Landlord access required");
        assert_eq!(err.message_ar(), "مطلوب صلاحية مالك العقار");
    }

    #[test]
    fn test_other_role_sets() {
        let err = require_role(&actor(UserType::Landlord, true), &[UserType::Tenant]).unwrap_err();
        assert!(matches!(err, ApiError::InsufficientRole { ref required } if required == &["tenant"]));
    }

    #[test]
    fn test_verified_guard() {
        assert!(require_verified(&actor(UserType::Tenant, true)).is_ok());

        let err = require_verified(&actor(UserType::Landlord, false)).unwrap_err();
        assert!(matches!(err, ApiError::UnverifiedAccount));
        assert_eq!(err.status_code(), 403);
    }
}
