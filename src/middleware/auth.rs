//! Bearer-token authentication.
//!
//! One pipeline serves both mandatory and optional authentication:
//!
//! 1. read `Authorization: Bearer <token>`
//! 2. decode and verify the token as an access token
//! 3. resolve the subject to an [`Actor`] and reject inactive accounts
//! 4. record activity in the background and attach the actor to the request
//!
//! [`FailurePolicy`] decides what happens when any step fails: mandatory
//! routes return the error, optional routes continue without an actor.
//!
//! Handlers read the actor through [`AuthUser`] or [`MaybeAuthUser`]. Both
//! reuse an actor already attached by [`require_auth`] / [`optional_auth`]
//! and otherwise run the pipeline themselves.

use std::ops::Deref;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use aqar_auth::TokenType;
use aqar_core::ApiError;
use aqar_models::Actor;

use crate::metrics::track_auth_failure;
use crate::state::AppState;

/// What to do when authentication fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Fail the request with the classified error.
    Propagate,
    /// Continue without an actor.
    Absorb,
}

/// Extracts the token from an `Authorization` header.
///
/// # Errors
///
/// [`ApiError::CredentialRequired`] when the header or token is absent,
/// [`ApiError::MalformedCredential`] for any scheme other than `Bearer`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(ApiError::CredentialRequired)?
        .to_str()
        .map_err(|_| ApiError::MalformedCredential)?
        .trim();

    let mut parts = value.split_whitespace();
    let scheme = parts.next().ok_or(ApiError::CredentialRequired)?;
    let token = parts.next().ok_or(ApiError::CredentialRequired)?;

    if !scheme.eq_ignore_ascii_case("bearer") || parts.next().is_some() {
        return Err(ApiError::MalformedCredential);
    }

    Ok(token)
}

/// Runs the authentication pipeline against request headers.
///
/// # Errors
///
/// Any credential, identity or account-status failure, classified.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Actor, ApiError> {
    let token = bearer_token(headers)?;
    let claims = state.tokens.decode_as(token, TokenType::Access)?;
    let user_id = claims.subject()?;

    let actor = state.identity.resolve(user_id).await?;
    if !actor.is_active {
        return Err(ApiError::AccountDeactivated);
    }

    state.identity.record_activity(actor.id);
    Ok(actor)
}

/// Authenticates and applies `policy` to the outcome.
///
/// Returns the actor on success, `Ok(None)` for an absorbed failure.
///
/// # Errors
///
/// The classified failure under [`FailurePolicy::Propagate`].
pub async fn authenticate_with(
    state: &AppState,
    headers: &HeaderMap,
    policy: FailurePolicy,
) -> Result<Option<Actor>, ApiError> {
    match authenticate(state, headers).await {
        Ok(actor) => Ok(Some(actor)),
        Err(err) => {
            track_auth_failure(err.kind(), policy);
            match policy {
                FailurePolicy::Propagate => Err(err),
                FailurePolicy::Absorb => {
                    debug!(kind = err.kind(), "optional authentication skipped");
                    Ok(None)
                }
            }
        }
    }
}

/// Rejects the request unless it carries a valid credential for an active user.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(actor) =
        authenticate_with(&state, req.headers(), FailurePolicy::Propagate).await?
    {
        req.extensions_mut().insert(actor);
    }
    Ok(next.run(req).await)
}

/// Attaches the actor when the credential is valid; never fails.
///
/// The outcome is recorded either way so [`MaybeAuthUser`] does not
/// authenticate a second time.
pub async fn optional_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let actor = authenticate_with(&state, req.headers(), FailurePolicy::Absorb)
        .await
        .ok()
        .flatten();
    if let Some(actor) = &actor {
        req.extensions_mut().insert(actor.clone());
    }
    req.extensions_mut().insert(MaybeAuthUser(actor));
    next.run(req).await
}

/// The authenticated actor. Rejects unauthenticated requests.
#[derive(Debug, Clone)]
pub struct AuthUser(Actor);

impl AuthUser {
    pub fn actor(&self) -> &Actor {
        &self.0
    }
}

impl Deref for AuthUser {
    type Target = Actor;

    fn deref(&self) -> &Actor {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(actor) = parts.extensions.get::<Actor>() {
            return Ok(AuthUser(actor.clone()));
        }

        let actor = authenticate_with(state, &parts.headers, FailurePolicy::Propagate)
            .await?
            .ok_or(ApiError::CredentialRequired)?;
        parts.extensions.insert(actor.clone());
        Ok(AuthUser(actor))
    }
}

/// The actor if the request carried a valid credential.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(Option<Actor>);

impl MaybeAuthUser {
    pub fn actor(&self) -> Option<&Actor> {
        self.0.as_ref()
    }
}

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(resolved) = parts.extensions.get::<MaybeAuthUser>() {
            return Ok(resolved.clone());
        }
        if let Some(actor) = parts.extensions.get::<Actor>() {
            return Ok(MaybeAuthUser(Some(actor.clone())));
        }

        let actor = authenticate_with(state, &parts.headers, FailurePolicy::Absorb).await?;
        if let Some(actor) = &actor {
            parts.extensions.insert(actor.clone());
        }
        Ok(MaybeAuthUser(actor))
    }
}
