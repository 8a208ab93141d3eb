//! Request middleware and extractors.
//!
//! # Modules
//!
//! - [`auth`]: bearer-token authentication (mandatory and optional) and the
//!   [`AuthUser`](auth::AuthUser) / [`MaybeAuthUser`](auth::MaybeAuthUser)
//!   extractors
//! - [`guards`]: user-type and email-verification checks
//! - [`rate_limit`]: per-IP throttling
//! - [`errors`]: development traces, panic recovery and the 404 fallback
//!
//! # Authentication Flow
//!
//! 1. Client sends `Authorization: Bearer <token>`
//! 2. The token is verified and its subject resolved to an active user
//! 3. Guards check the user's type and verification status
//! 4. The handler runs with the actor attached to the request
//!
//! # Example
//!
//! ```ignore
//! use crate::middleware::auth::AuthUser;
//! use crate::middleware::guards::RequireLandlord;
//!
//! async fn get_profile(auth_user: AuthUser) -> impl IntoResponse {
//!     let user_id = auth_user.id;
//!     // ...
//! }
//!
//! async fn delete_listing(landlord: RequireLandlord) -> impl IntoResponse {
//!     // Only landlords reach this point
//! }
//! ```

pub mod auth;
pub mod errors;
pub mod guards;
pub mod rate_limit;
