//! # Aqar Models
//!
//! Domain models and DTOs for the Aqar API.
//!
//! # Modules
//!
//! - [`users`]: persisted users, the authenticated [`Actor`] projection and
//!   profile updates
//! - [`auth`]: registration, login and refresh payloads
//! - [`properties`]: listings, their images and listing filters
//! - [`messaging`]: WebSocket relay events
//!
//! All JSON payloads use camelCase keys.

pub mod auth;
pub mod messaging;
pub mod properties;
pub mod users;

// Re-export commonly used types at crate root
pub use auth::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest};
pub use messaging::{ClientEvent, ServerEvent};
pub use properties::{
    CreatePropertyDto, PaginatedPropertiesResponse, Property, PropertyFilter, PropertyImage,
    PropertyListing,
};
pub use users::{Actor, NewUser, UpdateProfileDto, User, UserCredentials, UserType};
