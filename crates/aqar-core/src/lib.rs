//! # Aqar Core
//!
//! Core types, errors, and utilities for the Aqar API.
//!
//! - [`errors`]: the closed API error taxonomy and its bilingual envelope
//! - [`pagination`]: page/limit query parameters and response metadata
//! - [`password`]: bcrypt password hashing and verification
//! - [`file_storage`]: listing image storage and upload limits
//!
//! # Example
//!
//! ```ignore
//! use aqar_core::errors::ApiError;
//! use aqar_core::password::{hash_password, verify_password};
//!
//! let err = ApiError::duplicate("email");
//! assert_eq!(err.message(), "Email already registered");
//!
//! let hash = hash_password("secure_password")?;
//! ```

pub mod errors;
pub mod file_storage;
pub mod pagination;
pub mod password;

// Re-export commonly used types at crate root
pub use errors::{ApiError, ErrorEnvelope};
pub use pagination::{PaginationMeta, PaginationParams};
pub use password::{hash_password, verify_password};
