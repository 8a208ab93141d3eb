//! # Aqar Auth
//!
//! Signed, time-bounded credentials for the Aqar API.
//!
//! - [`claims`]: the credential payload and the access/refresh discriminator
//! - [`jwt`]: [`TokenCodec`], which issues and decodes HS256 tokens
//!
//! # Token Types
//!
//! - **Access**: presented as `Authorization: Bearer <token>`; lifetime from
//!   `JWT_EXPIRE` (default 7 days)
//! - **Refresh**: exchanged for a new access token; always 30 days
//!
//! # Example
//!
//! ```ignore
//! use aqar_auth::{TokenCodec, TokenType};
//! use aqar_config::JwtConfig;
//!
//! let codec = TokenCodec::new(&JwtConfig::from_env()?);
//! let token = codec.issue(user_id, TokenType::Access)?;
//! let claims = codec.decode(&token)?;
//! assert_eq!(claims.subject()?, user_id);
//! ```

pub mod claims;
pub mod jwt;

// Re-export commonly used types at crate root
pub use claims::{Claims, TokenPair, TokenType};
pub use jwt::{TokenCodec, TokenError};
