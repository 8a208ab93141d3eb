//! Password hashing with bcrypt.

use bcrypt::{DEFAULT_COST, hash, verify};

use crate::errors::ApiError;

/// Hashes a plaintext password with the default bcrypt cost.
///
/// # Errors
///
/// Returns an unclassified error if bcrypt fails.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| ApiError::internal(anyhow::anyhow!("Failed to hash password: {e}")))
}

/// Checks a plaintext password against a stored bcrypt hash.
///
/// # Errors
///
/// Returns an unclassified error if the stored hash is not valid bcrypt.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
    verify(password, hash)
        .map_err(|e| ApiError::internal(anyhow::anyhow!("Failed to verify password: {e}")))
}
