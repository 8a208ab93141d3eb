//! Direct account status changes.

use anyhow::{Result, bail};
use sqlx::PgPool;

/// Marks the account with `email` as verified.
pub async fn verify_email(pool: &PgPool, email: &str) -> Result<()> {
    let updated = sqlx::query(
        "UPDATE users SET is_email_verified = TRUE, updated_at = NOW() WHERE email = $1",
    )
    .bind(normalize(email))
    .execute(pool)
    .await?
    .rows_affected();

    ensure_found(updated, email)
}

/// Activates or deactivates the account with `email`.
///
/// Deactivated users keep valid tokens but every authenticated request is
/// rejected until the account is reactivated.
pub async fn set_active(pool: &PgPool, email: &str, active: bool) -> Result<()> {
    let updated =
        sqlx::query("UPDATE users SET is_active = $2, updated_at = NOW() WHERE email = $1")
            .bind(normalize(email))
            .bind(active)
            .execute(pool)
            .await?
            .rows_affected();

    ensure_found(updated, email)
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

fn ensure_found(rows: u64, email: &str) -> Result<()> {
    if rows == 0 {
        bail!("no user with email {email}");
    }
    Ok(())
}
