//! Offline token issuance and inspection.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use aqar_auth::{TokenCodec, TokenType};

/// Signs a token for `user_id` without consulting the database.
pub fn issue(codec: &TokenCodec, user_id: Uuid, refresh: bool) -> Result<String> {
    let token_type = if refresh {
        TokenType::Refresh
    } else {
        TokenType::Access
    };
    Ok(codec.issue(user_id, token_type)?)
}

/// Human-readable report of a token's claims or why it was rejected.
pub fn inspect(codec: &TokenCodec, token: &str) -> String {
    match codec.decode(token.trim()) {
        Ok(claims) => {
            let report = json!({
                "valid": true,
                "subject": claims.sub,
                "type": claims.token_type.as_str(),
                "issuedAt": timestamp(claims.iat),
                "expiresAt": timestamp(claims.exp),
            });
            serde_json::to_string_pretty(&report).unwrap_or_else(|_| report.to_string())
        }
        Err(err) => {
            let report = json!({ "valid": false, "reason": err.to_string() });
            serde_json::to_string_pretty(&report).unwrap_or_else(|_| report.to_string())
        }
    }
}

fn timestamp(secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| secs.to_string())
}
