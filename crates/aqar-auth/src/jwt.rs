//! HS256 token codec.
//!
//! [`TokenCodec`] is built once from a [`JwtConfig`] and shared through
//! application state. There is no global secret: two codecs built from
//! different configs reject each other's tokens.
//!
//! Expiry is strict. A token whose `exp` is not in the future at the moment
//! of decoding is expired; no clock-skew leeway is granted.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;
use uuid::Uuid;

use aqar_config::JwtConfig;
use aqar_core::ApiError;

use crate::claims::{Claims, TokenPair, TokenType};

/// Reasons a token cannot be issued or accepted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Bad signature, bad structure, or unusable claims.
    #[error("token is malformed or its signature is invalid")]
    Malformed,

    /// Signature is valid but `exp` has passed.
    #[error("token has expired")]
    Expired,

    /// A valid token presented where the other token type is required.
    #[error("expected a {expected} token, got {actual}")]
    WrongType {
        expected: &'static str,
        actual: &'static str,
    },

    /// Signing failed.
    #[error("failed to sign token: {0}")]
    Encoding(String),
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Malformed | TokenError::WrongType { .. } => Self::MalformedCredential,
            TokenError::Expired => Self::ExpiredCredential,
            err @ TokenError::Encoding(_) => Self::internal(err),
        }
    }
}

/// Issues and decodes signed credentials.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            access_ttl: config.access_token_expiry,
            refresh_ttl: config.refresh_token_expiry,
        }
    }

    /// Lifetime of tokens of the given type.
    pub fn ttl(&self, token_type: TokenType) -> Duration {
        match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        }
    }

    /// Issues a token for `subject` valid from now.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Encoding`] if signing fails.
    pub fn issue(&self, subject: Uuid, token_type: TokenType) -> Result<String, TokenError> {
        self.issue_at(subject, token_type, Utc::now())
    }

    /// Issues a token as if it were signed at `issued_at`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Encoding`] if signing fails.
    pub fn issue_at(
        &self,
        subject: Uuid,
        token_type: TokenType,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let iat = issued_at.timestamp();
        let ttl = i64::try_from(self.ttl(token_type).as_secs()).unwrap_or(i64::MAX);

        let claims = Claims {
            sub: subject.to_string(),
            token_type,
            iat,
            exp: iat.saturating_add(ttl),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Issues an access/refresh pair for `subject`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Encoding`] if signing fails.
    pub fn issue_pair(&self, subject: Uuid) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            token: self.issue(subject, TokenType::Access)?,
            refresh_token: self.issue(subject, TokenType::Refresh)?,
        })
    }

    /// Verifies signature and expiry and returns the claims.
    ///
    /// # Errors
    ///
    /// [`TokenError::Expired`] if the signature is valid but the token is
    /// past its expiry, [`TokenError::Malformed`] for anything else.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        self.decode_at(token, Utc::now())
    }

    /// Like [`TokenCodec::decode`], additionally requiring a token type.
    ///
    /// # Errors
    ///
    /// [`TokenError::WrongType`] when the token decodes but has the other type.
    pub fn decode_as(&self, token: &str, expected: TokenType) -> Result<Claims, TokenError> {
        let claims = self.decode(token)?;
        if claims.token_type != expected {
            return Err(TokenError::WrongType {
                expected: expected.as_str(),
                actual: claims.token_type.as_str(),
            });
        }
        Ok(claims)
    }

    fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })?;

        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn get_test_codec() -> TokenCodec {
        TokenCodec::new(&JwtConfig::new("test-secret-key-at-least-32-characters-long"))
    }

    #[test]
    fn test_round_trip_access() {
        let codec = get_test_codec();
        let user_id = Uuid::new_v4();

        let token = codec.issue(user_id, TokenType::Access).unwrap();
        let claims = codec.decode(&token).unwrap();

        assert_eq!(claims.subject().unwrap(), user_id);
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
    }

    #[test]
    fn test_round_trip_refresh() {
        let codec = get_test_codec();
        let user_id = Uuid::new_v4();

        let token = codec.issue(user_id, TokenType::Refresh).unwrap();
        let claims = codec.decode(&token).unwrap();

        assert_eq!(claims.subject().unwrap(), user_id);
        assert_eq!(claims.token_type, TokenType::Refresh);
        assert_eq!(claims.exp - claims.iat, 30 * 24 * 60 * 60);
    }

    #[test]
    fn test_configured_access_lifetime() {
        let mut config = JwtConfig::new("secret");
        config.access_token_expiry = Duration::from_secs(3600);
        let codec = TokenCodec::new(&config);

        let claims = codec
            .decode(&codec.issue(Uuid::new_v4(), TokenType::Access).unwrap())
            .unwrap();
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_altered_signature_is_malformed() {
        let codec = get_test_codec();
        let token = codec.issue(Uuid::new_v4(), TokenType::Access).unwrap();

        let (head, signature) = token.rsplit_once('.').unwrap();
        let flipped = if signature.starts_with('A') { "B" } else { "A" };
        let tampered = format!("{head}.{flipped}{}", &signature[1..]);

        assert_eq!(codec.decode(&tampered), Err(TokenError::Malformed));
    }

    #[test]
    fn test_foreign_secret_is_malformed() {
        let codec = get_test_codec();
        let other = TokenCodec::new(&JwtConfig::new("a-completely-different-secret"));
        let token = other.issue(Uuid::new_v4(), TokenType::Access).unwrap();

        assert_eq!(codec.decode(&token), Err(TokenError::Malformed));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let codec = get_test_codec();
        assert_eq!(codec.decode("invalid.token.here"), Err(TokenError::Malformed));
        assert_eq!(codec.decode(""), Err(TokenError::Malformed));
    }

    #[test]
    fn test_expired_token() {
        let codec = get_test_codec();
        let issued = Utc::now() - ChronoDuration::days(8);
        let token = codec.issue_at(Uuid::new_v4(), TokenType::Access, issued).unwrap();

        assert_eq!(codec.decode(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_expiry_is_strict() {
        let codec = get_test_codec();
        let now = Utc::now();
        let issued = now - ChronoDuration::days(7);
        let token = codec.issue_at(Uuid::new_v4(), TokenType::Access, issued).unwrap();

        assert_eq!(codec.decode_at(&token, now), Err(TokenError::Expired));
    }

    #[test]
    fn test_tampered_expired_token_is_malformed() {
        let codec = get_test_codec();
        let issued = Utc::now() - ChronoDuration::days(40);
        let token = codec.issue_at(Uuid::new_v4(), TokenType::Refresh, issued).unwrap();
        let tampered = format!("{token}x");

        assert_eq!(codec.decode(&tampered), Err(TokenError::Malformed));
    }

    #[test]
    fn test_decode_as_rejects_wrong_type() {
        let codec = get_test_codec();
        let refresh = codec.issue(Uuid::new_v4(), TokenType::Refresh).unwrap();

        assert!(codec.decode_as(&refresh, TokenType::Refresh).is_ok());
        assert_eq!(
            codec.decode_as(&refresh, TokenType::Access),
            Err(TokenError::WrongType {
                expected: "access",
                actual: "refresh"
            })
        );
    }

    #[test]
    fn test_issue_pair() {
        let codec = get_test_codec();
        let user_id = Uuid::new_v4();
        let pair = codec.issue_pair(user_id).unwrap();

        let access = codec.decode_as(&pair.token, TokenType::Access).unwrap();
        let refresh = codec.decode_as(&pair.refresh_token, TokenType::Refresh).unwrap();
        assert!(refresh.exp > access.exp);
    }

    #[test]
    fn test_token_errors_classify() {
        assert!(matches!(ApiError::from(TokenError::Expired), ApiError::ExpiredCredential));
        assert!(matches!(ApiError::from(TokenError::Malformed), ApiError::MalformedCredential));
        assert!(matches!(
            ApiError::from(TokenError::WrongType {
                expected: "access",
                actual: "refresh"
            }),
            ApiError::MalformedCredential
        ));
    }

    #[test]
    fn test_debug_hides_keys() {
        let debug = format!("{:?}", get_test_codec());
        assert!(debug.contains("TokenCodec"));
        assert!(!debug.contains("test-secret"));
    }
}
