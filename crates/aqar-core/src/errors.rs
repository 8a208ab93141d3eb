//! API error taxonomy and the bilingual error envelope.
//!
//! Every failure that reaches the HTTP boundary is an [`ApiError`]. Each
//! variant fixes its status code and its English and Arabic messages, so the
//! mapping from failure to response is an exhaustive `match` instead of a
//! chain of runtime checks.
//!
//! Library errors are classified on the way in through `From` impls:
//!
//! | Source | Variant |
//! |--------|---------|
//! | `uuid::Error`, invalid text representation (`22P02`) | [`ApiError::MalformedReference`] |
//! | `sqlx::Error::RowNotFound` | [`ApiError::ResourceNotFound`] |
//! | unique violation (`23505`) | [`ApiError::DuplicateKey`] |
//! | `validator::ValidationErrors`, JSON rejections, check/not-null violations | [`ApiError::ValidationFailure`] |
//! | `jsonwebtoken` errors | [`ApiError::MalformedCredential`] / [`ApiError::ExpiredCredential`] |
//! | multipart body over the limit | [`ApiError::UploadSizeExceeded`] |
//! | anything else | [`ApiError::Unclassified`] |
//!
//! # Response shape
//!
//! ```json
//! { "success": false, "message": "Token expired", "messageAr": "انتهت صلاحية الرمز" }
//! ```
//!
//! The full [`ErrorEnvelope`], including a diagnostic `stack`, is attached to
//! the response extensions. A router layer decides whether the stack is
//! written to the body (development only).

use std::borrow::Cow;
use std::collections::BTreeMap;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use thiserror::Error;
use validator::ValidationErrors;

/// Primary message used whenever a response would otherwise have none.
pub const SERVER_ERROR_MESSAGE: &str = "Server Error";

/// Localized message used whenever a response would otherwise have none.
pub const SERVER_ERROR_MESSAGE_AR: &str = "خطأ في الخادم";

/// Postgres `invalid_text_representation`, raised when a malformed id is cast.
const PG_INVALID_TEXT_REPRESENTATION: &str = "22P02";

/// Closed set of failures the API reports.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("access token required")]
    CredentialRequired,

    #[error("invalid token")]
    MalformedCredential,

    #[error("token expired")]
    ExpiredCredential,

    #[error("token subject does not match any user")]
    UnknownActor,

    #[error("account is deactivated")]
    AccountDeactivated,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("user type not permitted, requires one of {required:?}")]
    InsufficientRole { required: Vec<String> },

    #[error("email verification required")]
    UnverifiedAccount,

    #[error("validation failed: {}", messages.join(", "))]
    ValidationFailure { messages: Vec<String> },

    #[error("duplicate value for {field}")]
    DuplicateKey { field: String },

    #[error("malformed resource identifier")]
    MalformedReference,

    #[error("resource not found")]
    ResourceNotFound,

    #[error("route not found")]
    RouteNotFound,

    #[error("uploaded file exceeds the size limit")]
    UploadSizeExceeded,

    #[error("too many files uploaded")]
    UploadCountExceeded,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("authentication store unavailable: {0}")]
    AuthenticationUnavailable(anyhow::Error),

    #[error(transparent)]
    Unclassified(anyhow::Error),
}

impl ApiError {
    /// Wraps any error as an unclassified internal failure.
    pub fn internal<E>(err: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Self::Unclassified(err.into())
    }

    /// A validation failure with a single message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailure {
            messages: vec![message.into()],
        }
    }

    pub fn duplicate(field: impl Into<String>) -> Self {
        Self::DuplicateKey {
            field: field.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::CredentialRequired
            | Self::MalformedCredential
            | Self::ExpiredCredential
            | Self::UnknownActor
            | Self::AccountDeactivated
            | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::InsufficientRole { .. } | Self::UnverifiedAccount => StatusCode::FORBIDDEN,
            Self::ValidationFailure { .. }
            | Self::DuplicateKey { .. }
            | Self::UploadSizeExceeded
            | Self::UploadCountExceeded => StatusCode::BAD_REQUEST,
            Self::MalformedReference | Self::ResourceNotFound | Self::RouteNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::AuthenticationUnavailable(_) | Self::Unclassified(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable snake_case identifier, used in logs and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CredentialRequired => "credential_required",
            Self::MalformedCredential => "malformed_credential",
            Self::ExpiredCredential => "expired_credential",
            Self::UnknownActor => "unknown_actor",
            Self::AccountDeactivated => "account_deactivated",
            Self::InvalidCredentials => "invalid_credentials",
            Self::InsufficientRole { .. } => "insufficient_role",
            Self::UnverifiedAccount => "unverified_account",
            Self::ValidationFailure { .. } => "validation_failure",
            Self::DuplicateKey { .. } => "duplicate_key",
            Self::MalformedReference => "malformed_reference",
            Self::ResourceNotFound => "resource_not_found",
            Self::RouteNotFound => "route_not_found",
            Self::UploadSizeExceeded => "upload_size_exceeded",
            Self::UploadCountExceeded => "upload_count_exceeded",
            Self::RateLimited => "rate_limited",
            Self::AuthenticationUnavailable(_) => "authentication_unavailable",
            Self::Unclassified(_) => "unclassified",
        }
    }

    /// English message returned to the client.
    pub fn message(&self) -> Cow<'static, str> {
        match self {
            Self::CredentialRequired => "Access token required".into(),
            Self::MalformedCredential => "Invalid token".into(),
            Self::ExpiredCredential => "Token expired".into(),
            Self::UnknownActor => "Invalid token - user not found".into(),
            Self::AccountDeactivated => "Account is deactivated".into(),
            Self::InvalidCredentials => "Invalid email or password".into(),
            Self::InsufficientRole { required } => {
                if required.iter().any(|r| r == "landlord") {
                    "Landlord access required".into()
                } else {
                    format!("Access restricted to: {}", required.join(", ")).into()
                }
            }
            Self::UnverifiedAccount => "Email verification required".into(),
            Self::ValidationFailure { messages } => messages.join(", ").into(),
            Self::DuplicateKey { field } => match field.as_str() {
                "email" => "Email already registered".into(),
                "phone" => "Phone number already registered".into(),
                other => format!("{other} already exists").into(),
            },
            Self::MalformedReference | Self::ResourceNotFound => "Resource not found".into(),
            Self::RouteNotFound => "Route not found".into(),
            Self::UploadSizeExceeded => "File size too large".into(),
            Self::UploadCountExceeded => "Too many files".into(),
            Self::RateLimited => "Too many requests, please try again later".into(),
            Self::AuthenticationUnavailable(_) => "Authentication error".into(),
            Self::Unclassified(_) => SERVER_ERROR_MESSAGE.into(),
        }
    }

    /// Arabic message returned to the client.
    pub fn message_ar(&self) -> &'static str {
        match self {
            Self::CredentialRequired => "رمز الوصول مطلوب",
            Self::MalformedCredential => "رمز غير صالح",
            Self::ExpiredCredential => "انتهت صلاحية الرمز",
            Self::UnknownActor => "رمز غير صالح - المستخدم غير موجود",
            Self::AccountDeactivated => "الحساب معطل",
            Self::InvalidCredentials => "البريد الإلكتروني أو كلمة المرور غير صحيحة",
            Self::InsufficientRole { required } => {
                if required.iter().any(|r| r == "landlord") {
                    "مطلوب صلاحية مالك العقار"
                } else {
                    "صلاحيات غير كافية"
                }
            }
            Self::UnverifiedAccount => "مطلوب تأكيد البريد الإلكتروني",
            Self::ValidationFailure { .. } => "خطأ في التحقق من البيانات",
            Self::DuplicateKey { field } => match field.as_str() {
                "email" => "البريد الإلكتروني مسجل مسبقاً",
                "phone" => "رقم الهاتف مسجل مسبقاً",
                _ => "هذا المورد موجود مسبقاً",
            },
            Self::MalformedReference | Self::ResourceNotFound => "المورد غير موجود",
            Self::RouteNotFound => "المسار غير موجود",
            Self::UploadSizeExceeded => "حجم الملف كبير جداً",
            Self::UploadCountExceeded => "عدد الملفات كثير جداً",
            Self::RateLimited => "طلبات كثيرة جداً، يرجى المحاولة لاحقاً",
            Self::AuthenticationUnavailable(_) => "خطأ في المصادقة",
            Self::Unclassified(_) => SERVER_ERROR_MESSAGE_AR,
        }
    }

    /// Diagnostic detail for development responses.
    pub fn trace(&self) -> String {
        match self {
            Self::AuthenticationUnavailable(source) | Self::Unclassified(source) => {
                format!("{source:?}")
            }
            other => format!("{}: {other}", other.kind()),
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            message: self.message().into_owned(),
            message_ar: self.message_ar().to_string(),
            stack: Some(self.trace()),
        }
    }
}

/// Body of every error response.
///
/// Serialization always emits `"success": false` and substitutes the generic
/// server-error wording for an empty `message` or `messageAr`, so a client
/// never receives an envelope without both languages.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorEnvelope {
    pub message: String,
    pub message_ar: String,
    pub stack: Option<String>,
}

impl ErrorEnvelope {
    /// Copy of the envelope with the diagnostic stack removed.
    pub fn redacted(&self) -> Self {
        Self {
            stack: None,
            ..self.clone()
        }
    }
}

impl Serialize for ErrorEnvelope {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let fields = if self.stack.is_some() { 4 } else { 3 };
        let mut state = serializer.serialize_struct("ErrorEnvelope", fields)?;
        state.serialize_field("success", &false)?;
        state.serialize_field("message", non_empty_or(&self.message, SERVER_ERROR_MESSAGE))?;
        state.serialize_field(
            "messageAr",
            non_empty_or(&self.message_ar, SERVER_ERROR_MESSAGE_AR),
        )?;
        if let Some(stack) = &self.stack {
            state.serialize_field("stack", stack)?;
        }
        state.end()
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() { fallback } else { value }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(kind = self.kind(), error = ?self, "request failed");
        } else {
            tracing::debug!(kind = self.kind(), error = %self, "request rejected");
        }

        let envelope = self.envelope();
        let mut response = (status, Json(envelope.redacted())).into_response();
        response.extensions_mut().insert(envelope);
        response
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Unclassified(err)
    }
}

impl From<uuid::Error> for ApiError {
    fn from(_: uuid::Error) -> Self {
        Self::MalformedReference
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::ValidationFailure {
            messages: validation_messages(&errors),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => Self::ExpiredCredential,
            _ => Self::MalformedCredential,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => return Self::ResourceNotFound,
            sqlx::Error::Database(db) => {
                if db.code().as_deref() == Some(PG_INVALID_TEXT_REPRESENTATION) {
                    return Self::MalformedReference;
                }
                match db.kind() {
                    sqlx::error::ErrorKind::UniqueViolation => {
                        let detail = db
                            .try_downcast_ref::<sqlx::postgres::PgDatabaseError>()
                            .and_then(|pg| pg.detail())
                            .and_then(duplicate_field_from_detail);
                        let field = detail
                            .or_else(|| db.constraint().and_then(field_from_constraint))
                            .unwrap_or_else(|| "record".to_string());
                        return Self::DuplicateKey { field };
                    }
                    sqlx::error::ErrorKind::NotNullViolation
                    | sqlx::error::ErrorKind::CheckViolation => {
                        return Self::validation(db.message());
                    }
                    _ => {}
                }
            }
            _ => {}
        }
        Self::Unclassified(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if matches!(rejection, JsonRejection::MissingJsonContentType(_)) {
            return Self::validation("Missing 'Content-Type: application/json' header");
        }

        let body = rejection.body_text();
        if let Some(field) = body
            .split("missing field `")
            .nth(1)
            .and_then(|s| s.split('`').next())
        {
            return Self::validation(format!("{field} is required"));
        }
        if body.contains("invalid type") {
            return Self::validation("Invalid field type in request");
        }

        Self::validation("Invalid request body")
    }
}

impl From<PathRejection> for ApiError {
    fn from(_: PathRejection) -> Self {
        Self::MalformedReference
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::UploadSizeExceeded
        } else {
            Self::validation(err.body_text())
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::UploadSizeExceeded
        } else {
            Self::validation(rejection.body_text())
        }
    }
}

/// Flattens validator output into one message per failed rule, ordered by
/// field name.
pub fn validation_messages(errors: &ValidationErrors) -> Vec<String> {
    let by_field: BTreeMap<_, _> = errors.field_errors().into_iter().collect();

    by_field
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                error
                    .message
                    .as_ref()
                    .map(|msg| msg.to_string())
                    .unwrap_or_else(|| format!("{field} is invalid"))
            })
        })
        .collect()
}

/// Extracts the column from a Postgres unique-violation detail such as
/// `Key (email)=(a@b.com) already exists.`
pub fn duplicate_field_from_detail(detail: &str) -> Option<String> {
    let columns = detail.strip_prefix("Key (")?.split(")=").next()?;
    let first = columns.split(',').next()?.trim();
    (!first.is_empty()).then(|| first.to_string())
}

/// Guesses the column from a constraint named `<table>_<column>_key`.
pub fn field_from_constraint(constraint: &str) -> Option<String> {
    let stem = constraint
        .strip_suffix("_key")
        .or_else(|| constraint.strip_suffix("_unique"))?;
    let (_, column) = stem.rsplit_once('_')?;
    (!column.is_empty()).then(|| column.to_string())
}
