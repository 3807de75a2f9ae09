// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 400 Bad Request (email already registered)
    DuplicateEmail(String),

    // 400 Bad Request (verification/reset code absent, wrong or past TTL)
    InvalidOrExpired,

    // 401 Unauthorized (bad email/password pair; absent user answers the same)
    InvalidCredentials,

    // 401 Unauthorized (correct password, unverified account)
    NotVerified,

    // 401 Unauthorized (missing/invalid bearer token)
    AuthError(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 413 Payload Too Large (upload boundary)
    TooLarge,

    // 415 Unsupported Media Type (upload boundary)
    UnsupportedType(String),

    // 502 Bad Gateway (configured mail transport failed)
    DeliveryError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code
/// and a stable machine-readable `code`.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "invalid_input", msg),
            AppError::DuplicateEmail(msg) => (StatusCode::BAD_REQUEST, "duplicate_email", msg),
            AppError::InvalidOrExpired => (
                StatusCode::BAD_REQUEST,
                "invalid_or_expired",
                "Invalid or expired code".to_string(),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "Invalid email or password".to_string(),
            ),
            AppError::NotVerified => (
                StatusCode::UNAUTHORIZED,
                "not_verified",
                "Account is not verified".to_string(),
            ),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, "unauthenticated", msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            AppError::TooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "too_large",
                "Uploaded file exceeds the size limit".to_string(),
            ),
            AppError::UnsupportedType(msg) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_type", msg)
            }
            AppError::DeliveryError(msg) => {
                tracing::error!("Mail delivery failed: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "delivery_failed",
                    "Failed to deliver email".to_string(),
                )
            }
        };
        let body = Json(json!({
            "error": error_message,
            "code": code,
        }));

        (status, body).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
