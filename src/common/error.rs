// Error handling types for the API

use axum::{http::StatusCode, response::IntoResponse, Json};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::fmt;
use tracing::error;

use super::validation::ValidationResult;
use crate::services::otp::OtpError;

/// Message returned for every authentication failure, whatever the cause.
pub const UNAUTHORIZED_MESSAGE: &str = "Authentication required";

/// API error types
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    SessionExpired,
    Forbidden(String),
    BadRequest(String),
    ValidationError(String),
    NotFound(String),
    Conflict(String),
    RateLimited { retry_after: i64 },
    Otp { message: String, code: &'static str },
    ServiceUnavailable(String),
    DatabaseError(sqlx::Error),
    InternalServer(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthorized => write!(f, "Unauthorized"),
            ApiError::SessionExpired => write!(f, "Session expired"),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::RateLimited { retry_after } => {
                write!(f, "Rate limited, retry after {}s", retry_after)
            }
            ApiError::Otp { message, code } => write!(f, "OTP {}: {}", code, message),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service Unavailable: {}", msg),
            ApiError::DatabaseError(e) => write!(f, "Database Error: {}", e),
            ApiError::InternalServer(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

/// JSON error envelope shared by every endpoint
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: &str) -> Self {
        Self {
            success: false,
            error: error.into(),
            code: code.to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Builds the generic 500 response used when the real cause must stay server-side.
pub fn internal_error_response() -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal server error", "INTERNAL_ERROR")),
    )
        .into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_message, code) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                UNAUTHORIZED_MESSAGE.to_string(),
                "UNAUTHORIZED",
            ),
            ApiError::SessionExpired => (
                StatusCode::UNAUTHORIZED,
                "Session expired. Please sign in again.".to_string(),
                "SESSION_EXPIRED",
            ),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, "FORBIDDEN"),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, "BAD_REQUEST"),
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg, "VALIDATION_ERROR"),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "NOT_FOUND"),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg, "CONFLICT"),
            ApiError::RateLimited { retry_after } => {
                let mut response = (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(ErrorResponse::new(
                        "Too many verification requests. Please try again later.",
                        "RATE_LIMIT_EXCEEDED",
                    )),
                )
                    .into_response();
                if let Ok(value) = retry_after.max(0).to_string().parse() {
                    response.headers_mut().insert("retry-after", value);
                }
                return response;
            }
            ApiError::Otp { message, code } => (StatusCode::BAD_REQUEST, message, code),
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, msg, "SERVICE_UNAVAILABLE")
            }
            ApiError::DatabaseError(e) => {
                error!(error = %e, "Database error occurred");
                return internal_error_response();
            }
            ApiError::InternalServer(msg) => {
                error!(detail = %msg, "Internal server error");
                return internal_error_response();
            }
        };

        (status, Json(ErrorResponse::new(error_message, code))).into_response()
    }
}

/// Helper function to convert ValidationResult to ApiError
impl From<ValidationResult> for ApiError {
    fn from(result: ValidationResult) -> Self {
        if result.is_valid {
            ApiError::InternalServer(
                "Validation result was valid but converted to error".to_string(),
            )
        } else {
            let error_messages: Vec<String> = result
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.field, e.message))
                .collect();
            ApiError::ValidationError(error_messages.join(", "))
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::DatabaseError(e)
    }
}

impl From<OtpError> for ApiError {
    fn from(e: OtpError) -> Self {
        ApiError::InternalServer(format!("otp service: {}", e))
    }
}
