//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Catalog API                        │
//! │                                                                         │
//! │  Handler: Result<Json<T>, ApiError>                                    │
//! │       │                                                                 │
//! │       ├── ValidationError ───────────────► 400 validation_error        │
//! │       ├── DbError::NotFound ─────────────► 404 not_found               │
//! │       ├── DbError::UniqueViolation ──────► 409 conflict                │
//! │       ├── SyncError::ProductNotFound ────► 404 not_found               │
//! │       ├── SyncError::UpstreamUnavailable ► 502 upstream_unavailable    │
//! │       ├── registration outcome ≠ ok ─────► 404 registration_failed     │
//! │       └── anything else ─────────────────► 500 (generic message)       │
//! │                                                                         │
//! │  Body: {"error": "<code>", "message": "<text>"}                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! 5xx bodies never carry internal detail; the detail is logged instead.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use catalog_core::ValidationError;
use catalog_db::DbError;
use catalog_sync::SyncError;
use serde_json::json;
use tracing::error;

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Malformed request (400)
    BadRequest,

    /// Input validation failed (400)
    ValidationError,

    /// Resource not found (404)
    NotFound,

    /// Partner did not accept the product (404)
    RegistrationFailed,

    /// Duplicate id (409)
    Conflict,

    /// Partner outage under the `fail` policy (502)
    UpstreamUnavailable,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "bad_request",
            ErrorCode::ValidationError => "validation_error",
            ErrorCode::NotFound => "not_found",
            ErrorCode::RegistrationFailed => "registration_failed",
            ErrorCode::Conflict => "conflict",
            ErrorCode::UpstreamUnavailable => "upstream_unavailable",
            ErrorCode::DatabaseError => "database_error",
            ErrorCode::Internal => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::BadRequest | ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound | ErrorCode::RegistrationFailed => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::UpstreamUnavailable => StatusCode::BAD_GATEWAY,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// API error returned from handlers.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::BadRequest, message)
    }

    pub fn registration_failed(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::RegistrationFailed, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

/// Builds the `{"error": code, "message": text}` response.
pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        json_error(self.status(), self.code.as_str(), self.message)
    }
}

// =============================================================================
// Conversions
// =============================================================================

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, id),
            DbError::UniqueViolation { value, .. } => ApiError::new(
                ErrorCode::Conflict,
                format!("Product '{}' already exists", value),
            ),
            DbError::ForeignKeyViolation { message } => {
                error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::ConnectionFailed(e) => {
                error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            other => {
                error!("Database operation failed: {}", other);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts validation errors to API errors.
impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::new(ErrorCode::ValidationError, err.to_string())
    }
}

/// Converts partner-integration errors to API errors.
impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::ProductNotFound(id) => ApiError::not_found("Product", id),
            SyncError::Validation(e) => e.into(),
            SyncError::Database(e) => e.into(),
            SyncError::UpstreamUnavailable(e) => {
                error!("Partner service unavailable: {}", e);
                ApiError::new(
                    ErrorCode::UpstreamUnavailable,
                    "Partner service unavailable",
                )
            }
            other => {
                error!("Partner integration failed: {}", other);
                ApiError::internal("Internal server error")
            }
        }
    }
}
