//! # Sync Error Types
//!
//! Error types for partner integration.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Token               │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Transport      │  │  InvalidAuthResponse    │ │
//! │  │  InvalidUrl     │  │  UnexpectedStatus│ │  TokenPersist           │ │
//! │  │  ConfigLoad...  │  │  InvalidResponse│  │  MissingToken           │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │    Catalog      │  │    Database     │  │     Internal            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  ProductNotFound│  │  Database(Db..) │  │  SerializationFailed    │ │
//! │  │  Upstream...    │  │                 │  │  Internal               │ │
//! │  │  Validation     │  │                 │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `InvalidAuthResponse` and `TokenPersist` are the only errors that stop
//! the token refresher. Everything else is logged and retried on the next
//! check, or mapped to an HTTP status by the API layer.

use catalog_core::ValidationError;
use catalog_db::DbError;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering every partner-integration failure.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid partner configuration.
    #[error("Invalid partner configuration: {0}")]
    InvalidConfig(String),

    /// Invalid partner base URL.
    #[error("Invalid partner URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// The request never produced a response (connect, timeout, TLS, body read).
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The partner answered with a status the caller does not handle.
    #[error("Unexpected partner status: {status}")]
    UnexpectedStatus { status: u16 },

    /// The partner's response body could not be decoded.
    #[error("Invalid partner response: {0}")]
    InvalidResponse(String),

    // =========================================================================
    // Token Errors
    // =========================================================================
    /// A 201 from `/auth` whose body holds no usable access token.
    #[error("Invalid auth response: {0}")]
    InvalidAuthResponse(String),

    /// The token record could not be written.
    #[error("Failed to persist access token: {0}")]
    TokenPersist(String),

    /// No access token has been acquired yet.
    #[error("No access token available")]
    MissingToken,

    // =========================================================================
    // Catalog Errors
    // =========================================================================
    /// Product does not exist locally.
    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    /// The partner could not be reached and the failure policy is `fail`.
    #[error("Partner service unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Input failed validation before any partner call.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    // =========================================================================
    // Database Errors
    // =========================================================================
    /// Local storage failed.
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Failed to serialize a payload.
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        SyncError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::SerializationFailed(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    /// Returns true if the operation may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::Transport(_) | SyncError::UnexpectedStatus { .. } | SyncError::MissingToken
        )
    }

    /// Returns true if this error stops the token refresher.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidAuthResponse(_) | SyncError::TokenPersist(_)
        )
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_) | SyncError::InvalidUrl(_) | SyncError::ConfigLoadFailed(_)
        )
    }
}
