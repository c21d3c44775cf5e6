//! # Error Types
//!
//! Domain-specific error types for catalog-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  catalog-core errors (this file)                                       │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  catalog-db errors                                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  catalog-sync errors                                                   │
//! │  └── SyncError        - Partner calls, token refresh, reconciliation   │
//! │                                                                         │
//! │  catalog-api errors                                                    │
//! │  └── ApiError         - What HTTP callers see (status + JSON)          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SyncError → ApiError → Caller     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;
use uuid::Uuid;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product does not exist locally.
    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any partner call or database write happens.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A provided field is empty or whitespace.
    #[error("{field} must not be blank")]
    Blank { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Nil UUID supplied as an identifier.
    #[error("{field} must not be the nil UUID")]
    NilId { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
