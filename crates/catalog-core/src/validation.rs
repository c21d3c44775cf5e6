//! # Validation Module
//!
//! Input validation for product create and update requests.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractor (axum Query / Json / Path)                    │
//! │  └── Type validation (UUID syntax, query and JSON shape)               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  └── Field rules (blank names, length limits, nil ids)                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── PRIMARY KEY constraints                                           │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation runs before registration so that a malformed product is
//! never sent to the partner service.

use crate::error::ValidationError;
use crate::types::{NewProduct, ProductChanges};
use crate::{MAX_DESCRIPTION_LEN, MAX_NAME_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates an optional product name.
///
/// ## Rules
/// - Absent is allowed
/// - If present, must not be blank
/// - At most [`MAX_NAME_LEN`] characters
///
/// ## Example
/// ```rust
/// use catalog_core::validation::validate_name;
///
/// assert!(validate_name(Some("Widget")).is_ok());
/// assert!(validate_name(None).is_ok());
/// assert!(validate_name(Some("  ")).is_err());
/// ```
pub fn validate_name(name: Option<&str>) -> ValidationResult<()> {
    let Some(name) = name else {
        return Ok(());
    };

    if name.trim().is_empty() {
        return Err(ValidationError::Blank {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates an optional product description.
///
/// Empty descriptions are allowed; only the length is checked.
pub fn validate_description(description: Option<&str>) -> ValidationResult<()> {
    match description {
        Some(d) if d.chars().count() > MAX_DESCRIPTION_LEN => Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: MAX_DESCRIPTION_LEN,
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates a create request.
pub fn validate_new_product(new: &NewProduct) -> ValidationResult<()> {
    if new.id.is_some_and(|id| id.is_nil()) {
        return Err(ValidationError::NilId {
            field: "id".to_string(),
        });
    }
    validate_name(new.name.as_deref())?;
    validate_description(new.description.as_deref())
}

/// Validates an update request.
pub fn validate_changes(changes: &ProductChanges) -> ValidationResult<()> {
    validate_name(changes.name.as_deref())?;
    validate_description(changes.description.as_deref())
}
