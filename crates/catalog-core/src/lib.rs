//! # catalog-core: Domain Types for the Catalog Service
//!
//! This crate holds the domain model shared by the database layer, the
//! partner integration and the HTTP API. It has zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Catalog Service Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    catalog-api (axum)                           │   │
//! │  │   GET /product/{id}/offers, POST /product, PATCH, DELETE        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    catalog-sync                                 │   │
//! │  │   TokenRefresher, OfferReconciler, ProductRegistrar             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ catalog-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌─────────────┐  ┌────────────────┐           │   │
//! │  │   │   types   │  │ validation  │  │     error      │           │   │
//! │  │   │  Product  │  │ name/desc   │  │   CoreError    │           │   │
//! │  │   │   Offer   │  │   limits    │  │ValidationError │           │   │
//! │  │   │AccessToken│  │             │  │                │           │   │
//! │  │   └───────────┘  └─────────────┘  └────────────────┘           │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Offer, AccessToken, request shapes)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation for product fields
//!
//! ## Example Usage
//!
//! ```rust
//! use catalog_core::{NewProduct, Product};
//!
//! let new = NewProduct {
//!     id: None,
//!     name: Some("Widget".to_string()),
//!     description: Some("A widget".to_string()),
//! };
//! let product = Product::from_new(new);
//!
//! let payload = product.registration_payload();
//! assert_eq!(payload["name"], "Widget");
//! assert_eq!(payload["id"], product.id.to_string());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of a product name, in characters.
pub const MAX_NAME_LEN: usize = 255;

/// Maximum length of a product description, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 2000;
