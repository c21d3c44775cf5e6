//! # catalog-sync: Partner Integration for the Catalog Service
//!
//! Everything that talks to the external partner service: the access token
//! lifecycle, the HTTP client, offer reconciliation and product registration.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        catalog-sync                                     │
//! │                                                                         │
//! │  ┌────────────────┐   owns   ┌──────────────┐   readers                │
//! │  │ TokenRefresher │─────────►│  TokenStore  │──────────┐               │
//! │  │ (spawned task) │          │ watch + file │          │               │
//! │  └───────┬────────┘          └──────────────┘          ▼               │
//! │          │                                  ┌──────────────────────┐   │
//! │          │ authenticate                     │ OfferReconciler      │   │
//! │          │                                  │ ProductRegistrar     │   │
//! │          ▼                                  └──────────┬───────────┘   │
//! │  ┌──────────────────────────────────────────┐          │               │
//! │  │ PartnerApi (trait)                       │◄─────────┘               │
//! │  │  └── HttpPartnerApi ──► ServiceClient ───┼──► partner service       │
//! │  └──────────────────────────────────────────┘                          │
//! │                                                                         │
//! │  OfferReconciler / ProductRegistrar ──► catalog-db (local storage)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - `PartnerConfig` (TOML file + environment)
//! - [`error`] - `SyncError`
//! - [`token`] - `TokenStore` / `TokenReader`
//! - [`client`] - `ServiceClient`, `ServiceResponse`, `HttpMethod`
//! - [`partner`] - `PartnerApi` trait and its HTTP implementation
//! - [`refresh`] - `TokenRefresher`
//! - [`offers`] - `OfferReconciler`
//! - [`registration`] - `ProductRegistrar`
//!
//! ## Wiring
//! ```rust,ignore
//! let config = PartnerConfig::load(None)?;
//! let partner: Arc<dyn PartnerApi> = Arc::new(HttpPartnerApi::from_config(&config)?);
//!
//! let store = TokenStore::load(config.token.file.clone());
//! let tokens = store.reader();
//!
//! let refresher = TokenRefresher::new(
//!     partner.clone(),
//!     store,
//!     &config.partner.refresh_token,
//!     RefreshSettings::from_config(&config),
//! )
//! .spawn();
//!
//! let offers = OfferReconciler::new(db.clone(), partner.clone(), tokens.clone(), config.sync.upstream_policy);
//! let registrar = ProductRegistrar::new(db, partner, tokens);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod client;
pub mod config;
pub mod error;
pub mod offers;
pub mod partner;
pub mod refresh;
pub mod registration;
pub mod token;

#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use client::{HttpMethod, ServiceClient, ServiceResponse};
pub use config::{PartnerConfig, UpstreamFailurePolicy};
pub use error::{SyncError, SyncResult};
pub use offers::OfferReconciler;
pub use partner::{HttpPartnerApi, PartnerApi};
pub use refresh::{RefreshOutcome, RefreshSettings, RefresherHandle, TokenRefresher};
pub use registration::{ProductRegistrar, RegistrationOutcome};
pub use token::{TokenReader, TokenStore};
