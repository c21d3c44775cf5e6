//! # Offer Reconciliation
//!
//! Pulls a product's offers from the partner into local storage, then
//! answers from local storage.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  offers_for_product(id)                                                 │
//! │       │                                                                 │
//! │       ├── product not stored ───────────────► Err(ProductNotFound)     │
//! │       ▼                                                                 │
//! │  GET {base}/products/{id}/offers (current token)                       │
//! │       │                                                                 │
//! │       ├── 200 ──► insert each offer whose id is new                    │
//! │       ├── 404 ──► nothing to add                                       │
//! │       └── other status / no response / bad body / no token             │
//! │              ├── Degrade: log                                          │
//! │              └── Fail: ────────────────────► Err(UpstreamUnavailable)  │
//! │       ▼                                                                 │
//! │  SELECT offers WHERE product_id = id AND items_in_stock > 0            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Offers already stored are never updated from the partner.

use std::sync::Arc;

use catalog_core::{Offer, PartnerOffer};
use catalog_db::Database;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::UpstreamFailurePolicy;
use crate::error::{SyncError, SyncResult};
use crate::partner::PartnerApi;
use crate::token::TokenReader;

/// Reconciles local offers with the partner on every read.
#[derive(Clone)]
pub struct OfferReconciler {
    db: Database,
    partner: Arc<dyn PartnerApi>,
    tokens: TokenReader,
    policy: UpstreamFailurePolicy,
}

impl OfferReconciler {
    pub fn new(
        db: Database,
        partner: Arc<dyn PartnerApi>,
        tokens: TokenReader,
        policy: UpstreamFailurePolicy,
    ) -> Self {
        Self {
            db,
            partner,
            tokens,
            policy,
        }
    }

    /// Returns the product's in-stock offers after pulling new ones.
    ///
    /// ## Errors
    /// * `ProductNotFound` - no such product, or the lookup itself failed
    /// * `UpstreamUnavailable` - partner failure under the `Fail` policy
    /// * `Database` - the final offer query failed
    pub async fn offers_for_product(&self, product_id: Uuid) -> SyncResult<Vec<Offer>> {
        match self.db.products().get_by_id(product_id).await {
            Ok(Some(_)) => {}
            Ok(None) => return Err(SyncError::ProductNotFound(product_id)),
            Err(e) => {
                warn!(product_id = %product_id, error = %e, "Product lookup failed");
                return Err(SyncError::ProductNotFound(product_id));
            }
        }

        if let Err(e) = self.pull_offers(product_id).await {
            match self.policy {
                UpstreamFailurePolicy::Degrade => {
                    warn!(
                        product_id = %product_id,
                        error = %e,
                        "Offer sync failed, answering from local data"
                    );
                }
                UpstreamFailurePolicy::Fail => {
                    warn!(product_id = %product_id, error = %e, "Offer sync failed");
                    return Err(SyncError::UpstreamUnavailable(e.to_string()));
                }
            }
        }

        Ok(self.db.offers().in_stock_for_product(product_id).await?)
    }

    /// Fetches the partner's offers and stores the new ones.
    async fn pull_offers(&self, product_id: Uuid) -> SyncResult<()> {
        let token = self.tokens.bearer().ok_or(SyncError::MissingToken)?;
        let response = self.partner.product_offers(&token, product_id).await?;

        match response.status() {
            200 => {
                let offers: Vec<PartnerOffer> = response.json()?;
                self.store_offers(product_id, offers).await;
                Ok(())
            }
            404 => {
                info!(product_id = %product_id, "Partner has no offers for product");
                Ok(())
            }
            status => Err(SyncError::UnexpectedStatus { status }),
        }
    }

    /// Inserts offers whose id is not yet stored. Failed inserts are skipped.
    async fn store_offers(&self, product_id: Uuid, offers: Vec<PartnerOffer>) {
        let received = offers.len();
        let mut inserted = 0usize;
        let repo = self.db.offers();

        for offer in offers {
            let offer = offer.into_offer(product_id);
            match repo.insert_if_absent(&offer).await {
                Ok(true) => inserted += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(offer_id = %offer.id, product_id = %product_id, error = %e, "Skipping offer");
                }
            }
        }

        debug!(product_id = %product_id, received, inserted, "Offers reconciled");
    }
}
