//! # Product Registration
//!
//! Registers a product with the partner, then stores it locally.
//!
//! ```text
//!  validate ──► POST {base}/products/register ──► 200/201 ──► INSERT locally
//!                          │
//!                          └── anything else ──► nothing stored
//! ```
//!
//! The local insert only happens after the partner accepted the product.

use std::sync::Arc;

use catalog_core::validation::validate_new_product;
use catalog_core::{NewProduct, Product};
use catalog_db::Database;
use tracing::{info, warn};

use crate::error::SyncResult;
use crate::partner::PartnerApi;
use crate::token::TokenReader;

/// How a registration attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// The partner accepted the product and it is stored locally.
    Registered { product: Product, status: u16 },

    /// The partner answered with a non-success status.
    Rejected { status: u16 },

    /// The partner could not be reached.
    Unreachable { reason: String },

    /// No access token has been acquired yet.
    Unauthenticated,
}

impl RegistrationOutcome {
    pub fn is_registered(&self) -> bool {
        matches!(self, RegistrationOutcome::Registered { .. })
    }

    /// The stored product, if registration succeeded.
    pub fn into_product(self) -> Option<Product> {
        match self {
            RegistrationOutcome::Registered { product, .. } => Some(product),
            _ => None,
        }
    }
}

/// Registers new products with the partner.
#[derive(Clone)]
pub struct ProductRegistrar {
    db: Database,
    partner: Arc<dyn PartnerApi>,
    tokens: TokenReader,
}

impl ProductRegistrar {
    pub fn new(db: Database, partner: Arc<dyn PartnerApi>, tokens: TokenReader) -> Self {
        Self {
            db,
            partner,
            tokens,
        }
    }

    /// Registers `new` with the partner and stores it on success.
    ///
    /// ## Errors
    /// * `Validation` - input rejected before any call
    /// * `Database` - the partner accepted but the local insert failed
    pub async fn register(&self, new: NewProduct) -> SyncResult<RegistrationOutcome> {
        validate_new_product(&new)?;
        let product = Product::from_new(new);

        let Some(token) = self.tokens.bearer() else {
            warn!(product_id = %product.id, "Cannot register product without an access token");
            return Ok(RegistrationOutcome::Unauthenticated);
        };

        let response = match self.partner.register_product(&token, &product).await {
            Ok(response) => response,
            Err(e) => {
                warn!(product_id = %product.id, error = %e, "Product registration request failed");
                return Ok(RegistrationOutcome::Unreachable {
                    reason: e.to_string(),
                });
            }
        };

        match response.status() {
            status @ (200 | 201) => {
                let product = self.db.products().insert(&product).await?;
                info!(product_id = %product.id, status, "Product registered");
                Ok(RegistrationOutcome::Registered { product, status })
            }
            status => {
                warn!(product_id = %product.id, status, "Partner rejected product registration");
                Ok(RegistrationOutcome::Rejected { status })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ServiceResponse;
    use crate::error::SyncError;
    use crate::testing::ScriptedPartner;
    use crate::token::TokenStore;
    use catalog_core::AccessToken;
    use catalog_db::{DbConfig, DbError};
    use uuid::Uuid;

    async fn setup(token: Option<&str>) -> (Database, Arc<ScriptedPartner>, TokenStore, ProductRegistrar) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let partner = Arc::new(ScriptedPartner::default());
        let store = match token {
            Some(t) => TokenStore::with_token(AccessToken::new(t)),
            None => TokenStore::in_memory(),
        };
        let registrar = ProductRegistrar::new(db.clone(), partner.clone(), store.reader());
        (db, partner, store, registrar)
    }

    fn widget() -> NewProduct {
        NewProduct {
            id: None,
            name: Some("Widget".to_string()),
            description: Some("A widget".to_string()),
        }
    }

    #[tokio::test]
    async fn test_success_is_retrievable() {
        let (db, partner, _store, registrar) = setup(Some("tok")).await;
        partner.push_register(Ok(ServiceResponse::new(201, "")));

        let outcome = registrar.register(widget()).await.unwrap();

        let RegistrationOutcome::Registered { product, status } = outcome else {
            panic!("expected Registered, got {outcome:?}");
        };
        assert_eq!(status, 201);
        assert_eq!(product.name.as_deref(), Some("Widget"));
        assert_eq!(db.products().get_by_id(product.id).await.unwrap(), Some(product));
        assert_eq!(partner.tokens_used("register"), vec!["tok"]);
    }

    #[tokio::test]
    async fn test_supplied_id_is_kept() {
        let (_db, partner, _store, registrar) = setup(Some("tok")).await;
        partner.push_register(Ok(ServiceResponse::new(200, "")));
        let id = Uuid::new_v4();

        let product = registrar
            .register(NewProduct {
                id: Some(id),
                ..widget()
            })
            .await
            .unwrap()
            .into_product()
            .unwrap();

        assert_eq!(product.id, id);
    }

    #[tokio::test]
    async fn test_rejection_is_not_persisted() {
        let (db, partner, _store, registrar) = setup(Some("tok")).await;
        partner.push_register(Ok(ServiceResponse::new(500, "")));

        let outcome = registrar.register(widget()).await.unwrap();

        assert_eq!(outcome, RegistrationOutcome::Rejected { status: 500 });
        assert_eq!(db.products().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_partner() {
        let (db, partner, _store, registrar) = setup(Some("tok")).await;
        partner.push_register(Err(SyncError::Transport("timed out".into())));

        let outcome = registrar.register(widget()).await.unwrap();

        assert!(matches!(outcome, RegistrationOutcome::Unreachable { .. }));
        assert!(!outcome.is_registered());
        assert_eq!(db.products().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_no_token_skips_partner() {
        let (_db, partner, _store, registrar) = setup(None).await;

        let outcome = registrar.register(widget()).await.unwrap();

        assert_eq!(outcome, RegistrationOutcome::Unauthenticated);
        assert!(partner.calls("register").is_empty());
    }

    #[tokio::test]
    async fn test_invalid_input_skips_partner() {
        let (_db, partner, _store, registrar) = setup(Some("tok")).await;

        let err = registrar
            .register(NewProduct {
                name: Some("   ".to_string()),
                ..widget()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Validation(_)));
        assert!(partner.calls("register").is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_local_id() {
        let (_db, partner, _store, registrar) = setup(Some("tok")).await;
        partner.push_register(Ok(ServiceResponse::new(201, "")));
        partner.push_register(Ok(ServiceResponse::new(201, "")));
        let new = NewProduct {
            id: Some(Uuid::new_v4()),
            ..widget()
        };

        registrar.register(new.clone()).await.unwrap();
        let err = registrar.register(new).await.unwrap_err();

        assert!(matches!(
            err,
            SyncError::Database(DbError::UniqueViolation { .. })
        ));
    }
}
