//! # Offer Repository
//!
//! Database operations for partner offers.
//!
//! Offers are written only by the reconciler and never updated: an offer
//! id that is already stored is left untouched.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use catalog_core::Offer;

/// Repository for offer database operations.
#[derive(Debug, Clone)]
pub struct OfferRepository {
    pool: SqlitePool,
}

impl OfferRepository {
    /// Creates a new OfferRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OfferRepository { pool }
    }

    /// Inserts an offer unless one with the same id already exists.
    ///
    /// ## Returns
    /// * `Ok(true)` - Offer was inserted
    /// * `Ok(false)` - Offer id already stored, nothing changed
    pub async fn insert_if_absent(&self, offer: &Offer) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO offers (id, price, items_in_stock, product_id)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(offer.id)
        .bind(offer.price)
        .bind(offer.items_in_stock)
        .bind(offer.product_id)
        .execute(&self.pool)
        .await?;

        let inserted = result.rows_affected() == 1;
        debug!(id = %offer.id, inserted, "Offer upsert");
        Ok(inserted)
    }

    /// Returns the product's offers that have stock, in insertion order.
    pub async fn in_stock_for_product(&self, product_id: Uuid) -> DbResult<Vec<Offer>> {
        let offers = sqlx::query_as::<_, Offer>(
            r#"
            SELECT id, price, items_in_stock, product_id
            FROM offers
            WHERE product_id = ?1 AND items_in_stock > 0
            ORDER BY rowid
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(offers)
    }

    /// Gets an offer by id.
    pub async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Offer>> {
        let offer = sqlx::query_as::<_, Offer>(
            "SELECT id, price, items_in_stock, product_id FROM offers WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(offer)
    }

    /// Counts every stored offer for a product, in stock or not.
    pub async fn count_for_product(&self, product_id: Uuid) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM offers WHERE product_id = ?1")
            .bind(product_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
