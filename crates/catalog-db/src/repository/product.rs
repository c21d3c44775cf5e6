//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Lookup by id
//! - Insert after a successful partner registration
//! - Update that replaces name and description
//! - Idempotent delete that also removes the product's offers

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use catalog_core::{Product, ProductChanges};

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
/// let product = repo.get_by_id(id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its id.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - No product with that id
    pub async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, name, description FROM products WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The inserted product
    /// * `Err(DbError::UniqueViolation)` - A product with this id already exists
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(id = %product.id, "Inserting product");

        sqlx::query("INSERT INTO products (id, name, description) VALUES (?1, ?2, ?3)")
            .bind(product.id)
            .bind(&product.name)
            .bind(&product.description)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { field, .. } => DbError::duplicate(field, product.id),
                other => other,
            })?;

        Ok(product.clone())
    }

    /// Replaces the name and description and returns the stored product.
    ///
    /// Fields that are `None` in `changes` are stored as NULL.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The product after the update
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, id: Uuid, changes: &ProductChanges) -> DbResult<Product> {
        debug!(id = %id, "Updating product");

        let updated = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                name = ?2,
                description = ?3
            WHERE id = ?1
            RETURNING id, name, description
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.description)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes a product and every offer attached to it.
    ///
    /// Both deletes run in one transaction. Deleting an id that does not
    /// exist is not an error.
    ///
    /// ## Returns
    /// Number of product rows removed (0 or 1).
    pub async fn delete(&self, id: Uuid) -> DbResult<u64> {
        debug!(id = %id, "Deleting product");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let offers = sqlx::query("DELETE FROM offers WHERE product_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let products = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(
            id = %id,
            offers_removed = offers.rows_affected(),
            products_removed = products.rows_affected(),
            "Product deleted"
        );

        Ok(products.rows_affected())
    }

    /// Counts total products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig, DbError};
    use catalog_core::{Offer, Product, ProductChanges};
    use uuid::Uuid;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn widget() -> Product {
        Product {
            id: Uuid::new_v4(),
            name: Some("Widget".to_string()),
            description: Some("A widget".to_string()),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = db().await;
        let product = widget();

        db.products().insert(&product).await.unwrap();

        let found = db.products().get_by_id(product.id).await.unwrap();
        assert_eq!(found, Some(product));
        assert_eq!(db.products().get_by_id(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_insert_duplicate_id() {
        let db = db().await;
        let product = widget();

        db.products().insert(&product).await.unwrap();
        let err = db.products().insert(&product).await.unwrap_err();

        match err {
            DbError::UniqueViolation { value, .. } => assert_eq!(value, product.id.to_string()),
            other => panic!("expected UniqueViolation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_replaces_both_fields() {
        let db = db().await;
        let product = widget();
        db.products().insert(&product).await.unwrap();

        let changes = ProductChanges {
            name: Some("Gadget".to_string()),
            description: None,
        };
        let updated = db.products().update(product.id, &changes).await.unwrap();

        assert_eq!(updated.name.as_deref(), Some("Gadget"));
        assert_eq!(updated.description, None);
        assert_eq!(
            db.products().get_by_id(product.id).await.unwrap(),
            Some(updated)
        );
    }

    #[tokio::test]
    async fn test_update_missing_product() {
        let db = db().await;
        let err = db
            .products()
            .update(Uuid::new_v4(), &ProductChanges::default())
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_removes_offers_and_is_idempotent() {
        let db = db().await;
        let product = widget();
        db.products().insert(&product).await.unwrap();
        db.offers()
            .insert_if_absent(&Offer {
                id: Uuid::new_v4(),
                price: Some(100),
                items_in_stock: Some(3),
                product_id: product.id,
            })
            .await
            .unwrap();

        assert_eq!(db.products().delete(product.id).await.unwrap(), 1);
        assert_eq!(db.offers().count_for_product(product.id).await.unwrap(), 0);
        assert_eq!(db.products().get_by_id(product.id).await.unwrap(), None);

        assert_eq!(db.products().delete(product.id).await.unwrap(), 0);
    }
}
