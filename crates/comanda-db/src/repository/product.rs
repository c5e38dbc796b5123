//! # Product Repository
//!
//! The catalog as the sale engine sees it: per-tenant products with an
//! authoritative price and an active flag.
//!
//! ## Tenant Scoping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  get_by_id(tenant_id, id)                                               │
//! │                                                                         │
//! │  WHERE id = ?1 AND tenant_id = ?2                                      │
//! │                                                                         │
//! │  Product of tenant A requested by tenant B  ──►  None                  │
//! │  (same answer as a product that never existed)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use comanda_core::Product;

const PRODUCT_COLUMNS: &str = r#"
    id,
    tenant_id,
    category_id,
    name,
    description,
    price_cents,
    image_url,
    is_active,
    created_at,
    updated_at
"#;

/// Repository for catalog database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
/// let product = repo.get_by_id(&tenant_id, "uuid-here").await?;
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

    /// Gets a product of a tenant by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found in this tenant's catalog
    /// * `Ok(None)` - Not found, or owned by another tenant
    pub async fn get_by_id(&self, tenant_id: &str, id: &str) -> DbResult<Option<Product>> {
        debug!(tenant_id = %tenant_id, product_id = %id, "Looking up product");

        let sql = format!(
            "SELECT {} FROM products WHERE id = ?1 AND tenant_id = ?2",
            PRODUCT_COLUMNS
        );

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Inserts a new product.
    ///
    /// The id should be generated beforehand (see [`generate_product_id`]).
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(tenant_id = %product.tenant_id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, tenant_id, category_id, name, description,
                price_cents, image_url, is_active,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8,
                ?9, ?10
            )
            "#,
        )
        .bind(&product.id)
        .bind(&product.tenant_id)
        .bind(&product.category_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(&product.image_url)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product.clone())
    }

    /// Changes the catalog price of a product.
    ///
    /// Sales already committed keep the price they were sold at.
    pub async fn update_price(&self, tenant_id: &str, id: &str, price_cents: i64) -> DbResult<()> {
        debug!(product_id = %id, price_cents, "Updating product price");

        let result = sqlx::query(
            "UPDATE products SET price_cents = ?3, updated_at = ?4 WHERE id = ?1 AND tenant_id = ?2",
        )
        .bind(id)
        .bind(tenant_id)
        .bind(price_cents)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Creates a menu category and returns its id.
    pub async fn insert_category(
        &self,
        tenant_id: &str,
        name: &str,
        sort_order: i64,
    ) -> DbResult<String> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO categories (id, tenant_id, name, sort_order, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
        )
        .bind(&id)
        .bind(tenant_id)
        .bind(name)
        .bind(sort_order)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Tests
// =============================================================================
