//! # Sale Repository
//!
//! Writes a priced sale as one unit of work and reads it back in order.
//!
//! ## Commit Unit of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       commit_sale()                                     │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │   ├── INSERT sales                 (fails → rollback, plain error)     │
//! │   ├── INSERT sale_items            line 1..n                           │
//! │   │    └── INSERT sale_item_toppings   position 1..m per line          │
//! │   └── INSERT sale_payments         position 1..k                       │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  Any failure after the sale row ──► ROLLBACK ──► DbError::PartialCommit │
//! │  Future dropped mid-way          ──► Transaction dropped ──► ROLLBACK   │
//! │                                                                         │
//! │  Readers (WAL) see either nothing or the whole sale.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Idempotency
//! A sale committed with an idempotency key occupies `(tenant_id, key)` in a
//! unique index. A second commit with the same key loses at the sale insert,
//! before anything else is written, and resolves to the first sale.

use chrono::Utc;
use sqlx::sqlite::Sqlite;
use sqlx::{SqliteConnection, SqlitePool, Transaction};
use std::collections::HashMap;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use comanda_core::pricing::{PricedItem, PricedTopping, ValidatedPayment};
use comanda_core::{
    Money, Payment, Sale, SaleItem, SaleItemTopping, SaleLine, SaleRecord, SaleStatus,
};

const SALE_COLUMNS: &str =
    "id, tenant_id, user_id, total_cents, status, idempotency_key, created_at, updated_at";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Persists a priced, reconciled sale atomically.
    ///
    /// The sale is `completed` and its total is the sum of the item
    /// subtotals. Items get `line_no` 1..n in slice order; toppings and
    /// payments get `position` 1..m in slice order.
    ///
    /// ## Returns
    /// * `Ok(Sale)` - the committed sale, or the earlier sale holding the
    ///   same idempotency key
    /// * `Err(DbError::PartialCommit)` - a write after the sale row failed;
    ///   everything was rolled back
    pub async fn commit_sale(
        &self,
        tenant_id: &str,
        user_id: &str,
        items: &[PricedItem],
        payments: &[ValidatedPayment],
        idempotency_key: Option<&str>,
    ) -> DbResult<Sale> {
        let now = Utc::now();
        let total: Money = items.iter().map(|item| item.subtotal).sum();

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            user_id: user_id.to_string(),
            total_cents: total.cents(),
            status: SaleStatus::Completed,
            idempotency_key: idempotency_key.map(str::to_string),
            created_at: now,
            updated_at: now,
        };

        debug!(
            sale_id = %sale.id,
            tenant_id = %tenant_id,
            items = items.len(),
            payments = payments.len(),
            "Beginning sale commit"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        if let Err(err) = insert_sale(&mut *tx, &sale).await {
            rollback(tx, &sale.id).await;

            if let (true, Some(key)) = (err.is_unique_violation(), idempotency_key) {
                if let Some(existing) = self.find_by_idempotency_key(tenant_id, key).await? {
                    info!(
                        sale_id = %existing.id,
                        tenant_id = %tenant_id,
                        "Idempotency key already committed, returning existing sale"
                    );
                    return Ok(existing);
                }
            }

            return Err(err);
        }

        if let Err((stage, err)) = write_dependents(&mut *tx, &sale, items, payments).await {
            error!(
                sale_id = %sale.id,
                tenant_id = %tenant_id,
                stage = %stage,
                error = %err,
                "Sale write failed after sale row, rolling back"
            );
            rollback(tx, &sale.id).await;

            return Err(DbError::PartialCommit {
                sale_id: sale.id,
                stage,
                reason: err.to_string(),
            });
        }

        if let Err(e) = tx.commit().await {
            error!(sale_id = %sale.id, error = %e, "Sale commit failed");
            return Err(DbError::PartialCommit {
                sale_id: sale.id,
                stage: "commit".to_string(),
                reason: e.to_string(),
            });
        }

        info!(
            sale_id = %sale.id,
            tenant_id = %tenant_id,
            total = %total,
            "Sale committed"
        );

        Ok(sale)
    }

    /// Finds the sale a tenant committed under an idempotency key.
    pub async fn find_by_idempotency_key(
        &self,
        tenant_id: &str,
        key: &str,
    ) -> DbResult<Option<Sale>> {
        let sql = format!(
            "SELECT {} FROM sales WHERE tenant_id = ?1 AND idempotency_key = ?2",
            SALE_COLUMNS
        );

        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(tenant_id)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Gets a sale header by ID, scoped to a tenant.
    pub async fn get_by_id(&self, tenant_id: &str, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!(
            "SELECT {} FROM sales WHERE id = ?1 AND tenant_id = ?2",
            SALE_COLUMNS
        );

        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Loads a sale with its lines, toppings and payments.
    ///
    /// Lines come back by `line_no`, toppings and payments by `position`.
    /// All reads share one snapshot. A sale of another tenant is `None`.
    pub async fn get_record(&self, tenant_id: &str, sale_id: &str) -> DbResult<Option<SaleRecord>> {
        debug!(sale_id = %sale_id, tenant_id = %tenant_id, "Loading sale record");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let sql = format!(
            "SELECT {} FROM sales WHERE id = ?1 AND tenant_id = ?2",
            SALE_COLUMNS
        );
        let Some(sale) = sqlx::query_as::<_, Sale>(&sql)
            .bind(sale_id)
            .bind(tenant_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT
                id, sale_id, line_no, product_id, name_snapshot,
                quantity, unit_price_cents, subtotal_cents, notes
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY line_no
            "#,
        )
        .bind(&sale.id)
        .fetch_all(&mut *tx)
        .await?;

        let toppings = sqlx::query_as::<_, SaleItemTopping>(
            r#"
            SELECT
                t.id, t.sale_item_id, t.position, t.name, t.price_cents, t.quantity
            FROM sale_item_toppings t
            INNER JOIN sale_items i ON i.id = t.sale_item_id
            WHERE i.sale_id = ?1
            ORDER BY i.line_no, t.position
            "#,
        )
        .bind(&sale.id)
        .fetch_all(&mut *tx)
        .await?;

        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT
                id, sale_id, position, method, amount_cents, reference, created_at
            FROM sale_payments
            WHERE sale_id = ?1
            ORDER BY position
            "#,
        )
        .bind(&sale.id)
        .fetch_all(&mut *tx)
        .await?;

        // Read-only; ending the snapshot either way is fine.
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let mut toppings_by_item: HashMap<String, Vec<SaleItemTopping>> = HashMap::new();
        for topping in toppings {
            toppings_by_item
                .entry(topping.sale_item_id.clone())
                .or_default()
                .push(topping);
        }

        let lines = items
            .into_iter()
            .map(|item| SaleLine {
                toppings: toppings_by_item.remove(&item.id).unwrap_or_default(),
                item,
            })
            .collect();

        Ok(Some(SaleRecord {
            sale,
            lines,
            payments,
        }))
    }
}

// =============================================================================
// Transaction Steps
// =============================================================================

async fn rollback(tx: Transaction<'_, Sqlite>, sale_id: &str) {
    if let Err(e) = tx.rollback().await {
        // The connection drops the transaction anyway; nothing was committed.
        warn!(sale_id = %sale_id, error = %e, "Explicit rollback failed");
    }
}

async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(sale_id = %sale.id, total_cents = sale.total_cents, "Inserting sale");

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, tenant_id, user_id, total_cents, status,
            idempotency_key, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.tenant_id)
    .bind(&sale.user_id)
    .bind(sale.total_cents)
    .bind(sale.status)
    .bind(&sale.idempotency_key)
    .bind(sale.created_at)
    .bind(sale.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Writes items, toppings and payments. On failure, names the failing write.
async fn write_dependents(
    conn: &mut SqliteConnection,
    sale: &Sale,
    items: &[PricedItem],
    payments: &[ValidatedPayment],
) -> Result<(), (String, DbError)> {
    for (line_no, item) in (1i64..).zip(items) {
        let item_id = Uuid::new_v4().to_string();

        insert_item(&mut *conn, &sale.id, &item_id, line_no, item)
            .await
            .map_err(|e| (format!("item {}", line_no), e))?;

        for (position, topping) in (1i64..).zip(&item.toppings) {
            insert_topping(&mut *conn, &item_id, position, topping)
                .await
                .map_err(|e| (format!("topping {} of item {}", position, line_no), e))?;
        }
    }

    for (position, payment) in (1i64..).zip(payments) {
        insert_payment(&mut *conn, sale, position, payment)
            .await
            .map_err(|e| (format!("payment {}", position), e))?;
    }

    Ok(())
}

async fn insert_item(
    conn: &mut SqliteConnection,
    sale_id: &str,
    item_id: &str,
    line_no: i64,
    item: &PricedItem,
) -> DbResult<()> {
    debug!(sale_id = %sale_id, line_no, product_id = %item.product_id, "Inserting sale item");

    sqlx::query(
        r#"
        INSERT INTO sale_items (
            id, sale_id, line_no, product_id, name_snapshot,
            quantity, unit_price_cents, subtotal_cents, notes
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(item_id)
    .bind(sale_id)
    .bind(line_no)
    .bind(&item.product_id)
    .bind(&item.name)
    .bind(item.quantity)
    .bind(item.unit_price.cents())
    .bind(item.subtotal.cents())
    .bind(&item.notes)
    .execute(conn)
    .await?;

    Ok(())
}

async fn insert_topping(
    conn: &mut SqliteConnection,
    item_id: &str,
    position: i64,
    topping: &PricedTopping,
) -> DbResult<()> {
    debug!(sale_item_id = %item_id, position, name = %topping.name, "Inserting topping");

    sqlx::query(
        r#"
        INSERT INTO sale_item_toppings (
            id, sale_item_id, position, name, price_cents, quantity
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(item_id)
    .bind(position)
    .bind(&topping.name)
    .bind(topping.price.cents())
    .bind(topping.quantity)
    .execute(conn)
    .await?;

    Ok(())
}

async fn insert_payment(
    conn: &mut SqliteConnection,
    sale: &Sale,
    position: i64,
    payment: &ValidatedPayment,
) -> DbResult<()> {
    debug!(
        sale_id = %sale.id,
        position,
        method = %payment.method,
        amount = %payment.amount,
        "Recording payment"
    );

    sqlx::query(
        r#"
        INSERT INTO sale_payments (
            id, sale_id, position, method, amount_cents, reference, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&sale.id)
    .bind(position)
    .bind(payment.method.as_str())
    .bind(payment.amount.cents())
    .bind(&payment.reference)
    .bind(sale.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
