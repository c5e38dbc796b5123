//! # Tenant Repository
//!
//! Restaurants: the isolation boundary of every other table.
//!
//! Deleted restaurants are soft-deleted (`deleted_at`) and disappear from
//! every read here, including the invoice profile.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use comanda_core::{Tenant, TenantProfile};

/// Registration data for a new restaurant.
#[derive(Debug, Clone, Default)]
pub struct NewTenant {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
    pub logo_url: Option<String>,
}

impl NewTenant {
    /// A restaurant with only the mandatory fields.
    pub fn named(name: impl Into<String>, email: impl Into<String>) -> Self {
        NewTenant {
            name: name.into(),
            email: email.into(),
            ..Default::default()
        }
    }
}

/// Repository for restaurant database operations.
#[derive(Debug, Clone)]
pub struct TenantRepository {
    pool: SqlitePool,
}

impl TenantRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TenantRepository { pool }
    }

    /// Registers a restaurant.
    ///
    /// E-mails are compared case-insensitively.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - e-mail already registered
    pub async fn insert(&self, new: &NewTenant) -> DbResult<Tenant> {
        let now = Utc::now();
        let tenant = Tenant {
            id: Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            email: new.email.trim().to_lowercase(),
            phone: new.phone.clone(),
            address: new.address.clone(),
            tax_id: new.tax_id.clone(),
            logo_url: new.logo_url.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(tenant_id = %tenant.id, email = %tenant.email, "Registering restaurant");

        sqlx::query(
            r#"
            INSERT INTO restaurants (
                id, name, email, phone, address, tax_id, logo_url,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&tenant.id)
        .bind(&tenant.name)
        .bind(&tenant.email)
        .bind(&tenant.phone)
        .bind(&tenant.address)
        .bind(&tenant.tax_id)
        .bind(&tenant.logo_url)
        .bind(tenant.created_at)
        .bind(tenant.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("email", &tenant.email),
            other => other,
        })?;

        info!(tenant_id = %tenant.id, "Restaurant registered");
        Ok(tenant)
    }

    /// Gets a live (not deleted) restaurant by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Tenant>> {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT
                id, name, email, phone, address, tax_id, logo_url,
                created_at, updated_at
            FROM restaurants
            WHERE id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tenant)
    }

    /// Gets the invoice header profile of a live restaurant.
    pub async fn get_profile(&self, id: &str) -> DbResult<Option<TenantProfile>> {
        debug!(tenant_id = %id, "Fetching tenant profile");
        Ok(self.get_by_id(id).await?.map(|t| t.profile()))
    }

    /// Soft-deletes a restaurant. Its sales stay on record.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE restaurants SET deleted_at = ?2, updated_at = ?2 WHERE id = ?1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Restaurant", id));
        }

        info!(tenant_id = %id, "Restaurant soft-deleted");
        Ok(())
    }
}
