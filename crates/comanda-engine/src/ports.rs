//! # Ports
//!
//! Read-only collaborators the engine depends on but does not own.
//!
//! ```text
//! ┌──────────────┐   get_product(tenant, id)    ┌───────────────────────┐
//! │  SaleEngine  │ ───────────────────────────► │ CatalogPort           │
//! │              │                              │  ProductRepository    │
//! │              │   get_profile(tenant)        ├───────────────────────┤
//! │              │ ───────────────────────────► │ TenantProfilePort     │
//! └──────────────┘                              │  TenantRepository     │
//!                                               └───────────────────────┘
//! ```
//!
//! `Ok(None)` means "absent for this tenant". `Err` is reserved for
//! transport failures and surfaces as [`EngineError::Internal`].
//!
//! [`EngineError::Internal`]: crate::EngineError::Internal

use async_trait::async_trait;
use uuid::Uuid;

use comanda_core::{Product, TenantProfile};

use crate::context::TenantId;
use crate::error::EngineResult;

/// Product lookup scoped to a tenant.
#[async_trait]
pub trait CatalogPort: Send + Sync {
    async fn get_product(
        &self,
        tenant_id: TenantId,
        product_id: Uuid,
    ) -> EngineResult<Option<Product>>;
}

/// Display/billing profile of a tenant.
#[async_trait]
pub trait TenantProfilePort: Send + Sync {
    async fn get_profile(&self, tenant_id: TenantId) -> EngineResult<Option<TenantProfile>>;
}
