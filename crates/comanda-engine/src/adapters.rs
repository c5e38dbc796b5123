//! SQLite-backed implementations of the engine ports.

use async_trait::async_trait;
use uuid::Uuid;

use comanda_core::{Product, TenantProfile};
use comanda_db::{ProductRepository, TenantRepository};

use crate::context::TenantId;
use crate::error::EngineResult;
use crate::ports::{CatalogPort, TenantProfilePort};

#[async_trait]
impl CatalogPort for ProductRepository {
    async fn get_product(
        &self,
        tenant_id: TenantId,
        product_id: Uuid,
    ) -> EngineResult<Option<Product>> {
        Ok(self
            .get_by_id(&tenant_id.to_string(), &product_id.to_string())
            .await?)
    }
}

#[async_trait]
impl TenantProfilePort for TenantRepository {
    async fn get_profile(&self, tenant_id: TenantId) -> EngineResult<Option<TenantProfile>> {
        Ok(TenantRepository::get_profile(self, &tenant_id.to_string()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use comanda_db::{Database, DbConfig, NewTenant};

    #[tokio::test]
    async fn test_adapters_scope_by_tenant() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let tenant = db
            .tenants()
            .insert(&NewTenant::named("La Esquina", "esquina@example.com"))
            .await
            .unwrap();
        let tenant_id: TenantId = tenant.id.parse().unwrap();

        let product_id = Uuid::new_v4();
        let now = Utc::now();
        db.products()
            .insert(&Product {
                id: product_id.to_string(),
                tenant_id: tenant.id.clone(),
                category_id: None,
                name: "Refresco".to_string(),
                description: None,
                price_cents: 350,
                image_url: None,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();

        let catalog = db.products();
        let found = catalog.get_product(tenant_id, product_id).await.unwrap();
        assert_eq!(found.map(|p| p.price_cents), Some(350));

        let stranger = TenantId::from_uuid(Uuid::new_v4());
        assert!(catalog.get_product(stranger, product_id).await.unwrap().is_none());

        let profiles = db.tenants();
        let profile = TenantProfilePort::get_profile(&profiles, tenant_id).await.unwrap();
        assert_eq!(profile.map(|p| p.name), Some("La Esquina".to_string()));
    }
}
