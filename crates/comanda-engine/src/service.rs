//! # Sale Engine
//!
//! The engine's public operations.
//!
//! ## commit_sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CommitSaleRequest                                                      │
//! │       │                                                                 │
//! │       ├── idempotency key already used? ──► return that sale           │
//! │       ▼                                                                 │
//! │  price_items()        CatalogPort, concurrent, order kept              │
//! │       ▼                                                                 │
//! │  sale_total() ─► validate_payments() ─► reconcile()                    │
//! │       │                                                                 │
//! │       │   any ValidationError ──► nothing written                      │
//! │       ▼                                                                 │
//! │  SaleRepository::commit_sale()   one transaction                       │
//! │       ▼                                                                 │
//! │  Sale (completed)                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## get_sale_aggregate / render_invoice
//! The sale is always read through the caller's tenant. A sale of another
//! tenant and a malformed id both answer `NotFound`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use ts_rs::TS;
use uuid::Uuid;

use comanda_core::invoice::{render_invoice, InvoiceLayout, INVOICE_CONTENT_TYPE};
use comanda_core::pricing::{reconcile, sale_total, validate_payments};
use comanda_core::validation::normalize_idempotency_key;
use comanda_core::{LineItemRequest, PaymentRequest, Sale, SaleAggregate, SaleRecord};
use comanda_db::{Database, SaleRepository};

use crate::context::RequestContext;
use crate::error::{EngineError, EngineResult};
use crate::ports::{CatalogPort, TenantProfilePort};
use crate::pricing::price_items;

// =============================================================================
// Request / Response Types
// =============================================================================

/// A sale as submitted by the register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CommitSaleRequest {
    pub items: Vec<LineItemRequest>,
    pub payments: Vec<PaymentRequest>,
    /// Retry token. Resubmitting with the same key returns the first sale.
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// A rendered invoice, ready to be sent as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDocument {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

// =============================================================================
// Engine
// =============================================================================

/// Commits sales and serves them back.
///
/// Holds only shared handles; clone it freely.
#[derive(Clone)]
pub struct SaleEngine {
    sales: SaleRepository,
    catalog: Arc<dyn CatalogPort>,
    profiles: Arc<dyn TenantProfilePort>,
    layout: InvoiceLayout,
}

impl fmt::Debug for SaleEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaleEngine")
            .field("sales", &self.sales)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

impl SaleEngine {
    /// Engine with both ports backed by the same database.
    pub fn new(db: &Database, layout: InvoiceLayout) -> Self {
        Self::with_ports(
            db.sales(),
            Arc::new(db.products()),
            Arc::new(db.tenants()),
            layout,
        )
    }

    pub fn with_ports(
        sales: SaleRepository,
        catalog: Arc<dyn CatalogPort>,
        profiles: Arc<dyn TenantProfilePort>,
        layout: InvoiceLayout,
    ) -> Self {
        SaleEngine {
            sales,
            catalog,
            profiles,
            layout,
        }
    }

    /// Prices, reconciles and atomically persists a sale.
    pub async fn commit_sale(
        &self,
        ctx: &RequestContext,
        request: CommitSaleRequest,
    ) -> EngineResult<Sale> {
        let result = self.try_commit(ctx, &request).await;

        if let Err(EngineError::Validation { field, message }) = &result {
            info!(
                tenant_id = %ctx.tenant_id(),
                field = %field,
                reason = %message,
                "Sale rejected"
            );
        }

        result
    }

    async fn try_commit(&self, ctx: &RequestContext, request: &CommitSaleRequest) -> EngineResult<Sale> {
        let tenant_id = ctx.tenant_id();
        let tenant = tenant_id.to_string();
        let key = normalize_idempotency_key(request.idempotency_key.as_deref())?;

        if let Some(key) = key.as_deref() {
            if let Some(existing) = self.sales.find_by_idempotency_key(&tenant, key).await? {
                info!(
                    sale_id = %existing.id,
                    tenant_id = %tenant,
                    "Replayed sale for idempotency key"
                );
                return Ok(existing);
            }
        }

        let items = price_items(self.catalog.as_ref(), tenant_id, &request.items).await?;
        let total = sale_total(&items)?;

        let payments = validate_payments(&request.payments)?;
        reconcile(&payments, total)?;

        debug!(tenant_id = %tenant, total = %total, "Sale validated");

        let sale = self
            .sales
            .commit_sale(
                &tenant,
                &ctx.user_id().to_string(),
                &items,
                &payments,
                key.as_deref(),
            )
            .await?;

        Ok(sale)
    }

    /// Fetches a sale with its lines, payments and the tenant profile.
    ///
    /// A failing or empty profile lookup does not fail the call: the
    /// aggregate comes back with `tenant: None`.
    pub async fn get_sale_aggregate(
        &self,
        ctx: &RequestContext,
        sale_id: &str,
    ) -> EngineResult<SaleAggregate> {
        let record = self.load_record(ctx, sale_id).await?;

        let profile = match self.profiles.get_profile(ctx.tenant_id()).await {
            Ok(Some(profile)) => Some(profile),
            Ok(None) => {
                warn!(tenant_id = %ctx.tenant_id(), "Tenant profile missing, omitting from aggregate");
                None
            }
            Err(e) => {
                warn!(tenant_id = %ctx.tenant_id(), error = %e, "Tenant profile lookup failed, omitting from aggregate");
                None
            }
        };

        Ok(SaleAggregate::from_record(record, profile))
    }

    /// Renders the invoice of a sale.
    ///
    /// Unlike [`Self::get_sale_aggregate`], the profile is required here: a
    /// missing profile is `NotFound` and a failing lookup is `Internal`.
    pub async fn render_invoice(
        &self,
        ctx: &RequestContext,
        sale_id: &str,
    ) -> EngineResult<InvoiceDocument> {
        let record = self.load_record(ctx, sale_id).await?;

        let profile = self
            .profiles
            .get_profile(ctx.tenant_id())
            .await?
            .ok_or_else(|| EngineError::not_found("Tenant", ctx.tenant_id().to_string()))?;

        let aggregate = SaleAggregate::from_record(record, Some(profile.clone()));
        let bytes = render_invoice(&aggregate, &profile, &self.layout);

        info!(
            sale_id = %aggregate.sale.id,
            tenant_id = %ctx.tenant_id(),
            bytes = bytes.len(),
            "Invoice rendered"
        );

        Ok(InvoiceDocument {
            filename: format!("invoice-{}.txt", aggregate.sale.id),
            content_type: INVOICE_CONTENT_TYPE.to_string(),
            bytes,
        })
    }

    async fn load_record(&self, ctx: &RequestContext, sale_id: &str) -> EngineResult<SaleRecord> {
        let not_found = || EngineError::not_found("Sale", sale_id);

        let sale_uuid = Uuid::parse_str(sale_id.trim()).map_err(|_| not_found())?;

        self.sales
            .get_record(&ctx.tenant_id().to_string(), &sale_uuid.to_string())
            .await?
            .ok_or_else(not_found)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{TenantId, UserId};
    use async_trait::async_trait;
    use chrono::Utc;
    use comanda_core::{Product, SaleStatus, TenantProfile, ToppingRequest};
    use comanda_db::{DbConfig, NewTenant};

    struct Fixture {
        db: Database,
        engine: SaleEngine,
        ctx: RequestContext,
        burger: Product,
        bbq: Product,
        soda: Product,
    }

    async fn add_product(db: &Database, tenant_id: &str, name: &str, price_cents: i64, is_active: bool) -> Product {
        let now = Utc::now();
        db.products()
            .insert(&Product {
                id: Uuid::new_v4().to_string(),
                tenant_id: tenant_id.to_string(),
                category_id: None,
                name: name.to_string(),
                description: None,
                price_cents,
                image_url: None,
                is_active,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap()
    }

    async fn register(db: &Database, tenant: NewTenant) -> RequestContext {
        let tenant = db.tenants().insert(&tenant).await.unwrap();
        RequestContext::new(
            tenant.id.parse::<TenantId>().unwrap(),
            UserId::from_uuid(Uuid::new_v4()),
        )
    }

    async fn setup() -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ctx = register(
            &db,
            NewTenant {
                name: "La Esquina".to_string(),
                email: "esquina@example.com".to_string(),
                phone: Some("555-0100".to_string()),
                address: Some("Av. Reforma 123".to_string()),
                tax_id: Some("ESQ010101AAA".to_string()),
                logo_url: None,
            },
        )
        .await;

        let tenant = ctx.tenant_id().to_string();
        let burger = add_product(&db, &tenant, "Hamburguesa", 1000, true).await;
        let bbq = add_product(&db, &tenant, "Hamburguesa BBQ", 1300, false).await;
        let soda = add_product(&db, &tenant, "Refresco", 350, true).await;

        Fixture {
            engine: SaleEngine::new(&db, InvoiceLayout::default()),
            db,
            ctx,
            burger,
            bbq,
            soda,
        }
    }

    fn line(product: &Product, quantity: i64) -> LineItemRequest {
        LineItemRequest {
            product_id: product.id.clone(),
            quantity,
            notes: None,
            toppings: vec![],
        }
    }

    fn burger_with_cheese(burger: &Product) -> LineItemRequest {
        LineItemRequest {
            toppings: vec![ToppingRequest {
                name: "queso".to_string(),
                price_cents: 100,
                quantity: 1,
            }],
            ..line(burger, 2)
        }
    }

    fn pay(method: &str, amount_cents: i64) -> PaymentRequest {
        PaymentRequest {
            method: method.to_string(),
            amount_cents,
            reference: None,
        }
    }

    fn request(items: Vec<LineItemRequest>, payments: Vec<PaymentRequest>) -> CommitSaleRequest {
        CommitSaleRequest {
            items,
            payments,
            idempotency_key: None,
        }
    }

    async fn count(db: &Database, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    async fn execute(db: &Database, sql: &str) {
        sqlx::query(sql).execute(db.pool()).await.unwrap();
    }

    // ===== Scenario A: happy path =====

    #[tokio::test]
    async fn test_commit_prices_from_catalog() {
        let f = setup().await;

        let sale = f
            .engine
            .commit_sale(&f.ctx, request(vec![burger_with_cheese(&f.burger)], vec![pay("cash", 2100)]))
            .await
            .unwrap();

        assert_eq!(sale.total_cents, 2100);
        assert_eq!(sale.status, SaleStatus::Completed);
        assert_eq!(sale.tenant_id, f.ctx.tenant_id().to_string());
        assert_eq!(sale.user_id, f.ctx.user_id().to_string());

        let aggregate = f.engine.get_sale_aggregate(&f.ctx, &sale.id).await.unwrap();
        assert_eq!(aggregate.lines.len(), 1);
        let item = &aggregate.lines[0].item;
        assert_eq!(item.unit_price_cents, 1000);
        assert_eq!(item.quantity, 2);
        assert_eq!(item.subtotal_cents, 2100);
        assert_eq!(aggregate.lines[0].toppings[0].name, "queso");
        assert_eq!(aggregate.payments.len(), 1);
        assert_eq!(aggregate.payments[0].method, "cash");
        assert_eq!(aggregate.tenant.as_ref().map(|t| t.name.as_str()), Some("La Esquina"));
    }

    #[tokio::test]
    async fn test_split_payments_within_tolerance() {
        let f = setup().await;

        let sale = f
            .engine
            .commit_sale(
                &f.ctx,
                request(
                    vec![line(&f.burger, 1), line(&f.soda, 1)],
                    vec![pay("cash", 1000), pay(" Card ", 351)],
                ),
            )
            .await
            .unwrap();

        assert_eq!(sale.total_cents, 1350);
        let aggregate = f.engine.get_sale_aggregate(&f.ctx, &sale.id).await.unwrap();
        let names: Vec<&str> = aggregate.lines.iter().map(|l| l.item.name_snapshot.as_str()).collect();
        assert_eq!(names, vec!["Hamburguesa", "Refresco"]);
        assert_eq!(aggregate.payments[1].method, "card");
    }

    // ===== Scenario B: payment mismatch =====

    #[tokio::test]
    async fn test_payment_mismatch_writes_nothing() {
        let f = setup().await;

        let err = f
            .engine
            .commit_sale(&f.ctx, request(vec![burger_with_cheese(&f.burger)], vec![pay("cash", 2000)]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "VALIDATION_ERROR");
        assert_eq!(err.field(), Some("payments"));
        assert_eq!(count(&f.db, "sales").await, 0);
    }

    // ===== Scenario C: inactive product =====

    #[tokio::test]
    async fn test_inactive_product_rejected() {
        let f = setup().await;

        let err = f
            .engine
            .commit_sale(&f.ctx, request(vec![line(&f.bbq, 1)], vec![pay("cash", 1300)]))
            .await
            .unwrap_err();

        assert_eq!(err.field(), Some("product_id"));
        assert!(err.to_string().contains("producto inactivo"));
        assert_eq!(count(&f.db, "sales").await, 0);
    }

    #[tokio::test]
    async fn test_field_validation() {
        let f = setup().await;

        let cases = vec![
            (request(vec![], vec![pay("cash", 100)]), "items"),
            (request(vec![line(&f.soda, 0)], vec![pay("cash", 350)]), "product_id"),
            (request(vec![line(&f.soda, 1)], vec![]), "payments"),
            (request(vec![line(&f.soda, 1)], vec![pay("crypto", 350)]), "method"),
            (request(vec![line(&f.soda, 1)], vec![pay("cash", 0)]), "amount"),
            (
                request(
                    vec![LineItemRequest {
                        product_id: "not-a-uuid".to_string(),
                        ..line(&f.soda, 1)
                    }],
                    vec![pay("cash", 350)],
                ),
                "product_id",
            ),
            (
                request(
                    vec![LineItemRequest {
                        toppings: vec![ToppingRequest {
                            name: "hielo".to_string(),
                            price_cents: -5,
                            quantity: 1,
                        }],
                        ..line(&f.soda, 1)
                    }],
                    vec![pay("cash", 345)],
                ),
                "toppings.price",
            ),
        ];

        for (req, field) in cases {
            let err = f.engine.commit_sale(&f.ctx, req).await.unwrap_err();
            assert_eq!(err.field(), Some(field), "unexpected error: {err}");
        }

        assert_eq!(count(&f.db, "sales").await, 0);
    }

    // ===== Scenario D: sparse tenant profile =====

    #[tokio::test]
    async fn test_invoice_omits_missing_profile_fields() {
        let f = setup().await;
        let ctx = register(&f.db, NewTenant::named("Tacos Don Pepe", "pepe@example.com")).await;
        let taco = add_product(&f.db, &ctx.tenant_id().to_string(), "Taco al pastor", 250, true).await;

        let sale = f
            .engine
            .commit_sale(&ctx, request(vec![line(&taco, 4)], vec![pay("transfer", 1000)]))
            .await
            .unwrap();

        let doc = f.engine.render_invoice(&ctx, &sale.id).await.unwrap();
        let text = String::from_utf8(doc.bytes).unwrap();

        assert!(text.starts_with("Tacos Don Pepe\n\nFACTURA / TICKET DE VENTA\n"));
        assert!(!text.contains("RFC/NIT"));
        assert!(!text.contains("Tel:"));
        assert!(text.contains("TOTAL: $10.00"));
        assert!(text.contains("  - Transferencia: $10.00"));
    }

    // ===== Scenario E: storage failure mid-commit =====

    #[tokio::test]
    async fn test_storage_failure_rolls_back_everything() {
        let f = setup().await;
        execute(
            &f.db,
            "CREATE TRIGGER fail_payments BEFORE INSERT ON sale_payments \
             BEGIN SELECT RAISE(ABORT, 'simulated storage failure'); END",
        )
        .await;

        let mut req = request(
            vec![burger_with_cheese(&f.burger)],
            vec![pay("cash", 1100), pay("card", 1000)],
        );
        req.idempotency_key = Some("ticket-7".to_string());

        let err = f.engine.commit_sale(&f.ctx, req.clone()).await.unwrap_err();
        assert_eq!(err, EngineError::internal("partial commit"));

        for table in ["sales", "sale_items", "sale_item_toppings", "sale_payments"] {
            assert_eq!(count(&f.db, table).await, 0, "rows left in {}", table);
        }

        // The key was never committed, so a retry creates the sale.
        execute(&f.db, "DROP TRIGGER fail_payments").await;
        let sale = f.engine.commit_sale(&f.ctx, req).await.unwrap();
        let aggregate = f.engine.get_sale_aggregate(&f.ctx, &sale.id).await.unwrap();
        assert_eq!(aggregate.payments.len(), 2);
    }

    // ===== Tenant isolation =====

    #[tokio::test]
    async fn test_cross_tenant_access_is_not_found() {
        let f = setup().await;
        let sale = f
            .engine
            .commit_sale(&f.ctx, request(vec![line(&f.soda, 1)], vec![pay("cash", 350)]))
            .await
            .unwrap();

        let other = register(&f.db, NewTenant::named("El Rincón", "rincon@example.com")).await;

        let err = f.engine.get_sale_aggregate(&other, &sale.id).await.unwrap_err();
        assert_eq!(err.kind(), "NOT_FOUND");
        let err = f.engine.render_invoice(&other, &sale.id).await.unwrap_err();
        assert_eq!(err.kind(), "NOT_FOUND");

        // Products of another tenant do not exist for this one.
        let err = f
            .engine
            .commit_sale(&other, request(vec![line(&f.soda, 1)], vec![pay("cash", 350)]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("producto no encontrado"));
    }

    #[tokio::test]
    async fn test_malformed_sale_id_is_not_found() {
        let f = setup().await;
        let err = f.engine.get_sale_aggregate(&f.ctx, "ticket-42").await.unwrap_err();
        assert_eq!(err, EngineError::not_found("Sale", "ticket-42"));
    }

    // ===== Idempotency =====

    #[tokio::test]
    async fn test_idempotent_replay_returns_same_sale() {
        let f = setup().await;
        let mut req = request(vec![line(&f.soda, 2)], vec![pay("cash", 700)]);
        req.idempotency_key = Some("order-42".to_string());

        let first = f.engine.commit_sale(&f.ctx, req.clone()).await.unwrap();
        let second = f.engine.commit_sale(&f.ctx, req).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(count(&f.db, "sales").await, 1);
        assert_eq!(count(&f.db, "sale_items").await, 1);
        assert_eq!(count(&f.db, "sale_payments").await, 1);

        // Without a key every call is a new sale.
        let req = request(vec![line(&f.soda, 2)], vec![pay("cash", 700)]);
        f.engine.commit_sale(&f.ctx, req.clone()).await.unwrap();
        f.engine.commit_sale(&f.ctx, req).await.unwrap();
        assert_eq!(count(&f.db, "sales").await, 3);
    }

    // ===== Snapshots =====

    #[tokio::test]
    async fn test_committed_price_survives_catalog_change() {
        let f = setup().await;
        let sale = f
            .engine
            .commit_sale(&f.ctx, request(vec![line(&f.burger, 1)], vec![pay("cash", 1000)]))
            .await
            .unwrap();

        f.db.products()
            .update_price(&f.ctx.tenant_id().to_string(), &f.burger.id, 1500)
            .await
            .unwrap();

        let aggregate = f.engine.get_sale_aggregate(&f.ctx, &sale.id).await.unwrap();
        assert_eq!(aggregate.lines[0].item.unit_price_cents, 1000);
        assert_eq!(aggregate.sale.total_cents, 1000);
    }

    // ===== Invoice =====

    #[tokio::test]
    async fn test_render_invoice_document() {
        let f = setup().await;
        let sale = f
            .engine
            .commit_sale(
                &f.ctx,
                request(
                    vec![burger_with_cheese(&f.burger), line(&f.soda, 1)],
                    vec![
                        pay("cash", 1450),
                        PaymentRequest {
                            reference: Some("AUTH-778".to_string()),
                            ..pay("card", 1000)
                        },
                    ],
                ),
            )
            .await
            .unwrap();

        let doc = f.engine.render_invoice(&f.ctx, &sale.id).await.unwrap();
        assert_eq!(doc.filename, format!("invoice-{}.txt", sale.id));
        assert_eq!(doc.content_type, "text/plain; charset=utf-8");

        let again = f.engine.render_invoice(&f.ctx, &sale.id).await.unwrap();
        assert_eq!(doc.bytes, again.bytes);

        let text = String::from_utf8(doc.bytes).unwrap();
        assert!(text.contains(&format!("Venta #{}", &sale.id[..8])));
        assert!(text.contains("RFC/NIT: ESQ010101AAA"));
        assert!(text.contains("  + queso x1 $1.00"));
        assert!(text.contains("TOTAL: $24.50"));
        assert!(text.contains("  - Efectivo: $14.50"));
        assert!(text.contains("  - Tarjeta: $10.00 (Ref: AUTH-778)"));
    }

    #[tokio::test]
    async fn test_deleted_tenant_profile() {
        let f = setup().await;
        let sale = f
            .engine
            .commit_sale(&f.ctx, request(vec![line(&f.soda, 1)], vec![pay("cash", 350)]))
            .await
            .unwrap();

        f.db.tenants()
            .soft_delete(&f.ctx.tenant_id().to_string())
            .await
            .unwrap();

        let aggregate = f.engine.get_sale_aggregate(&f.ctx, &sale.id).await.unwrap();
        assert!(aggregate.tenant.is_none());
        assert_eq!(aggregate.sale.id, sale.id);

        let err = f.engine.render_invoice(&f.ctx, &sale.id).await.unwrap_err();
        assert_eq!(err.kind(), "NOT_FOUND");
    }

    struct BrokenProfiles;

    #[async_trait]
    impl TenantProfilePort for BrokenProfiles {
        async fn get_profile(&self, _tenant_id: TenantId) -> EngineResult<Option<TenantProfile>> {
            Err(EngineError::internal("profile service unavailable"))
        }
    }

    #[tokio::test]
    async fn test_profile_failure_is_forgiven_for_aggregate_only() {
        let f = setup().await;
        let sale = f
            .engine
            .commit_sale(&f.ctx, request(vec![line(&f.soda, 1)], vec![pay("cash", 350)]))
            .await
            .unwrap();

        let engine = SaleEngine::with_ports(
            f.db.sales(),
            Arc::new(f.db.products()),
            Arc::new(BrokenProfiles),
            InvoiceLayout::default(),
        );

        let aggregate = engine.get_sale_aggregate(&f.ctx, &sale.id).await.unwrap();
        assert!(aggregate.tenant.is_none());

        let err = engine.render_invoice(&f.ctx, &sale.id).await.unwrap_err();
        assert_eq!(err.kind(), "INTERNAL");
    }

    #[test]
    fn test_request_from_register_json() {
        let json = r#"{
            "items": [
                {"product_id": "550e8400-e29b-41d4-a716-446655440000", "quantity": 2,
                 "toppings": [{"name": "queso", "price_cents": 100, "quantity": 1}]}
            ],
            "payments": [{"method": "cash", "amount_cents": 2100}]
        }"#;

        let req: CommitSaleRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.items[0].toppings.len(), 1);
        assert!(req.items[0].notes.is_none());
        assert!(req.payments[0].reference.is_none());
        assert!(req.idempotency_key.is_none());
    }
}
