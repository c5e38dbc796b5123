//! Catalog-backed pricing: the async half of the pricing engine.
//!
//! Field checks and arithmetic live in [`comanda_core::pricing`]; this module
//! only fetches the products, all at once.

use futures::future::try_join_all;
use tracing::debug;

use comanda_core::pricing::{check_order, price_line, PricedItem};
use comanda_core::LineItemRequest;

use crate::context::TenantId;
use crate::error::EngineResult;
use crate::ports::CatalogPort;

/// Prices an order against the tenant's catalog.
///
/// Every line is field-checked before the first lookup. Lookups then run
/// concurrently; the result keeps the order of `items`. A failed lookup
/// aborts the whole order.
pub async fn price_items(
    catalog: &dyn CatalogPort,
    tenant_id: TenantId,
    items: &[LineItemRequest],
) -> EngineResult<Vec<PricedItem>> {
    let lines = check_order(items)?;

    let lookups = lines
        .iter()
        .map(|line| catalog.get_product(tenant_id, line.product_id));
    let products = try_join_all(lookups).await?;

    debug!(tenant_id = %tenant_id, lines = lines.len(), "Catalog lookups complete");

    let tenant = tenant_id.to_string();
    let priced = lines
        .into_iter()
        .zip(products)
        .map(|(line, product)| price_line(&tenant, line, product.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(priced)
}
