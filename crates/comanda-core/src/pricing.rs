//! # Pricing & Reconciliation
//!
//! Pure rules that turn a submitted order into authoritative amounts.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  LineItemRequest[]                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  check_order()  ── ids parse, qty > 0, toppings sane (no I/O)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  catalog lookups (comanda-engine, concurrent, order preserved)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  price_line()   ── exists? active? catalog price × qty + toppings      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  sale_total()  ──► reconcile(payments, total)  ── |Σ paid − total| ≤ 1¢ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The client never supplies a product price. Topping prices are the one
//! exception: toppings have no catalog entry, so their price and quantity are
//! accepted as sent.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ValidationError, ValidationResult};
use crate::money::Money;
use crate::types::{LineItemRequest, PaymentMethod, PaymentRequest, Product, ToppingRequest};
use crate::validation::{
    non_blank, parse_product_id, validate_payment_amount, validate_price_cents,
    validate_quantity, validate_topping_name,
};

/// Fixed absolute tolerance between the payment sum and the sale total.
///
/// Absolute rather than relative, whatever the size of the sale.
pub const RECONCILIATION_TOLERANCE: Money = Money::from_cents(1);

// =============================================================================
// Priced Output
// =============================================================================

/// A topping that survived validation (quantity > 0).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedTopping {
    pub name: String,
    pub price: Money,
    pub quantity: i64,
}

/// A line that passed field checks but has not been priced yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedLine {
    pub product_id: Uuid,
    pub quantity: i64,
    pub notes: Option<String>,
    pub toppings: Vec<PricedTopping>,
}

/// A line priced against the catalog, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedItem {
    pub product_id: String,
    /// Catalog name at pricing time.
    pub name: String,
    pub quantity: i64,
    /// Catalog price at pricing time.
    pub unit_price: Money,
    pub subtotal: Money,
    pub notes: Option<String>,
    pub toppings: Vec<PricedTopping>,
}

/// A payment split that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedPayment {
    pub method: PaymentMethod,
    pub amount: Money,
    pub reference: Option<String>,
}

// =============================================================================
// Line Checks
// =============================================================================

/// Field checks for every line of an order.
///
/// Fails on the first invalid line. An empty order is rejected.
pub fn check_order(items: &[LineItemRequest]) -> ValidationResult<Vec<CheckedLine>> {
    if items.is_empty() {
        return Err(ValidationError::empty("items"));
    }

    items.iter().map(check_line).collect()
}

/// Field checks for a single line. No catalog access.
///
/// Toppings with `quantity <= 0` are dropped here, before their other fields
/// are looked at.
pub fn check_line(request: &LineItemRequest) -> ValidationResult<CheckedLine> {
    let product_id = parse_product_id(&request.product_id)?;
    validate_quantity(request.quantity)?;

    let toppings = request
        .toppings
        .iter()
        .filter(|t| t.quantity > 0)
        .map(check_topping)
        .collect::<ValidationResult<Vec<_>>>()?;

    Ok(CheckedLine {
        product_id,
        quantity: request.quantity,
        notes: non_blank(request.notes.as_deref()),
        toppings,
    })
}

fn check_topping(topping: &ToppingRequest) -> ValidationResult<PricedTopping> {
    let name = validate_topping_name(&topping.name)?;
    validate_price_cents("toppings.price", topping.price_cents)?;

    Ok(PricedTopping {
        name,
        price: Money::from_cents(topping.price_cents),
        quantity: topping.quantity,
    })
}

// =============================================================================
// Pricing
// =============================================================================

/// Prices a checked line against its catalog entry.
///
/// `product` is what the catalog returned for `line.product_id` in the
/// requesting tenant. A product belonging to another tenant is treated as
/// absent.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use comanda_core::pricing::{check_line, price_line};
/// use comanda_core::{LineItemRequest, Product, ToppingRequest};
///
/// let product = Product {
///     id: "550e8400-e29b-41d4-a716-446655440000".into(),
///     tenant_id: "t1".into(),
///     category_id: None,
///     name: "Hamburguesa".into(),
///     description: None,
///     price_cents: 1000,
///     image_url: None,
///     is_active: true,
///     created_at: Utc::now(),
///     updated_at: Utc::now(),
/// };
/// let line = check_line(&LineItemRequest {
///     product_id: product.id.clone(),
///     quantity: 2,
///     notes: None,
///     toppings: vec![ToppingRequest { name: "queso".into(), price_cents: 100, quantity: 1 }],
/// })
/// .unwrap();
///
/// let priced = price_line("t1", line, Some(&product)).unwrap();
/// assert_eq!(priced.subtotal.cents(), 2100);
/// ```
pub fn price_line(
    tenant_id: &str,
    line: CheckedLine,
    product: Option<&Product>,
) -> ValidationResult<PricedItem> {
    let product_id = line.product_id.to_string();

    let product = match product {
        Some(p) if p.tenant_id == tenant_id => p,
        _ => return Err(ValidationError::UnknownProduct { product_id }),
    };

    if !product.is_active {
        return Err(ValidationError::InactiveProduct { product_id });
    }

    validate_price_cents("unit_price", product.price_cents)?;

    let unit_price = product.price();
    let mut subtotal = unit_price
        .checked_mul_quantity(line.quantity)
        .ok_or_else(|| ValidationError::overflow("subtotal"))?;

    for topping in &line.toppings {
        subtotal = topping
            .price
            .checked_mul_quantity(topping.quantity)
            .and_then(|extra| subtotal.checked_add(extra))
            .ok_or_else(|| ValidationError::overflow("subtotal"))?;
    }

    Ok(PricedItem {
        product_id,
        name: product.name.clone(),
        quantity: line.quantity,
        unit_price,
        subtotal,
        notes: line.notes,
        toppings: line.toppings,
    })
}

/// Sum of the line subtotals.
pub fn sale_total(items: &[PricedItem]) -> ValidationResult<Money> {
    items.iter().try_fold(Money::zero(), |acc, item| {
        acc.checked_add(item.subtotal)
            .ok_or_else(|| ValidationError::overflow("total"))
    })
}

// =============================================================================
// Reconciliation
// =============================================================================

/// Validates each payment split: known method, positive amount.
///
/// An empty list is rejected.
pub fn validate_payments(payments: &[PaymentRequest]) -> ValidationResult<Vec<ValidatedPayment>> {
    if payments.is_empty() {
        return Err(ValidationError::empty("payments"));
    }

    payments
        .iter()
        .map(|p| {
            let method: PaymentMethod = p.method.parse()?;
            validate_payment_amount(p.amount_cents)?;

            Ok(ValidatedPayment {
                method,
                amount: Money::from_cents(p.amount_cents),
                reference: non_blank(p.reference.as_deref()),
            })
        })
        .collect()
}

/// Checks that the payment splits settle `total` within
/// [`RECONCILIATION_TOLERANCE`].
///
/// ```rust
/// use comanda_core::money::Money;
/// use comanda_core::pricing::{reconcile, ValidatedPayment};
/// use comanda_core::PaymentMethod;
///
/// let cash = |cents| ValidatedPayment {
///     method: PaymentMethod::Cash,
///     amount: Money::from_cents(cents),
///     reference: None,
/// };
/// let total = Money::from_cents(2100);
///
/// assert!(reconcile(&[cash(2100)], total).is_ok());
/// assert!(reconcile(&[cash(2099)], total).is_ok());
/// assert!(reconcile(&[cash(2000)], total).is_err());
/// ```
pub fn reconcile(payments: &[ValidatedPayment], total: Money) -> ValidationResult<()> {
    if payments.is_empty() {
        return Err(ValidationError::empty("payments"));
    }

    let paid = payments.iter().try_fold(Money::zero(), |acc, p| {
        acc.checked_add(p.amount)
            .ok_or_else(|| ValidationError::overflow("payments"))
    })?;

    if paid.distance(total) > RECONCILIATION_TOLERANCE {
        return Err(ValidationError::PaymentMismatch { total, paid });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const TENANT: &str = "tenant-a";
    const BURGER_ID: &str = "550e8400-e29b-41d4-a716-446655440000";

    fn product(price_cents: i64, is_active: bool) -> Product {
        Product {
            id: BURGER_ID.to_string(),
            tenant_id: TENANT.to_string(),
            category_id: None,
            name: "Hamburguesa".to_string(),
            description: None,
            price_cents,
            image_url: None,
            is_active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn line(quantity: i64, toppings: Vec<ToppingRequest>) -> LineItemRequest {
        LineItemRequest {
            product_id: BURGER_ID.to_string(),
            quantity,
            notes: None,
            toppings,
        }
    }

    fn topping(name: &str, price_cents: i64, quantity: i64) -> ToppingRequest {
        ToppingRequest {
            name: name.to_string(),
            price_cents,
            quantity,
        }
    }

    fn payment(method: &str, amount_cents: i64) -> PaymentRequest {
        PaymentRequest {
            method: method.to_string(),
            amount_cents,
            reference: None,
        }
    }

    #[test]
    fn test_line_with_topping_is_priced_from_catalog() {
        let checked = check_line(&line(2, vec![topping("queso", 100, 1)])).unwrap();
        let priced = price_line(TENANT, checked, Some(&product(1000, true))).unwrap();

        assert_eq!(priced.unit_price.cents(), 1000);
        assert_eq!(priced.subtotal.cents(), 2100);
        assert_eq!(priced.name, "Hamburguesa");
        assert_eq!(priced.toppings.len(), 1);
    }

    #[test]
    fn test_toppings_without_quantity_are_dropped() {
        let checked = check_line(&line(
            1,
            vec![
                topping("queso", 100, 0),
                topping("tocino", 250, -2),
                topping("", -1, 0),
                topping("aguacate", 300, 2),
            ],
        ))
        .unwrap();

        assert_eq!(checked.toppings.len(), 1);
        let priced = price_line(TENANT, checked, Some(&product(1000, true))).unwrap();
        assert_eq!(priced.subtotal.cents(), 1000 + 600);
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let err = check_line(&line(0, vec![])).unwrap_err();
        assert_eq!(err.field(), "product_id");
        assert!(err.to_string().contains("cantidad debe ser mayor que cero"));

        let err = check_line(&line(-2, vec![])).unwrap_err();
        assert_eq!(err, ValidationError::InvalidQuantity { quantity: -2 });
    }

    #[test]
    fn test_negative_topping_price_rejected() {
        let err = check_line(&line(1, vec![topping("queso", -100, 1)])).unwrap_err();
        assert_eq!(err.field(), "toppings.price");
    }

    #[test]
    fn test_negative_catalog_price_rejected() {
        let checked = check_line(&line(1, vec![])).unwrap();
        let err = price_line(TENANT, checked, Some(&product(-1, true))).unwrap_err();
        assert_eq!(err.field(), "unit_price");
    }

    #[test]
    fn test_inactive_product_rejected() {
        let checked = check_line(&line(1, vec![])).unwrap();
        let err = price_line(TENANT, checked, Some(&product(1000, false))).unwrap_err();
        assert!(matches!(err, ValidationError::InactiveProduct { .. }));
        assert!(err.to_string().contains("producto inactivo"));
    }

    #[test]
    fn test_missing_or_foreign_product_is_unknown() {
        let checked = check_line(&line(1, vec![])).unwrap();
        let err = price_line(TENANT, checked.clone(), None).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownProduct { .. }));

        let err = price_line("tenant-b", checked, Some(&product(1000, true))).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownProduct { .. }));
    }

    #[test]
    fn test_overflowing_line_rejected() {
        let checked = check_line(&line(i64::MAX, vec![])).unwrap();
        let err = price_line(TENANT, checked, Some(&product(1000, true))).unwrap_err();
        assert!(matches!(err, ValidationError::Overflow { .. }));
    }

    #[test]
    fn test_empty_order_rejected() {
        let err = check_order(&[]).unwrap_err();
        assert_eq!(err.field(), "items");
    }

    #[test]
    fn test_sale_total_sums_subtotals() {
        let burger = product(1000, true);
        let items: Vec<PricedItem> = [line(2, vec![topping("queso", 100, 1)]), line(1, vec![])]
            .iter()
            .map(|l| price_line(TENANT, check_line(l).unwrap(), Some(&burger)).unwrap())
            .collect();

        assert_eq!(sale_total(&items).unwrap().cents(), 3100);
    }

    #[test]
    fn test_payments_validation() {
        assert_eq!(validate_payments(&[]).unwrap_err().field(), "payments");
        assert_eq!(
            validate_payments(&[payment("cheque", 100)]).unwrap_err().field(),
            "method"
        );
        assert_eq!(
            validate_payments(&[payment("cash", 0)]).unwrap_err().field(),
            "amount"
        );

        let ok = validate_payments(&[payment("cash", 1000), payment("card", 1100)]).unwrap();
        assert_eq!(ok[1].method, PaymentMethod::Card);
    }

    #[test]
    fn test_reconcile_split_tender() {
        let payments =
            validate_payments(&[payment("cash", 1000), payment("transfer", 1100)]).unwrap();
        assert!(reconcile(&payments, Money::from_cents(2100)).is_ok());
    }

    #[test]
    fn test_reconcile_tolerance_is_one_cent() {
        let total = Money::from_cents(2100);
        let over = validate_payments(&[payment("cash", 2101)]).unwrap();
        let under = validate_payments(&[payment("cash", 2099)]).unwrap();
        let far = validate_payments(&[payment("cash", 2102)]).unwrap();

        assert!(reconcile(&over, total).is_ok());
        assert!(reconcile(&under, total).is_ok());
        assert!(matches!(
            reconcile(&far, total),
            Err(ValidationError::PaymentMismatch { .. })
        ));
    }

    #[test]
    fn test_reconcile_underpayment() {
        let payments = validate_payments(&[payment("cash", 2000)]).unwrap();
        let err = reconcile(&payments, Money::from_cents(2100)).unwrap_err();
        assert_eq!(err.field(), "payments");
    }
}
