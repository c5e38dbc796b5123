//! # Domain Types
//!
//! Core domain types used throughout Comanda.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Tenant       │   │    Product      │   │      Sale       │       │
//! │  │  (restaurant)   │   │  (read model)   │   │  ─────────────  │       │
//! │  │  name, tax_id   │   │  price_cents    │   │  total_cents    │       │
//! │  │  address, phone │   │  is_active      │   │  status         │       │
//! │  └─────────────────┘   └─────────────────┘   └────────┬────────┘       │
//! │                                                        │ owns           │
//! │                         ┌──────────────────────────────┼──────────┐    │
//! │                         ▼                              ▼          │    │
//! │                 ┌───────────────┐             ┌──────────────┐    │    │
//! │                 │   SaleItem    │ owns        │   Payment    │    │    │
//! │                 │ unit_price    │────────┐    │ method       │    │    │
//! │                 │ subtotal      │        │    │ amount_cents │    │    │
//! │                 └───────────────┘        ▼    └──────────────┘    │    │
//! │                               ┌──────────────────┐                │    │
//! │                               │ SaleItemTopping  │                │    │
//! │                               │ name, price, qty │                │    │
//! │                               └──────────────────┘                │    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every entity carries a `tenant_id` (directly or through its sale) and a
//! UUID v4 `id`. Sales and their dependents are append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Tenant
// =============================================================================

/// A restaurant account: the isolation boundary for all other data.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
    pub logo_url: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// The part of the tenant printed on invoices.
    pub fn profile(&self) -> TenantProfile {
        TenantProfile {
            name: self.name.clone(),
            address: self.address.clone(),
            tax_id: self.tax_id.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// Display/billing profile of a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TenantProfile {
    pub name: String,
    pub address: Option<String>,
    /// Printed as "RFC/NIT" on the invoice.
    pub tax_id: Option<String>,
    pub phone: Option<String>,
}

// =============================================================================
// Product
// =============================================================================

/// A catalog entry. Read-only for the engine; its price is authoritative.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub tenant_id: String,
    pub category_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    /// Price in cents.
    pub price_cents: i64,
    pub image_url: Option<String>,
    /// Inactive products stay in the catalog but cannot be sold.
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale.
///
/// The engine settles immediately, so every committed sale is `Completed`.
/// `Pending` and `Cancelled` exist in the schema for adjacent flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Pending,
    Completed,
    Cancelled,
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Completed
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// Accepted payment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::Transfer,
    ];

    /// Stored/wire representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Transfer => "transfer",
        }
    }

    /// Name printed on the invoice.
    pub const fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Efectivo",
            PaymentMethod::Card => "Tarjeta",
            PaymentMethod::Transfer => "Transferencia",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the wire value, ignoring surrounding whitespace and case.
impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == normalized)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "method".to_string(),
                allowed: PaymentMethod::ALL
                    .iter()
                    .map(|m| m.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub tenant_id: String,
    /// Cashier who rang up the sale.
    pub user_id: String,
    /// Always equals the sum of the line subtotals.
    pub total_cents: i64,
    pub status: SaleStatus,
    /// Caller-supplied retry token, unique per tenant.
    pub idempotency_key: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// First eight hex characters of the id, printed as the ticket number.
    pub fn short_id(&self) -> String {
        self.id.chars().take(8).collect()
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item of a sale.
///
/// Snapshot pattern: `name_snapshot` and `unit_price_cents` are copied from the
/// catalog at commit time and never follow later catalog edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    /// Position in the submitted order, starting at 1.
    pub line_no: i64,
    pub product_id: String,
    pub name_snapshot: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// unit_price × quantity + Σ topping.price × topping.quantity
    pub subtotal_cents: i64,
    pub notes: Option<String>,
}

impl SaleItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

/// An extra on a line item (e.g. "queso extra"). No catalog backing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItemTopping {
    pub id: String,
    pub sale_item_id: String,
    pub position: i64,
    pub name: String,
    pub price_cents: i64,
    pub quantity: i64,
}

impl SaleItemTopping {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// price × quantity, as printed on the invoice sub-line.
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.price_cents.saturating_mul(self.quantity))
    }
}

// =============================================================================
// Payment
// =============================================================================

/// One split of the settlement of a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub sale_id: String,
    pub position: i64,
    /// Stored as text. Written from [`PaymentMethod`], but rows are read back
    /// verbatim so values outside the enum survive a round trip.
    pub method: String,
    pub amount_cents: i64,
    /// External reference (card auth code, transfer id).
    pub reference: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Payment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    /// The method as a known enum value, if it is one.
    pub fn method(&self) -> Option<PaymentMethod> {
        self.method.parse().ok()
    }
}

// =============================================================================
// Aggregates
// =============================================================================

/// A line item with its toppings, in position order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLine {
    pub item: SaleItem,
    pub toppings: Vec<SaleItemTopping>,
}

/// A sale and everything it owns, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleRecord {
    pub sale: Sale,
    pub lines: Vec<SaleLine>,
    pub payments: Vec<Payment>,
}

/// A sale record together with the tenant profile, fetched as one unit.
///
/// `tenant` is `None` when the profile lookup failed; the sale itself is
/// still returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleAggregate {
    pub sale: Sale,
    pub lines: Vec<SaleLine>,
    pub payments: Vec<Payment>,
    pub tenant: Option<TenantProfile>,
}

impl SaleAggregate {
    pub fn from_record(record: SaleRecord, tenant: Option<TenantProfile>) -> Self {
        SaleAggregate {
            sale: record.sale,
            lines: record.lines,
            payments: record.payments,
            tenant,
        }
    }
}

// =============================================================================
// Order Input
// =============================================================================

/// A line of a submitted order, as received from the register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItemRequest {
    /// Product UUID as text; parsed and validated server-side.
    pub product_id: String,
    pub quantity: i64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub toppings: Vec<ToppingRequest>,
}

/// A topping of a submitted line. Price and quantity are taken as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ToppingRequest {
    pub name: String,
    pub price_cents: i64,
    pub quantity: i64,
}

/// A payment split of a submitted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentRequest {
    /// "cash", "card" or "transfer".
    pub method: String,
    pub amount_cents: i64,
    #[serde(default)]
    pub reference: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================
