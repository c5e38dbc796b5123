//! # comanda-core: Pure Business Logic for Comanda
//!
//! Pricing, payment reconciliation and invoice layout for restaurant sales.
//! Everything here is a pure function over plain data.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Comanda Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Transport (HTTP handlers, register app)            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │      comanda-engine: commit_sale, get_sale_aggregate, invoice   │   │
//! │  └──────────────┬──────────────────────────────────┬───────────────┘   │
//! │                 │                                  │                    │
//! │  ┌──────────────▼──────────────────┐  ┌────────────▼───────────────┐   │
//! │  │  ★ comanda-core (THIS CRATE) ★  │  │  comanda-db (SQLite)       │   │
//! │  │                                 │  │  repositories, migrations, │   │
//! │  │  types · money · validation     │  │  atomic sale commit        │   │
//! │  │  pricing · invoice              │  │                            │   │
//! │  │                                 │  └────────────────────────────┘   │
//! │  │  NO I/O • NO DATABASE           │                                   │
//! │  └─────────────────────────────────┘                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, SaleItem, Payment, requests)
//! - [`money`] - Integer-cent money
//! - [`error`] - Validation errors shown to the cashier
//! - [`validation`] - Field-level checks
//! - [`pricing`] - Catalog pricing and payment reconciliation
//! - [`invoice`] - Deterministic ticket rendering
//!
//! ## Example Usage
//!
//! ```rust
//! use comanda_core::Money;
//! use comanda_core::pricing::{reconcile, ValidatedPayment};
//! use comanda_core::PaymentMethod;
//!
//! let total = Money::from_cents(2100);
//! let payments = vec![ValidatedPayment {
//!     method: PaymentMethod::Cash,
//!     amount: Money::from_cents(2100),
//!     reference: None,
//! }];
//!
//! assert!(reconcile(&payments, total).is_ok());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod invoice;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{ValidationError, ValidationResult};
pub use money::Money;
pub use types::*;
