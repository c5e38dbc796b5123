//! # Error Types
//!
//! Domain errors for comanda-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  comanda-core (this file)                                              │
//! │  └── ValidationError  - order rejected before anything is written      │
//! │                                                                         │
//! │  comanda-db                                                            │
//! │  └── DbError          - storage failures, partial commits              │
//! │                                                                         │
//! │  comanda-engine                                                        │
//! │  └── EngineError      - Validation / NotFound / Conflict / Internal    │
//! │                                                                         │
//! │  Flow: ValidationError ─┐                                              │
//! │                         ├──► EngineError ──► transport layer           │
//! │        DbError ─────────┘                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Messages are shown to the cashier, so they are written in Spanish and
//! always start with the offending field.

use thiserror::Error;

use crate::money::Money;

/// Input validation errors raised while pricing and reconciling an order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("{field}: es obligatorio")]
    Required { field: String },

    /// A list that needs at least one element is empty.
    #[error("{field}: se requiere al menos un elemento")]
    Empty { field: String },

    /// Value must be strictly greater than zero.
    #[error("{field}: debe ser mayor que cero")]
    MustBePositive { field: String },

    /// Value must not be below zero.
    #[error("{field}: no puede ser negativo")]
    Negative { field: String },

    /// Invalid format (e.g., malformed UUID).
    #[error("{field}: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in the allowed set.
    #[error("{field}: debe ser uno de: {}", allowed.join(", "))]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Amount arithmetic left the representable range.
    #[error("{field}: importe fuera de rango")]
    Overflow { field: String },

    /// The referenced product does not exist in the tenant's catalog.
    #[error("product_id: producto no encontrado ({product_id})")]
    UnknownProduct { product_id: String },

    /// A line asks for zero or fewer units. Reported against the product
    /// the line refers to.
    #[error("product_id: cantidad debe ser mayor que cero ({quantity})")]
    InvalidQuantity { quantity: i64 },

    /// The referenced product exists but is not for sale.
    #[error("product_id: producto inactivo ({product_id})")]
    InactiveProduct { product_id: String },

    /// Payment splits do not add up to the sale total within tolerance.
    #[error("payments: la suma de pagos ({paid}) debe coincidir con el total ({total})")]
    PaymentMismatch { total: Money, paid: Money },
}

impl ValidationError {
    /// The request field this error refers to.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::Empty { field }
            | ValidationError::MustBePositive { field }
            | ValidationError::Negative { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. }
            | ValidationError::Overflow { field } => field,
            ValidationError::UnknownProduct { .. }
            | ValidationError::InactiveProduct { .. }
            | ValidationError::InvalidQuantity { .. } => "product_id",
            ValidationError::PaymentMismatch { .. } => "payments",
        }
    }

    pub(crate) fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    pub(crate) fn empty(field: &str) -> Self {
        ValidationError::Empty {
            field: field.to_string(),
        }
    }

    pub(crate) fn must_be_positive(field: &str) -> Self {
        ValidationError::MustBePositive {
            field: field.to_string(),
        }
    }

    pub(crate) fn negative(field: &str) -> Self {
        ValidationError::Negative {
            field: field.to_string(),
        }
    }

    pub(crate) fn overflow(field: &str) -> Self {
        ValidationError::Overflow {
            field: field.to_string(),
        }
    }
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================
