//! # Validation Module
//!
//! Field-level checks applied to an order before any catalog lookup or write.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Register (TypeScript)                                        │
//! │  └── Immediate cashier feedback                                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE + pricing                                        │
//! │  ├── Field checks (quantity, prices, ids)                              │
//! │  └── Catalog price authority, payment reconciliation                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (quantity > 0, amount > 0)                      │
//! │  └── Foreign keys (item → sale, topping → item)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use comanda_core::validation::{parse_product_id, validate_quantity};
//!
//! assert!(validate_quantity(2).is_ok());
//! assert!(parse_product_id("not-a-uuid").is_err());
//! ```

use uuid::Uuid;

use crate::error::{ValidationError, ValidationResult};

/// Longest accepted idempotency key.
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 128;

/// Parses the product reference of a line.
///
/// ```rust
/// use comanda_core::validation::parse_product_id;
///
/// assert!(parse_product_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(parse_product_id("").is_err());
/// ```
pub fn parse_product_id(raw: &str) -> ValidationResult<Uuid> {
    let raw = raw.trim();

    if raw.is_empty() {
        return Err(ValidationError::required("product_id"));
    }

    Uuid::parse_str(raw).map_err(|_| ValidationError::InvalidFormat {
        field: "product_id".to_string(),
        reason: "UUID inválido".to_string(),
    })
}

/// Validates a line quantity: must be positive. A bad quantity is reported
/// under `product_id`, the line's identifying field.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::InvalidQuantity { quantity: qty });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed (free extras).
///
/// ```rust
/// use comanda_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents("unit_price", 1099).is_ok());
/// assert!(validate_price_cents("unit_price", 0).is_ok());
/// assert!(validate_price_cents("unit_price", -100).is_err());
/// ```
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::negative(field));
    }

    Ok(())
}

/// Validates a payment amount in cents: must be positive.
pub fn validate_payment_amount(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::must_be_positive("amount"));
    }

    Ok(())
}

/// Validates a topping name: must not be blank. Returns it trimmed.
pub fn validate_topping_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("toppings.name"));
    }

    Ok(name.to_string())
}

/// Normalizes an optional idempotency key.
///
/// Blank keys count as absent. Keys longer than
/// [`MAX_IDEMPOTENCY_KEY_LEN`] are rejected.
pub fn normalize_idempotency_key(key: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(key) = key.map(str::trim).filter(|k| !k.is_empty()) else {
        return Ok(None);
    };

    if key.len() > MAX_IDEMPOTENCY_KEY_LEN {
        return Err(ValidationError::InvalidFormat {
            field: "idempotency_key".to_string(),
            reason: format!("máximo {} caracteres", MAX_IDEMPOTENCY_KEY_LEN),
        });
    }

    Ok(Some(key.to_string()))
}

/// Trims free text; blank becomes `None`.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_product_id() {
        assert!(parse_product_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(parse_product_id(" 550e8400-e29b-41d4-a716-446655440000 ").is_ok());

        let err = parse_product_id("123").unwrap_err();
        assert_eq!(err.field(), "product_id");
        assert_eq!(err.to_string(), "product_id: UUID inválido");

        assert!(matches!(
            parse_product_id("   "),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(250).is_ok());
        assert_eq!(validate_quantity(0).unwrap_err().field(), "product_id");
        assert!(validate_quantity(-3).is_err());
    }

    #[test]
    fn test_validate_payment_amount() {
        assert!(validate_payment_amount(1).is_ok());
        assert!(validate_payment_amount(0).is_err());
        assert!(validate_payment_amount(-500).is_err());
    }

    #[test]
    fn test_validate_topping_name() {
        assert_eq!(validate_topping_name("  queso ").unwrap(), "queso");
        assert!(validate_topping_name("").is_err());
    }

    #[test]
    fn test_normalize_idempotency_key() {
        assert_eq!(normalize_idempotency_key(None).unwrap(), None);
        assert_eq!(normalize_idempotency_key(Some("  ")).unwrap(), None);
        assert_eq!(
            normalize_idempotency_key(Some(" order-42 ")).unwrap(),
            Some("order-42".to_string())
        );
        let long = "k".repeat(MAX_IDEMPOTENCY_KEY_LEN + 1);
        assert!(normalize_idempotency_key(Some(&long)).is_err());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some(" sin cebolla ")), Some("sin cebolla".to_string()));
        assert_eq!(non_blank(Some("")), None);
        assert_eq!(non_blank(None), None);
    }
}
