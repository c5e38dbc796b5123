//! # Invoice Rendering
//!
//! Turns a stored sale and its tenant profile into a printable ticket.
//!
//! ## Layout (48 columns)
//! ```text
//! La Esquina
//! Av. Reforma 123
//! RFC/NIT: ESQ010101AAA
//! Tel: 555-0100
//!
//! FACTURA / TICKET DE VENTA
//! Venta #9f8e7d6c
//! Fecha: 16/10/2026 14:05
//! ------------------------------------------------
//! Producto                  Cant      P.U. Subtotal
//! ------------------------------------------------
//! Hamburguesa                  2    $10.00   $21.00
//!   + queso x1 $1.00
//! ------------------------------------------------
//!                                    TOTAL: $21.00
//!
//! Metodos de pago:
//!   - Efectivo: $21.00
//! ```
//!
//! Rendering is a pure function of its inputs: no clock, no locale, no
//! environment. The same aggregate always yields the same bytes.

use chrono::{FixedOffset, Offset, Utc};
use std::borrow::Cow;

use crate::money::Money;
use crate::types::{PaymentMethod, SaleAggregate, TenantProfile};

/// Content type of [`render_invoice`] output.
pub const INVOICE_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Narrowest layout that still fits the four table columns.
pub const MIN_INVOICE_WIDTH: usize = 32;

const QTY_COL: usize = 6;
const PRICE_COL: usize = 10;
const SUBTOTAL_COL: usize = 9;

/// Printer geometry and time zone for the ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceLayout {
    /// Characters per line. Values below [`MIN_INVOICE_WIDTH`] are raised to it.
    pub width: usize,
    /// Offset applied to the sale timestamp before printing.
    pub utc_offset: FixedOffset,
}

impl Default for InvoiceLayout {
    fn default() -> Self {
        InvoiceLayout {
            width: 48,
            utc_offset: Utc.fix(),
        }
    }
}

impl InvoiceLayout {
    /// Builds a layout from a width and an offset in minutes east of UTC.
    ///
    /// Offsets outside ±24h fall back to UTC.
    pub fn new(width: usize, utc_offset_minutes: i32) -> Self {
        InvoiceLayout {
            width: width.max(MIN_INVOICE_WIDTH),
            utc_offset: FixedOffset::east_opt(utc_offset_minutes.saturating_mul(60))
                .unwrap_or_else(|| Utc.fix()),
        }
    }

    fn effective_width(&self) -> usize {
        self.width.max(MIN_INVOICE_WIDTH)
    }

    fn name_col(&self) -> usize {
        self.effective_width() - QTY_COL - PRICE_COL - SUBTOTAL_COL
    }
}

/// Invoice name of a stored payment method; unknown values are kept verbatim.
pub fn payment_label(raw: &str) -> Cow<'_, str> {
    match raw.parse::<PaymentMethod>() {
        Ok(method) => Cow::Borrowed(method.label()),
        Err(_) => Cow::Borrowed(raw),
    }
}

/// Renders the ticket for a sale.
///
/// The aggregate is trusted as stored; nothing is re-validated here.
pub fn render_invoice(
    aggregate: &SaleAggregate,
    profile: &TenantProfile,
    layout: &InvoiceLayout,
) -> Vec<u8> {
    let width = layout.effective_width();
    let rule = "-".repeat(width);
    let mut out = String::new();

    // Header
    push_line(&mut out, profile.name.trim());
    if let Some(address) = present(&profile.address) {
        push_line(&mut out, address);
    }
    if let Some(tax_id) = present(&profile.tax_id) {
        push_line(&mut out, &format!("RFC/NIT: {}", tax_id));
    }
    if let Some(phone) = present(&profile.phone) {
        push_line(&mut out, &format!("Tel: {}", phone));
    }
    push_line(&mut out, "");

    // Title and sale identification
    push_line(&mut out, "FACTURA / TICKET DE VENTA");
    push_line(&mut out, &format!("Venta #{}", aggregate.sale.short_id()));
    let local = aggregate.sale.created_at.with_timezone(&layout.utc_offset);
    push_line(&mut out, &format!("Fecha: {}", local.format("%d/%m/%Y %H:%M")));

    // Line items
    push_line(&mut out, &rule);
    push_line(&mut out, &table_row(layout, "Producto", "Cant", "P.U.", "Subtotal"));
    push_line(&mut out, &rule);
    for line in &aggregate.lines {
        let item = &line.item;
        push_line(
            &mut out,
            &table_row(
                layout,
                &item.name_snapshot,
                &item.quantity.to_string(),
                &item.unit_price().to_string(),
                &item.subtotal().to_string(),
            ),
        );
        for topping in &line.toppings {
            push_line(
                &mut out,
                &format!(
                    "  + {} x{} {}",
                    topping.name,
                    topping.quantity,
                    topping.line_total()
                ),
            );
        }
    }
    push_line(&mut out, &rule);

    // Total
    let total = format!("TOTAL: {}", aggregate.sale.total());
    push_line(&mut out, &format!("{:>width$}", total, width = width));
    push_line(&mut out, "");

    // Payment breakdown
    push_line(&mut out, "Metodos de pago:");
    for payment in &aggregate.payments {
        push_line(&mut out, &payment_line(&payment.method, payment.amount(), payment.reference.as_deref()));
    }

    out.into_bytes()
}

fn payment_line(method: &str, amount: Money, reference: Option<&str>) -> String {
    let mut line = format!("  - {}: {}", payment_label(method), amount);
    if let Some(reference) = reference.map(str::trim).filter(|r| !r.is_empty()) {
        line.push_str(&format!(" (Ref: {})", reference));
    }
    line
}

fn table_row(layout: &InvoiceLayout, name: &str, qty: &str, price: &str, subtotal: &str) -> String {
    let name_col = layout.name_col();
    format!(
        "{:<name_w$}{:>qty_w$}{:>price_w$}{:>sub_w$}",
        truncate(name, name_col - 1),
        qty,
        price,
        subtotal,
        name_w = name_col,
        qty_w = QTY_COL,
        price_w = PRICE_COL,
        sub_w = SUBTOTAL_COL,
    )
}

/// Cuts to `max` characters (not bytes), so accented names never split.
fn truncate(text: &str, max: usize) -> String {
    text.trim().chars().take(max).collect()
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn push_line(out: &mut String, text: &str) {
    out.push_str(text.trim_end());
    out.push('\n');
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Payment, Sale, SaleItem, SaleItemTopping, SaleLine, SaleStatus};
    use chrono::{TimeZone, Utc};

    const SALE_ID: &str = "9f8e7d6c-5b4a-4321-8765-0123456789ab";

    fn profile() -> TenantProfile {
        TenantProfile {
            name: "La Esquina".to_string(),
            address: Some("Av. Reforma 123".to_string()),
            tax_id: Some("ESQ010101AAA".to_string()),
            phone: Some("555-0100".to_string()),
        }
    }

    fn aggregate() -> SaleAggregate {
        let created = Utc.with_ymd_and_hms(2026, 10, 16, 14, 5, 0).unwrap();
        SaleAggregate {
            sale: Sale {
                id: SALE_ID.to_string(),
                tenant_id: "t1".to_string(),
                user_id: "u1".to_string(),
                total_cents: 2450,
                status: SaleStatus::Completed,
                idempotency_key: None,
                created_at: created,
                updated_at: created,
            },
            lines: vec![
                SaleLine {
                    item: SaleItem {
                        id: "i1".to_string(),
                        sale_id: SALE_ID.to_string(),
                        line_no: 1,
                        product_id: "p1".to_string(),
                        name_snapshot: "Hamburguesa".to_string(),
                        quantity: 2,
                        unit_price_cents: 1000,
                        subtotal_cents: 2100,
                        notes: None,
                    },
                    toppings: vec![SaleItemTopping {
                        id: "tp1".to_string(),
                        sale_item_id: "i1".to_string(),
                        position: 1,
                        name: "queso".to_string(),
                        price_cents: 100,
                        quantity: 1,
                    }],
                },
                SaleLine {
                    item: SaleItem {
                        id: "i2".to_string(),
                        sale_id: SALE_ID.to_string(),
                        line_no: 2,
                        product_id: "p2".to_string(),
                        name_snapshot: "Refresco".to_string(),
                        quantity: 1,
                        unit_price_cents: 350,
                        subtotal_cents: 350,
                        notes: None,
                    },
                    toppings: vec![],
                },
            ],
            payments: vec![
                Payment {
                    id: "pay1".to_string(),
                    sale_id: SALE_ID.to_string(),
                    position: 1,
                    method: "cash".to_string(),
                    amount_cents: 1450,
                    reference: None,
                    created_at: created,
                },
                Payment {
                    id: "pay2".to_string(),
                    sale_id: SALE_ID.to_string(),
                    position: 2,
                    method: "card".to_string(),
                    amount_cents: 1000,
                    reference: Some("AUTH-778".to_string()),
                    created_at: created,
                },
            ],
            tenant: Some(profile()),
        }
    }

    fn render_text(aggregate: &SaleAggregate, profile: &TenantProfile) -> String {
        String::from_utf8(render_invoice(aggregate, profile, &InvoiceLayout::default())).unwrap()
    }

    #[test]
    fn test_render_is_deterministic() {
        let agg = aggregate();
        let first = render_invoice(&agg, &profile(), &InvoiceLayout::default());
        let second = render_invoice(&agg, &profile(), &InvoiceLayout::default());
        assert_eq!(first, second);
    }

    #[test]
    fn test_header_and_title() {
        let text = render_text(&aggregate(), &profile());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "La Esquina");
        assert_eq!(lines[1], "Av. Reforma 123");
        assert_eq!(lines[2], "RFC/NIT: ESQ010101AAA");
        assert_eq!(lines[3], "Tel: 555-0100");
        assert_eq!(lines[5], "FACTURA / TICKET DE VENTA");
        assert_eq!(lines[6], "Venta #9f8e7d6c");
        assert_eq!(lines[7], "Fecha: 16/10/2026 14:05");
    }

    #[test]
    fn test_optional_header_lines_are_omitted() {
        let bare = TenantProfile {
            name: "La Esquina".to_string(),
            address: None,
            tax_id: Some("   ".to_string()),
            phone: Some(String::new()),
        };
        let text = render_text(&aggregate(), &bare);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "La Esquina");
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "FACTURA / TICKET DE VENTA");
        assert!(!text.contains("RFC/NIT"));
        assert!(!text.contains("Tel:"));
        assert!(text.contains("TOTAL: $24.50"));
    }

    #[test]
    fn test_toppings_follow_their_item() {
        let text = render_text(&aggregate(), &profile());
        let lines: Vec<&str> = text.lines().collect();
        let burger = lines.iter().position(|l| l.starts_with("Hamburguesa")).unwrap();

        assert_eq!(lines[burger + 1], "  + queso x1 $1.00");
        assert!(lines[burger + 2].starts_with("Refresco"));
        assert!(lines[burger].ends_with("$21.00"));
        assert!(lines[burger].contains("$10.00"));
    }

    #[test]
    fn test_payment_breakdown() {
        let text = render_text(&aggregate(), &profile());
        assert!(text.contains("Metodos de pago:\n  - Efectivo: $14.50\n  - Tarjeta: $10.00 (Ref: AUTH-778)\n"));
    }

    #[test]
    fn test_unknown_method_rendered_verbatim() {
        assert_eq!(payment_label("transfer"), "Transferencia");
        assert_eq!(payment_label("vale"), "vale");
    }

    #[test]
    fn test_table_rows_fit_width() {
        let mut agg = aggregate();
        agg.lines[0].item.name_snapshot = "Hamburguesa doble con papas y aros de cebolla".to_string();
        let text = render_text(&agg, &profile());

        for line in text.lines().filter(|l| !l.starts_with("  +")) {
            assert!(line.chars().count() <= 48, "line too wide: {:?}", line);
        }
    }

    #[test]
    fn test_utc_offset_applied_to_date() {
        let layout = InvoiceLayout::new(48, -6 * 60);
        let text = String::from_utf8(render_invoice(&aggregate(), &profile(), &layout)).unwrap();
        assert!(text.contains("Fecha: 16/10/2026 08:05"));
    }

    #[test]
    fn test_narrow_width_is_clamped() {
        let layout = InvoiceLayout::new(10, 0);
        assert_eq!(layout.width, MIN_INVOICE_WIDTH);
    }
}
