//! # Invoice Renderer
//!
//! Writes the invoice of a committed sale to disk.
//!
//! ## Usage
//! ```bash
//! cargo run -p comanda-engine --bin render-invoice -- <tenant-id> <sale-id>
//!
//! # Write somewhere else
//! cargo run -p comanda-engine --bin render-invoice -- <tenant-id> <sale-id> --out ./tickets
//! ```
//!
//! Database path, invoice width and time zone come from the `COMANDA_*`
//! environment variables.

use comanda_db::Database;
use comanda_engine::{telemetry, EngineConfig, RequestContext, SaleEngine, TenantId, UserId};
use std::env;
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut positional = Vec::new();
    let mut out_dir = PathBuf::from(".");

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--out" if i + 1 < args.len() => {
                out_dir = PathBuf::from(&args[i + 1]);
                i += 2;
            }
            other => {
                positional.push(other.to_string());
                i += 1;
            }
        }
    }

    let (tenant_id, sale_id) = match positional.as_slice() {
        [tenant, sale] => (tenant.parse::<TenantId>()?, sale.clone()),
        _ => {
            eprintln!("usage: render-invoice <tenant-id> <sale-id> [--out <dir>]");
            std::process::exit(2);
        }
    };

    let config = EngineConfig::load()?;
    telemetry::init(&config);

    let db = Database::new(config.db_config()).await?;
    let engine = SaleEngine::new(&db, config.invoice_layout());

    // Reading needs only the tenant; the operator is recorded as nobody.
    let ctx = RequestContext::new(tenant_id, UserId::from_uuid(Uuid::nil()));

    let invoice = engine.render_invoice(&ctx, &sale_id).await?;
    let path = out_dir.join(&invoice.filename);
    std::fs::write(&path, &invoice.bytes)?;

    info!(path = %path.display(), bytes = invoice.bytes.len(), "Invoice written");
    println!("{}", path.display());

    db.close().await;
    Ok(())
}
