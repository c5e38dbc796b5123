//! # comanda-engine: Sale Transaction Engine
//!
//! Commits restaurant sales for many tenants and serves them back, either
//! as a structured aggregate or as a printable invoice.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Comanda Sale Flow                                │
//! │                                                                         │
//! │  Register / API layer (authenticates, builds RequestContext)           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  comanda-engine (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │  SaleEngine   │    │   pricing     │    │    ports     │  │   │
//! │  │   │ (service.rs)  │───►│ catalog fetch │───►│ CatalogPort  │  │   │
//! │  │   │               │    │ try_join_all  │    │ ProfilePort  │  │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           │                                                     │   │
//! │  └───────────┼─────────────────────────────────────────────────────┘   │
//! │              ▼                                                          │
//! │  comanda-db: SaleRepository (one transaction per sale)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`service`] - `SaleEngine`: commit, aggregate, invoice
//! - [`pricing`] - Concurrent catalog lookups feeding the core pricer
//! - [`ports`] - Catalog and tenant profile seams
//! - [`adapters`] - Port implementations over comanda-db repositories
//! - [`context`] - Authenticated tenant/user identity
//! - [`error`] - Engine error kinds and their wire shape
//! - [`config`] - Environment configuration
//! - [`telemetry`] - Tracing subscriber setup
//!
//! ## Usage
//!
//! ```rust,ignore
//! use comanda_engine::{CommitSaleRequest, EngineConfig, RequestContext, SaleEngine};
//! use comanda_db::Database;
//!
//! let config = EngineConfig::load()?;
//! comanda_engine::telemetry::init(&config);
//!
//! let db = Database::new(config.db_config()).await?;
//! let engine = SaleEngine::new(&db, config.invoice_layout());
//!
//! let sale = engine.commit_sale(&ctx, request).await?;
//! let invoice = engine.render_invoice(&ctx, &sale.id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod adapters;
pub mod config;
pub mod context;
pub mod error;
pub mod ports;
pub mod pricing;
pub mod service;
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, EngineConfig, LogFormat};
pub use context::{RequestContext, TenantId, UserId};
pub use error::{EngineError, EngineResult, ErrorResponse};
pub use ports::{CatalogPort, TenantProfilePort};
pub use service::{CommitSaleRequest, InvoiceDocument, SaleEngine};
