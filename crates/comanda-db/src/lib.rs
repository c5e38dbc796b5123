//! # comanda-db: Database Layer for Comanda
//!
//! SQLite storage for restaurants, their catalog and their sales.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Comanda Data Flow                                │
//! │                                                                         │
//! │  SaleEngine::commit_sale / get_sale_aggregate                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   comanda-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ TenantRepo    │    │ 001_initial_ │  │   │
//! │  │   │ WAL, FKs on   │    │ SaleRepo      │    │ schema.sql   │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (COMANDA_DATABASE_PATH)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use comanda_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./comanda.db")).await?;
//! let record = db.sales().get_record(&tenant_id, &sale_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, DbLocation};

pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
pub use repository::tenant::{NewTenant, TenantRepository};
