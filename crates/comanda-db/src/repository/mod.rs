//! # Repository Module
//!
//! Database repository implementations for Comanda.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  SaleEngine (comanda-engine)                                           │
//! │       │                                                                 │
//! │       │  db.sales().commit_sale(tenant, user, items, payments, key)    │
//! │       ▼                                                                 │
//! │  SaleRepository      commit_sale, get_record, find_by_idempotency_key  │
//! │  ProductRepository   get_by_id(tenant, id), insert, update_price       │
//! │  TenantRepository    get_profile, insert, soft_delete                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Every read takes the tenant id; there is no unscoped lookup.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod product;
pub mod sale;
pub mod tenant;
