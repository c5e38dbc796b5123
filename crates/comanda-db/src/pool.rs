//! # Database Pool
//!
//! Opens the sale store and hands out repositories.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Sale Store                                    │
//! │                                                                         │
//! │  DbConfig ──► connect_options()  WAL, synchronous=NORMAL, foreign keys, │
//! │          │                       busy timeout                           │
//! │          └──► pool_options()     size, acquire/idle timeouts            │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │            Database { SqlitePool } ──► MIGRATOR (embedded)              │
//! │                     │                                                   │
//! │     ┌───────────────┼────────────────┐                                  │
//! │     ▼               ▼                ▼                                  │
//! │  products()      tenants()        sales()                               │
//! │  catalog reads   header/profile   one transaction per commit            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! WAL lets catalog and aggregate reads proceed while a sale is being
//! written; they see the sale only once it commits. Foreign keys are off by
//! default in SQLite and the sale cascades depend on them.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::product::ProductRepository;
use crate::repository::sale::SaleRepository;
use crate::repository::tenant::TenantRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Where the sale store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    File(PathBuf),
    /// Private to one pool; gone when the pool closes.
    Memory,
}

/// Database configuration.
///
/// ```rust
/// use comanda_db::DbConfig;
/// use std::time::Duration;
///
/// let config = DbConfig::new("./comanda.db")
///     .max_connections(8)
///     .busy_timeout(Duration::from_secs(2));
/// assert_eq!(config.max_connections, 8);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub location: DbLocation,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Wait for a free pooled connection.
    pub connect_timeout: Duration,
    /// `None` keeps idle connections forever.
    pub idle_timeout: Option<Duration>,
    /// Wait on a locked database file before failing the statement.
    pub busy_timeout: Duration,
    pub run_migrations: bool,
}

impl DbConfig {
    /// File-backed store; the file is created on first connect.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            location: DbLocation::File(path.into()),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// Fresh, isolated store for tests.
    ///
    /// A single connection that never idles out, since the data lives and
    /// dies with it.
    pub fn in_memory() -> Self {
        DbConfig {
            location: DbLocation::Memory,
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: None,
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// Pool size. Ignored for [`DbLocation::Memory`], which always uses one
    /// connection.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let base = match &self.location {
            DbLocation::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true),
            // Each parse names a new database, so pools never share one.
            DbLocation::Memory => SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?,
        };

        Ok(base
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout))
    }

    /// Connection count the pool will actually use.
    ///
    /// An in-memory database belongs to the connection that opened it, so a
    /// `Memory` store always gets exactly one, whatever was configured.
    fn effective_max_connections(&self) -> u32 {
        match self.location {
            DbLocation::Memory => 1,
            DbLocation::File(_) => self.max_connections,
        }
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        let max = self.effective_max_connections();
        let options = SqlitePoolOptions::new()
            .max_connections(max)
            .min_connections(self.min_connections.min(max))
            .acquire_timeout(self.connect_timeout)
            .idle_timeout(self.idle_timeout);

        match self.location {
            DbLocation::Memory => options.max_lifetime(None),
            DbLocation::File(_) => options,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the sale store. Clones share the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connects and, unless disabled, brings the schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(location = ?config.location, "Opening sale store");

        let pool = config
            .pool_options()
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(
            max_connections = config.effective_max_connections(),
            busy_timeout_ms = config.busy_timeout.as_millis() as u64,
            "Pool ready"
        );

        let db = Database { pool };
        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies pending migrations. Safe to repeat.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await?;
        info!("Schema up to date");
        Ok(())
    }

    /// `(known, applied)` migration counts.
    pub async fn migration_status(&self) -> DbResult<(usize, usize)> {
        migrations::migration_status(&self.pool).await
    }

    /// Raw pool, for code that needs SQL the repositories don't offer.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn tenants(&self) -> TenantRepository {
        TenantRepository::new(self.pool.clone())
    }

    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    /// Waits for checked-out connections and closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Sale store closed");
    }

    /// Whether a trivial statement still runs.
    pub async fn health_check(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}
