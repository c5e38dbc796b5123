//! Embedded schema migrations.
//!
//! The SQL under `migrations/sqlite/` is compiled into the binary and
//! applied in file-name order; sqlx records each one in `_sqlx_migrations`.
//! Applied files are never edited. A schema change is a new
//! `NNN_description.sql`.

use sqlx::migrate::Migrator;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies whatever has not been applied yet, each file in its own
/// transaction.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(embedded = MIGRATOR.migrations.len(), "Applying migrations");
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// `(embedded, applied)`; a store that was never migrated reports zero
/// applied.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let embedded = MIGRATOR.migrations.len();

    let tracked: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations')",
    )
    .fetch_one(pool)
    .await?;

    if !tracked {
        return Ok((embedded, 0));
    }

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
        .fetch_one(pool)
        .await?;

    Ok((embedded, usize::try_from(applied).unwrap_or(0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_status_before_and_after() {
        let db = Database::new(DbConfig::in_memory().run_migrations(false))
            .await
            .unwrap();

        let (embedded, applied) = migration_status(db.pool()).await.unwrap();
        assert!(embedded >= 1);
        assert_eq!(applied, 0);

        run_migrations(db.pool()).await.unwrap();
        run_migrations(db.pool()).await.unwrap();
        assert_eq!(migration_status(db.pool()).await.unwrap(), (embedded, embedded));
    }
}
