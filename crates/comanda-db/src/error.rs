//! # Storage Errors
//!
//! What can go wrong between the engine and SQLite, sorted by what the
//! caller can do about it.
//!
//! ```text
//! ┌───────────────────────────┬───────────────────────────────────────────┐
//! │ DbError                   │ Engine sees                               │
//! ├───────────────────────────┼───────────────────────────────────────────┤
//! │ NotFound                  │ NotFound                                  │
//! │ UniqueViolation           │ Conflict (or an idempotent replay)        │
//! │ PartialCommit             │ Internal "partial commit", rolled back    │
//! │ PoolExhausted /           │ Internal "database unavailable"           │
//! │ ConnectionFailed          │                                           │
//! │ everything else           │ Internal "database operation failed"      │
//! └───────────────────────────┴───────────────────────────────────────────┘
//! ```

use sqlx::error::ErrorKind;
use std::fmt;
use thiserror::Error;

/// Schema rule a write broke, other than uniqueness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    ForeignKey,
    NotNull,
    Check,
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Constraint::ForeignKey => "foreign key",
            Constraint::NotNull => "not null",
            Constraint::Check => "check",
        })
    }
}

/// Storage errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Row absent, soft-deleted, or owned by another tenant.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Duplicate restaurant e-mail, or an idempotency key already used by
    /// the tenant.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    #[error("{constraint} constraint failed: {message}")]
    ConstraintViolation {
        constraint: Constraint,
        message: String,
    },

    /// A sale commit failed after its sale row was written.
    ///
    /// The transaction is already rolled back when this is returned.
    #[error("Partial commit of sale {sale_id} at {stage}: {reason}")]
    PartialCommit {
        sale_id: String,
        stage: String,
        reason: String,
    },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// BEGIN, COMMIT or a snapshot read could not run.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation { .. })
    }

    /// The database could not be reached at all, as opposed to a statement
    /// failing on a reachable database.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, DbError::PoolExhausted | DbError::ConnectionFailed(_))
    }
}

/// Columns named in SQLite's "UNIQUE constraint failed: t.a, t.b" message.
fn unique_columns(message: &str) -> String {
    message
        .split_once("UNIQUE constraint failed: ")
        .map(|(_, columns)| columns.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        let db_err = match err {
            sqlx::Error::Database(db_err) => db_err,
            sqlx::Error::RowNotFound => return DbError::not_found("Record", "unknown"),
            sqlx::Error::PoolTimedOut => return DbError::PoolExhausted,
            sqlx::Error::PoolClosed => {
                return DbError::ConnectionFailed("pool is closed".to_string())
            }
            sqlx::Error::Io(e) => return DbError::ConnectionFailed(e.to_string()),
            other => return DbError::Internal(other.to_string()),
        };

        let message = db_err.message().to_string();
        let constraint = match db_err.kind() {
            ErrorKind::UniqueViolation => {
                return DbError::UniqueViolation {
                    field: unique_columns(&message),
                    value: "unknown".to_string(),
                }
            }
            ErrorKind::ForeignKeyViolation => Constraint::ForeignKey,
            ErrorKind::NotNullViolation => Constraint::NotNull,
            ErrorKind::CheckViolation => Constraint::Check,
            _ => return DbError::QueryFailed(message),
        };

        DbError::ConstraintViolation {
            constraint,
            message,
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
