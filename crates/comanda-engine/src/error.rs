//! # Engine Error Type
//!
//! The one error type every engine operation returns.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ValidationError (comanda-core) ──► EngineError::Validation            │
//! │                                                                         │
//! │  DbError (comanda-db)                                                  │
//! │   ├── NotFound          ──► EngineError::NotFound                      │
//! │   ├── UniqueViolation   ──► EngineError::Conflict                      │
//! │   ├── PartialCommit     ──► EngineError::Internal "partial commit"     │
//! │   └── anything else     ──► EngineError::Internal (details logged)     │
//! │                                                                         │
//! │  EngineError::response() ──► { code, message, field? } for transport   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Internal details never reach the caller: they are logged here with
//! `tracing::error!` and replaced by a generic message.

use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

use comanda_core::ValidationError;
use comanda_db::DbError;

/// Errors returned by [`crate::SaleEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The request was rejected before anything was written. Never retried.
    #[error("{message}")]
    Validation { field: String, message: String },

    /// The entity does not exist for this tenant.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A uniqueness rule was violated.
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Storage or transport failure.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl EngineError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        EngineError::Internal {
            message: message.into(),
        }
    }

    /// Stable machine-readable code.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Validation { .. } => "VALIDATION_ERROR",
            EngineError::NotFound { .. } => "NOT_FOUND",
            EngineError::Conflict { .. } => "CONFLICT",
            EngineError::Internal { .. } => "INTERNAL",
        }
    }

    /// The offending request field, for validation errors.
    pub fn field(&self) -> Option<&str> {
        match self {
            EngineError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Serializable form for the transport layer.
    pub fn response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.kind().to_string(),
            message: self.to_string(),
            field: self.field().map(str::to_string),
        }
    }
}

/// What a client receives when an engine call fails.
///
/// ```json
/// { "code": "VALIDATION_ERROR", "message": "product_id: producto inactivo (…)", "field": "product_id" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Validation {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            DbError::UniqueViolation { field, value } => EngineError::Conflict {
                message: format!("{} '{}' already exists", field, value),
            },
            DbError::PartialCommit {
                sale_id,
                stage,
                reason,
            } => {
                tracing::error!(
                    sale_id = %sale_id,
                    stage = %stage,
                    reason = %reason,
                    "Sale rolled back after partial write"
                );
                EngineError::internal("partial commit")
            }
            unavailable if unavailable.is_unavailable() => {
                tracing::error!(error = %unavailable, "Database unavailable");
                EngineError::internal("database unavailable")
            }
            other => {
                tracing::error!(error = %other, "Database operation failed");
                EngineError::internal("database operation failed")
            }
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
