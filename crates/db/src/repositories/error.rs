//! Repository error type.

use apex_core::LedgerError;
use apex_shared::AppError;
use sea_orm::{DbErr, RuntimeErr};

/// Error types for repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Row not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Table the row was looked up in.
        entity: &'static str,
        /// Row id.
        id: i64,
    },

    /// A ledger rule rejected the operation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// A stored row cannot be turned into a domain value.
    #[error("Invalid {entity} row: {message}")]
    InvalidRow {
        /// Table the row came from.
        entity: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl RepositoryError {
    pub(crate) fn invalid_row(entity: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidRow {
            entity,
            message: message.into(),
        }
    }

    /// Returns true if the database aborted the unit of work because of a
    /// serialization failure (40001) or a deadlock (40P01).
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        match self {
            Self::Ledger(err) => err.is_retryable(),
            Self::Database(err) => is_conflict(err),
            _ => false,
        }
    }
}

/// Returns true for SQLSTATE 40001 and 40P01.
pub(crate) fn is_conflict(err: &DbErr) -> bool {
    match err {
        DbErr::Exec(RuntimeErr::SqlxError(e))
        | DbErr::Query(RuntimeErr::SqlxError(e))
        | DbErr::Conn(RuntimeErr::SqlxError(e)) => is_conflict_sqlstate(e),
        _ => false,
    }
}

fn is_conflict_sqlstate(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            matches!(db_err.code().as_deref(), Some("40001" | "40P01"))
        }
        _ => false,
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepositoryError::Ledger(ledger) => ledger.into(),
            RepositoryError::InvalidRow { .. } => Self::Internal(err.to_string()),
            RepositoryError::Database(db) if is_conflict(&db) => Self::Contention(db.to_string()),
            RepositoryError::Database(db) => Self::Storage(db.to_string()),
        }
    }
}
