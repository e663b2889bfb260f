//! Error surfaced by the ledger's entry points.
//!
//! Library layers keep their own error enums (`LedgerError`,
//! `RepositoryError`) and convert into [`AppError`] at the edge, where only
//! the stable code, the retry hint and the process exit status matter.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// `EX_DATAERR` from sysexits.h.
const EXIT_REJECTED: u8 = 65;
/// `EX_NOINPUT`.
const EXIT_NOT_FOUND: u8 = 66;
/// `EX_UNAVAILABLE`.
const EXIT_STORAGE: u8 = 69;
/// `EX_SOFTWARE`.
const EXIT_INTERNAL: u8 = 70;
/// `EX_TEMPFAIL`.
const EXIT_CONTENTION: u8 = 75;
/// `EX_CONFIG`.
const EXIT_CONFIGURATION: u8 = 78;

/// Failure of a ledger call as seen by its caller.
#[derive(Debug, Error)]
pub enum AppError {
    /// A ledger rule refused the operation and nothing was written.
    /// `code` is the ledger's own code, e.g. `INSUFFICIENT_FUNDS`.
    #[error("{code}: {message}")]
    Rejected {
        /// Stable ledger error code.
        code: &'static str,
        /// Human-readable detail.
        message: String,
    },

    /// The addressed record does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Record kind, e.g. `wallet`.
        entity: &'static str,
        /// Record id.
        id: i64,
    },

    /// Concurrent writers kept conflicting until the retry budget ran out.
    #[error("Contention: {0}")]
    Contention(String),

    /// The database failed or could not be reached.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A stored row or internal invariant is broken.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable code for logs and callers. Rejections keep the ledger's code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Rejected { code, .. } => *code,
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Contention(_) => "CONTENTION",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if the caller may try the same call again later.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Contention(_))
    }

    /// Exit status for the command-line tools, following sysexits.h.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Rejected { .. } => EXIT_REJECTED,
            Self::NotFound { .. } => EXIT_NOT_FOUND,
            Self::Contention(_) => EXIT_CONTENTION,
            Self::Storage(_) => EXIT_STORAGE,
            Self::Configuration(_) => EXIT_CONFIGURATION,
            Self::Internal(_) => EXIT_INTERNAL,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}
