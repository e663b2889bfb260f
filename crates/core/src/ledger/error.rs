//! Ledger error types.
//!
//! One taxonomy covers wallets, credit lines, transactions and invoices so
//! that callers can surface the specific kind of failure without having to
//! know which engine raised it.

use std::fmt;

use apex_shared::types::{AmountError, Currency, TransactionId, WalletId};
use apex_shared::AppError;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::transaction::types::{TransactionStatus, TransactionType};

/// Which spend limit a movement ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    /// Outgoing movements in the current calendar day.
    Daily,
    /// Outgoing movements in the current calendar month.
    Monthly,
    /// Withdrawals in the current calendar day.
    Withdrawal,
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Monthly => write!(f, "monthly"),
            Self::Withdrawal => write!(f, "withdrawal"),
        }
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Amount is non-positive or malformed.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// A new transaction is inconsistent with itself.
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    /// Amounts in different currencies were combined.
    #[error("Currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch {
        /// Currency of the wallet or original record.
        expected: Currency,
        /// Currency that was supplied.
        actual: Currency,
    },

    /// A transfer was created or completed without its counterparty wallet.
    #[error("Transaction requires a counterparty wallet")]
    MissingCounterparty,

    // ========== Balance Errors ==========
    /// Not enough balance (and credit, where allowed) to cover the amount.
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        /// Amount requested.
        requested: Decimal,
        /// Amount that could be used.
        available: Decimal,
    },

    /// A daily, monthly or withdrawal limit would be exceeded.
    #[error("{kind} limit {limit} exceeded: attempted {attempted}")]
    LimitExceeded {
        /// The limit that was hit.
        kind: LimitKind,
        /// Configured limit.
        limit: Decimal,
        /// Period-to-date total including the attempted movement.
        attempted: Decimal,
    },

    // ========== State Errors ==========
    /// The wallet is not active.
    #[error("Wallet {0} is not active")]
    WalletClosed(WalletId),

    /// The credit line cannot be drawn on.
    #[error("Credit line is not active or is overdue")]
    CreditLineInactive,

    /// The draw exceeds the credit line's available amount.
    #[error("Credit limit exceeded: requested {requested}, available {available}")]
    CreditLimitExceeded {
        /// Amount requested.
        requested: Decimal,
        /// Amount still available on the line.
        available: Decimal,
    },

    /// A status change that the state machine does not allow.
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Current status.
        from: String,
        /// Attempted status.
        to: String,
    },

    /// Only completed payments and transfers can be refunded.
    #[error("Transactions of type {0} cannot be refunded")]
    NotRefundable(TransactionType),

    /// The invoice does not meet the factoring preconditions.
    #[error("Invoice cannot be factored: {0}")]
    NotFactorable(String),

    // ========== Lookup Errors ==========
    /// Wallet not found.
    #[error("Wallet {0} not found")]
    WalletNotFound(WalletId),

    /// Transaction not found.
    #[error("Transaction {0} not found")]
    TransactionNotFound(TransactionId),

    // ========== Concurrency Errors ==========
    /// The unit of work collided with a concurrent one and may be retried.
    #[error("Concurrent update conflict")]
    ConcurrencyConflict,

    /// Conflicts persisted after the bounded number of attempts.
    #[error("Operation failed after {attempts} attempts due to concurrent updates")]
    RetriesExhausted {
        /// Attempts made.
        attempts: u32,
    },

    /// Invariant violation that indicates a bug rather than bad input.
    #[error("Internal ledger error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Builds an `InvalidStateTransition` from two statuses.
    pub fn transition(from: impl fmt::Display, to: impl fmt::Display) -> Self {
        Self::InvalidStateTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Builds an `InvalidStateTransition` between transaction statuses.
    #[must_use]
    pub fn transaction_transition(from: TransactionStatus, to: TransactionStatus) -> Self {
        Self::transition(from, to)
    }

    /// Stable code naming the error kind.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::InvalidTransaction(_) => "INVALID_TRANSACTION",
            Self::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            Self::MissingCounterparty => "MISSING_COUNTERPARTY",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::LimitExceeded { .. } => "LIMIT_EXCEEDED",
            Self::WalletClosed(_) => "WALLET_CLOSED",
            Self::CreditLineInactive => "CREDIT_LINE_INACTIVE",
            Self::CreditLimitExceeded { .. } => "CREDIT_LIMIT_EXCEEDED",
            Self::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            Self::NotRefundable(_) => "NOT_REFUNDABLE",
            Self::NotFactorable(_) => "NOT_FACTORABLE",
            Self::WalletNotFound(_) => "WALLET_NOT_FOUND",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::ConcurrencyConflict => "CONCURRENCY_CONFLICT",
            Self::RetriesExhausted { .. } => "RETRIES_EXHAUSTED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if the whole unit of work may be retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict)
    }
}

impl From<AmountError> for LedgerError {
    fn from(err: AmountError) -> Self {
        Self::InvalidAmount(err.to_string())
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::WalletNotFound(id) => Self::NotFound {
                entity: "wallet",
                id: id.get(),
            },
            LedgerError::TransactionNotFound(id) => Self::NotFound {
                entity: "transaction",
                id: id.get(),
            },
            LedgerError::ConcurrencyConflict | LedgerError::RetriesExhausted { .. } => {
                Self::Contention(err.to_string())
            }
            LedgerError::Internal(message) => Self::Internal(message),
            _ => Self::Rejected {
                code: err.error_code(),
                message: err.to_string(),
            },
        }
    }
}
