//! Transaction lifecycle.
//!
//! # Modules
//!
//! - `types` - Transaction snapshot, type, status, refund record
//! - `effect` - Ledger effect of each transaction type
//! - `processor` - State machine that applies and reverses effects

pub mod effect;
pub mod processor;
pub mod types;

#[cfg(test)]
mod processor_props;

pub use effect::{LedgerEffect, OwnerEffect, effect_of};
pub use processor::{MAX_RETRIES_EXCEEDED, RetryDecision, TransactionProcessor, refund_split};
pub use types::{
    NewTransaction, PaymentMethod, RefundRecord, Transaction, TransactionStatus, TransactionType,
};
