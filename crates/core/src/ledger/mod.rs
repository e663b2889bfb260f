//! Wallet ledger.
//!
//! # Modules
//!
//! - `types` - Wallet snapshot, status and funding split
//! - `window` - Daily and monthly spend counters
//! - `service` - Balance mutations and spend predicates
//! - `error` - Error taxonomy shared by every engine in this crate

pub mod error;
pub mod service;
pub mod types;
pub mod window;

#[cfg(test)]
mod service_props;

pub use error::{LedgerError, LimitKind};
pub use service::{WalletLedger, is_consistent, total_available, utilization_rate};
pub use types::{FundingSplit, Wallet, WalletStatus};
pub use window::{SpendLimits, SpendWindow};
