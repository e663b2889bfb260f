//! Core business logic for Apex.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Operations take snapshots by mutable reference, validate first, and leave
//! the snapshot untouched when they return an error.
//!
//! # Modules
//!
//! - `ledger` - Wallet balances, credit usage, spend windows
//! - `credit` - Credit line lifecycle and repayment schedule
//! - `transaction` - Transaction state machine and refunds
//! - `invoice` - Invoice totals, CFDI bookkeeping, factoring
//! - `catalog` - Auto-part pricing and stock helpers
//! - `book` - Concurrent in-memory ledger
//! - `retry` - Bounded retry for concurrency conflicts

pub mod book;
pub mod catalog;
pub mod credit;
pub mod invoice;
pub mod ledger;
pub mod retry;
pub mod transaction;

pub use book::LedgerBook;
pub use ledger::LedgerError;
pub use retry::RetryPolicy;
