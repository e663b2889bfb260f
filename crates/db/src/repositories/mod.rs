//! Repository layer for database access.
//!
//! Each repository wraps a `DatabaseConnection` and runs the `apex-core`
//! operations against locked rows, one database transaction per call.

mod error;
mod mapping;
mod retry;

pub mod credit_line;
pub mod invoice;
pub mod transaction;
pub mod wallet;

pub use credit_line::CreditLineRepository;
pub use error::RepositoryError;
pub use invoice::InvoiceRepository;
pub use transaction::TransactionRepository;
pub use wallet::WalletRepository;
