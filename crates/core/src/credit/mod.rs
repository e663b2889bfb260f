//! Credit line engine.
//!
//! # Modules
//!
//! - `types` - Credit line snapshot, statuses, terms
//! - `engine` - Draws, repayments, amortization, lifecycle transitions
//! - `status` - Read-only views (delinquency bucket, utilization)

pub mod engine;
pub mod status;
pub mod types;

#[cfg(test)]
mod engine_props;

pub use engine::CreditEngine;
pub use status::{can_draw, is_active, is_overdue, payment_status, utilization_rate};
pub use types::{
    CreditLine, CreditLineStatus, CreditTerms, CreditType, PaymentFrequency, PaymentStatus,
    Repayment,
};
