//! Invoicing and invoice factoring.
//!
//! # Modules
//!
//! - `types` - Invoice snapshot, items, payment terms, CFDI catalogues
//! - `service` - Totals, status transitions, CFDI bookkeeping
//! - `factoring` - Factoring rate and payout

pub mod factoring;
pub mod service;
pub mod types;

pub use factoring::{
    BASE_RATE, FactoringQuote, MINIMUM_FACTORING_TOTAL, can_be_factored, factor, factoring_rate,
    is_factored,
};
pub use service::{InvoiceService, TOTAL_TOLERANCE, days_until_due, has_cfdi, is_overdue};
pub use types::{
    CfdiStatus, CfdiUse, DEFAULT_TAX_RATE, Invoice, InvoiceItem, InvoiceStatus, InvoiceTotals,
    NewInvoice, PaymentTerms, SatPaymentMethod,
};
