//! Invoice factoring calculator.
//!
//! Selling an invoice before it is due costs a percentage of its total.
//! The rate starts at 2.5%, rises with the time left until the due date,
//! and falls for large invoices.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use apex_shared::types::round_currency;

use crate::invoice::service::days_until_due;
use crate::invoice::types::{Invoice, InvoiceStatus};
use crate::ledger::error::LedgerError;

/// Rate every factoring starts from, in percent.
pub const BASE_RATE: Decimal = dec!(2.5);

/// Smallest total that can be factored.
pub const MINIMUM_FACTORING_TOTAL: Decimal = dec!(10000);

/// Result of factoring an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactoringQuote {
    /// Rate applied, in percent.
    pub rate: Decimal,
    /// Cash paid out for the invoice.
    pub factored_amount: Decimal,
}

/// Factoring rate in percent for an invoice of `total` due in
/// `days_until_due` days.
#[must_use]
pub fn factoring_rate(days_until_due: i64, total: Decimal) -> Decimal {
    let days_adjustment = if days_until_due > 60 {
        dec!(0.5)
    } else if days_until_due > 30 {
        dec!(0.3)
    } else {
        dec!(0.1)
    };

    let amount_adjustment = if total > dec!(500000) {
        dec!(-0.2)
    } else if total > dec!(100000) {
        dec!(-0.1)
    } else {
        Decimal::ZERO
    };

    BASE_RATE + days_adjustment + amount_adjustment
}

/// Returns true if the invoice can be factored.
#[must_use]
pub fn can_be_factored(invoice: &Invoice) -> bool {
    ensure_factorable(invoice).is_ok()
}

/// Factors the invoice: records the rate, the cash paid out, the provider
/// and the date. The invoice stays `sent`; it cannot be factored again.
///
/// # Errors
///
/// Returns `NotFactorable` naming the first precondition that fails.
pub fn factor(
    invoice: &mut Invoice,
    provider: &str,
    now: DateTime<Utc>,
) -> Result<FactoringQuote, LedgerError> {
    ensure_factorable(invoice)?;
    if provider.trim().is_empty() {
        return Err(LedgerError::NotFactorable(
            "a factoring provider is required".to_string(),
        ));
    }

    let rate = factoring_rate(days_until_due(invoice, now), invoice.total);
    let factored_amount =
        round_currency(invoice.total * (Decimal::ONE - rate / Decimal::ONE_HUNDRED));

    invoice.factoring_rate = Some(rate);
    invoice.factored_amount = Some(factored_amount);
    invoice.factoring_date = Some(now);
    invoice.factoring_provider = Some(provider.trim().to_string());

    Ok(FactoringQuote {
        rate,
        factored_amount,
    })
}

/// Returns true if the invoice has already been factored.
#[must_use]
pub fn is_factored(invoice: &Invoice) -> bool {
    invoice.factored_amount.is_some_and(|amount| !amount.is_zero())
}

fn ensure_factorable(invoice: &Invoice) -> Result<(), LedgerError> {
    if !invoice.factoring_available {
        return Err(LedgerError::NotFactorable(
            "factoring is disabled for this invoice".to_string(),
        ));
    }
    if invoice.status != InvoiceStatus::Sent {
        return Err(LedgerError::NotFactorable(format!(
            "invoice is {}, only sent invoices can be factored",
            invoice.status
        )));
    }
    if is_factored(invoice) {
        return Err(LedgerError::NotFactorable(
            "invoice has already been factored".to_string(),
        ));
    }
    if invoice.total < MINIMUM_FACTORING_TOTAL {
        return Err(LedgerError::NotFactorable(format!(
            "total {} is below the minimum of {MINIMUM_FACTORING_TOTAL}",
            invoice.total
        )));
    }
    Ok(())
}
