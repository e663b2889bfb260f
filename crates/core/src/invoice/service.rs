//! Invoice totals, status transitions and CFDI bookkeeping.

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use apex_shared::types::{InvoiceId, round_currency};

use crate::invoice::factoring::is_factored;
use crate::invoice::types::{
    CfdiStatus, Invoice, InvoiceItem, InvoiceStatus, InvoiceTotals, NewInvoice,
};
use crate::ledger::error::LedgerError;

/// Largest difference tolerated between the stored total and
/// `subtotal + tax_amount - discount_amount`.
pub const TOTAL_TOLERANCE: Decimal = dec!(0.01);

const SECONDS_PER_DAY: i64 = 86_400;

/// Stateless service for invoice operations.
pub struct InvoiceService;

impl InvoiceService {
    /// Builds a draft invoice with totals computed from its items.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` if there are no items, an item has a
    /// non-positive quantity, a negative price, discount or tax rate, or a
    /// discount larger than the line amount.
    pub fn draft(
        id: InvoiceId,
        invoice_number: String,
        new: NewInvoice,
    ) -> Result<Invoice, LedgerError> {
        let totals = Self::totals_from_items(&new.items)?;
        let due_date = new
            .due_date
            .unwrap_or_else(|| new.issue_date + TimeDelta::days(new.payment_terms.days()));

        Ok(Invoice {
            id,
            invoice_number,
            folio: new.folio,
            series: new.series,
            issuer_id: new.issuer_id,
            receiver_id: new.receiver_id,
            subtotal: totals.subtotal,
            tax_amount: totals.tax_amount,
            discount_amount: totals.discount_amount,
            total: totals.total,
            currency: new.currency,
            exchange_rate: new.exchange_rate,
            status: InvoiceStatus::Draft,
            issue_date: new.issue_date,
            due_date,
            paid_date: None,
            payment_terms: new.payment_terms,
            sat_payment_method: new.sat_payment_method,
            payment_form: new.payment_form,
            cfdi_uuid: None,
            cfdi_use: new.cfdi_use,
            cfdi_xml_url: None,
            cfdi_pdf_url: None,
            cfdi_status: CfdiStatus::Pending,
            cfdi_cancellation_date: None,
            items: new.items,
            notes: new.notes,
            factoring_available: new.factoring_available,
            factoring_rate: None,
            factored_amount: None,
            factoring_date: None,
            factoring_provider: None,
        })
    }

    /// Computes subtotal, tax, discount and total from the items.
    ///
    /// Tax is charged on each line after its discount.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` for an empty or malformed item list.
    pub fn totals_from_items(items: &[InvoiceItem]) -> Result<InvoiceTotals, LedgerError> {
        if items.is_empty() {
            return Err(LedgerError::InvalidAmount(
                "an invoice needs at least one item".to_string(),
            ));
        }

        let mut subtotal = Decimal::ZERO;
        let mut tax_amount = Decimal::ZERO;
        let mut discount_amount = Decimal::ZERO;
        for item in items {
            validate_item(item)?;
            let line = item.quantity * item.unit_price;
            subtotal += line;
            discount_amount += item.discount;
            tax_amount += (line - item.discount) * item.tax_rate / Decimal::ONE_HUNDRED;
        }

        let subtotal = round_currency(subtotal);
        let tax_amount = round_currency(tax_amount);
        let discount_amount = round_currency(discount_amount);
        Ok(InvoiceTotals {
            subtotal,
            tax_amount,
            discount_amount,
            total: subtotal + tax_amount - discount_amount,
        })
    }

    /// Checks `total == subtotal + tax_amount - discount_amount` within
    /// [`TOTAL_TOLERANCE`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` describing the difference.
    pub fn validate_totals(invoice: &Invoice) -> Result<(), LedgerError> {
        let expected = invoice.subtotal + invoice.tax_amount - invoice.discount_amount;
        if (invoice.total - expected).abs() > TOTAL_TOLERANCE {
            return Err(LedgerError::InvalidAmount(format!(
                "total {} does not match subtotal {} + tax {} - discount {}",
                invoice.total, invoice.subtotal, invoice.tax_amount, invoice.discount_amount
            )));
        }
        Ok(())
    }

    /// Draft → Sent.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` unless the invoice is a draft
    /// - `InvalidAmount` if the totals do not add up
    pub fn send(invoice: &mut Invoice) -> Result<(), LedgerError> {
        ensure_status(invoice, &[InvoiceStatus::Draft], InvoiceStatus::Sent)?;
        Self::validate_totals(invoice)?;
        invoice.status = InvoiceStatus::Sent;
        Ok(())
    }

    /// Sent or Overdue → Paid.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` from any other status.
    pub fn mark_paid(invoice: &mut Invoice, now: DateTime<Utc>) -> Result<(), LedgerError> {
        ensure_status(
            invoice,
            &[InvoiceStatus::Sent, InvoiceStatus::Overdue],
            InvoiceStatus::Paid,
        )?;
        invoice.status = InvoiceStatus::Paid;
        invoice.paid_date = Some(now);
        Ok(())
    }

    /// Sent → Overdue, once the due date has passed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` unless the invoice is sent and past due.
    pub fn mark_overdue(invoice: &mut Invoice, now: DateTime<Utc>) -> Result<(), LedgerError> {
        if !is_overdue(invoice, now) {
            return Err(LedgerError::transition(
                format!("{} (due {})", invoice.status, invoice.due_date),
                InvoiceStatus::Overdue,
            ));
        }
        invoice.status = InvoiceStatus::Overdue;
        Ok(())
    }

    /// Draft, Sent or Overdue → Cancelled. Factored invoices cannot be
    /// cancelled.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` from any other status or when the
    /// invoice has been factored.
    pub fn cancel(invoice: &mut Invoice) -> Result<(), LedgerError> {
        if is_factored(invoice) {
            return Err(LedgerError::transition("factored", InvoiceStatus::Cancelled));
        }
        ensure_status(
            invoice,
            &[
                InvoiceStatus::Draft,
                InvoiceStatus::Sent,
                InvoiceStatus::Overdue,
            ],
            InvoiceStatus::Cancelled,
        )?;
        invoice.status = InvoiceStatus::Cancelled;
        Ok(())
    }

    /// Paid → Refunded.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` from any other status.
    pub fn refund(invoice: &mut Invoice) -> Result<(), LedgerError> {
        ensure_status(invoice, &[InvoiceStatus::Paid], InvoiceStatus::Refunded)?;
        invoice.status = InvoiceStatus::Refunded;
        Ok(())
    }

    /// Attaches the stamped tax document.
    ///
    /// # Errors
    ///
    /// - `InvalidTransaction` if the fiscal folio is blank
    /// - `InvalidStateTransition` if a document is already issued or the
    ///   invoice is a draft or cancelled
    pub fn attach_cfdi(
        invoice: &mut Invoice,
        cfdi_uuid: &str,
        xml_url: Option<String>,
        pdf_url: Option<String>,
    ) -> Result<(), LedgerError> {
        if cfdi_uuid.trim().is_empty() {
            return Err(LedgerError::InvalidTransaction(
                "CFDI fiscal folio is required".to_string(),
            ));
        }
        if matches!(
            invoice.status,
            InvoiceStatus::Draft | InvoiceStatus::Cancelled
        ) {
            return Err(LedgerError::transition(invoice.status, "cfdi issued"));
        }
        if invoice.cfdi_status != CfdiStatus::Pending {
            return Err(LedgerError::transition(
                invoice.cfdi_status,
                CfdiStatus::Issued,
            ));
        }

        invoice.cfdi_uuid = Some(cfdi_uuid.trim().to_uppercase());
        invoice.cfdi_xml_url = xml_url;
        invoice.cfdi_pdf_url = pdf_url;
        invoice.cfdi_status = CfdiStatus::Issued;
        Ok(())
    }

    /// Records the cancellation of the tax document.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` unless a document is issued.
    pub fn cancel_cfdi(invoice: &mut Invoice, now: DateTime<Utc>) -> Result<(), LedgerError> {
        if invoice.cfdi_status != CfdiStatus::Issued {
            return Err(LedgerError::transition(
                invoice.cfdi_status,
                CfdiStatus::Cancelled,
            ));
        }
        invoice.cfdi_status = CfdiStatus::Cancelled;
        invoice.cfdi_cancellation_date = Some(now);
        Ok(())
    }
}

/// Whole days until the due date, negative once past due. Partial days
/// round down, so an invoice due in 36 hours has 1 day left and one that
/// was due 1 hour ago has -1.
#[must_use]
pub fn days_until_due(invoice: &Invoice, now: DateTime<Utc>) -> i64 {
    (invoice.due_date - now)
        .num_seconds()
        .div_euclid(SECONDS_PER_DAY)
}

/// Returns true if the invoice is sent and past its due date.
#[must_use]
pub fn is_overdue(invoice: &Invoice, now: DateTime<Utc>) -> bool {
    invoice.status == InvoiceStatus::Sent && invoice.due_date < now
}

/// Returns true if a tax document has been attached.
#[must_use]
pub fn has_cfdi(invoice: &Invoice) -> bool {
    invoice
        .cfdi_uuid
        .as_deref()
        .is_some_and(|uuid| !uuid.is_empty())
}

fn validate_item(item: &InvoiceItem) -> Result<(), LedgerError> {
    if item.quantity <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(format!(
            "quantity of '{}' must be positive",
            item.description
        )));
    }
    if item.unit_price < Decimal::ZERO
        || item.discount < Decimal::ZERO
        || item.tax_rate < Decimal::ZERO
    {
        return Err(LedgerError::InvalidAmount(format!(
            "price, discount and tax rate of '{}' cannot be negative",
            item.description
        )));
    }
    if item.discount > item.quantity * item.unit_price {
        return Err(LedgerError::InvalidAmount(format!(
            "discount of '{}' exceeds the line amount",
            item.description
        )));
    }
    Ok(())
}

fn ensure_status(
    invoice: &Invoice,
    allowed_from: &[InvoiceStatus],
    to: InvoiceStatus,
) -> Result<(), LedgerError> {
    if allowed_from.contains(&invoice.status) {
        Ok(())
    } else {
        Err(LedgerError::transition(invoice.status, to))
    }
}
