//! Conversions between stored rows and domain snapshots.

use apex_core::credit::{self, CreditLine};
use apex_core::invoice::{self, CfdiUse, Invoice, InvoiceItem, SatPaymentMethod};
use apex_core::ledger::{self, SpendWindow, Wallet};
use apex_core::transaction::{self, Transaction};
use apex_shared::types::{
    CreditLineId, Currency, InvoiceId, TransactionId, UserId, WalletId,
};
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::Set;

use super::error::RepositoryError;
use crate::entities::{credit_lines, invoices, sea_orm_active_enums as db, transactions, wallets};

/// Generates `From` impls in both directions between a domain enum and its
/// active enum, which share variant names.
macro_rules! enum_mapping {
    ($dmod:ident :: $dty:ident, $smod:ident :: $sty:ident { $($variant:ident),+ $(,)? }) => {
        impl From<$dmod::$dty> for $smod::$sty {
            fn from(value: $dmod::$dty) -> Self {
                match value {
                    $($dmod::$dty::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$smod::$sty> for $dmod::$dty {
            fn from(value: $smod::$sty) -> Self {
                match value {
                    $($smod::$sty::$variant => Self::$variant,)+
                }
            }
        }
    };
}

enum_mapping!(ledger::WalletStatus, db::WalletStatus { Active, Suspended, Closed });
enum_mapping!(transaction::TransactionType, db::TransactionType {
    Deposit, Withdrawal, Payment, Refund, Transfer, Credit, Cashback, Fee, Factoring, CreditPayment,
});
enum_mapping!(transaction::TransactionStatus, db::TransactionStatus {
    Pending, Processing, Completed, Failed, Cancelled, Refunded,
});
enum_mapping!(transaction::PaymentMethod, db::PaymentMethod {
    Wallet, Credit, BankTransfer, Card, Cash,
});
enum_mapping!(credit::CreditType, db::CreditType {
    WorkingCapital, Inventory, Equipment, Expansion, Emergency,
});
enum_mapping!(credit::PaymentFrequency, db::PaymentFrequency {
    Weekly, Biweekly, Monthly, Quarterly,
});
enum_mapping!(credit::CreditLineStatus, db::CreditLineStatus {
    Pending, Approved, Active, Suspended, Closed, Defaulted,
});
enum_mapping!(invoice::InvoiceStatus, db::InvoiceStatus {
    Draft, Sent, Paid, Overdue, Cancelled, Refunded,
});
enum_mapping!(invoice::PaymentTerms, db::PaymentTerms { Immediate, Net15, Net30, Net60, Net90 });
enum_mapping!(invoice::CfdiStatus, db::CfdiStatus { Pending, Issued, Cancelled });

type Timestamp = DateTime<FixedOffset>;

fn utc(value: Timestamp) -> DateTime<Utc> {
    value.with_timezone(&Utc)
}

fn utc_opt(value: Option<Timestamp>) -> Option<DateTime<Utc>> {
    value.map(utc)
}

fn stored_opt(value: Option<DateTime<Utc>>) -> Option<Timestamp> {
    value.map(Into::into)
}

fn currency(entity: &'static str, code: &str) -> Result<Currency, RepositoryError> {
    code.parse()
        .map_err(|e: String| RepositoryError::invalid_row(entity, e))
}

fn count(entity: &'static str, value: i32) -> Result<u32, RepositoryError> {
    u32::try_from(value)
        .map_err(|_| RepositoryError::invalid_row(entity, format!("negative counter {value}")))
}

pub(crate) fn stored_count(value: u32) -> Result<i32, RepositoryError> {
    i32::try_from(value).map_err(|_| {
        RepositoryError::Ledger(apex_core::LedgerError::Internal(format!(
            "counter {value} does not fit the column"
        )))
    })
}

fn sat_payment_method(code: &str) -> Result<SatPaymentMethod, RepositoryError> {
    match code {
        "PUE" => Ok(SatPaymentMethod::Pue),
        "PPD" => Ok(SatPaymentMethod::Ppd),
        other => Err(RepositoryError::invalid_row(
            "invoice",
            format!("unknown SAT payment method {other}"),
        )),
    }
}

pub(crate) fn sat_payment_method_code(method: SatPaymentMethod) -> &'static str {
    match method {
        SatPaymentMethod::Pue => "PUE",
        SatPaymentMethod::Ppd => "PPD",
    }
}

// ========== Wallets ==========

pub(crate) fn wallet_from_model(model: &wallets::Model) -> Result<Wallet, RepositoryError> {
    Ok(Wallet {
        id: WalletId::new(model.id),
        user_id: UserId::new(model.user_id),
        currency: currency("wallet", &model.currency)?,
        balance: model.balance,
        available_balance: model.available_balance,
        frozen_balance: model.frozen_balance,
        credit_limit: model.credit_limit,
        used_credit: model.used_credit,
        available_credit: model.available_credit,
        cashback_balance: model.cashback_balance,
        total_cashback_earned: model.total_cashback_earned,
        daily_limit: model.daily_limit,
        monthly_limit: model.monthly_limit,
        withdrawal_limit: model.withdrawal_limit,
        window: SpendWindow {
            day: model.window_day,
            spent_today: model.spent_today,
            spent_this_month: model.spent_this_month,
            withdrawn_today: model.withdrawn_today,
        },
        status: model.status.into(),
        last_transaction_at: utc_opt(model.last_transaction_at),
    })
}

/// Copies the mutable wallet fields onto `active`.
pub(crate) fn apply_wallet(active: &mut wallets::ActiveModel, wallet: &Wallet) {
    active.balance = Set(wallet.balance);
    active.available_balance = Set(wallet.available_balance);
    active.frozen_balance = Set(wallet.frozen_balance);
    active.credit_limit = Set(wallet.credit_limit);
    active.used_credit = Set(wallet.used_credit);
    active.available_credit = Set(wallet.available_credit);
    active.cashback_balance = Set(wallet.cashback_balance);
    active.total_cashback_earned = Set(wallet.total_cashback_earned);
    active.daily_limit = Set(wallet.daily_limit);
    active.monthly_limit = Set(wallet.monthly_limit);
    active.withdrawal_limit = Set(wallet.withdrawal_limit);
    active.window_day = Set(wallet.window.day);
    active.spent_today = Set(wallet.window.spent_today);
    active.spent_this_month = Set(wallet.window.spent_this_month);
    active.withdrawn_today = Set(wallet.window.withdrawn_today);
    active.status = Set(wallet.status.into());
    active.last_transaction_at = Set(stored_opt(wallet.last_transaction_at));
    active.updated_at = Set(Utc::now().into());
}

// ========== Transactions ==========

pub(crate) fn transaction_from_model(
    model: &transactions::Model,
) -> Result<Transaction, RepositoryError> {
    Ok(Transaction {
        id: TransactionId::new(model.id),
        reference: model.transaction_id.clone(),
        user_id: UserId::new(model.user_id),
        wallet_id: WalletId::new(model.wallet_id),
        transaction_type: model.transaction_type.into(),
        status: model.status.into(),
        amount: model.amount,
        fee: model.fee,
        net_amount: model.net_amount,
        currency: currency("transaction", &model.currency)?,
        payment_method: model.payment_method.into(),
        counterparty_user_id: model.counterparty_user_id.map(UserId::new),
        counterparty_wallet_id: model.counterparty_wallet_id.map(WalletId::new),
        credit_line_id: model.credit_line_id.map(CreditLineId::new),
        invoice_id: model.invoice_id.map(InvoiceId::new),
        refund_of: model.refund_of.map(TransactionId::new),
        description: model.description.clone(),
        balance_portion: model.balance_portion,
        credit_portion: model.credit_portion,
        processed_at: utc_opt(model.processed_at),
        failure_reason: model.failure_reason.clone(),
        retry_count: count("transaction", model.retry_count)?,
    })
}

/// Copies the fields the state machine changes onto `active`.
pub(crate) fn apply_transaction(
    active: &mut transactions::ActiveModel,
    txn: &Transaction,
) -> Result<(), RepositoryError> {
    active.status = Set(txn.status.into());
    active.balance_portion = Set(txn.balance_portion);
    active.credit_portion = Set(txn.credit_portion);
    active.processed_at = Set(stored_opt(txn.processed_at));
    active.failure_reason = Set(txn.failure_reason.clone());
    active.retry_count = Set(stored_count(txn.retry_count)?);
    active.updated_at = Set(Utc::now().into());
    Ok(())
}

/// Builds an insertable row; the id is assigned by the database.
pub(crate) fn new_transaction_row(
    txn: &Transaction,
) -> Result<transactions::ActiveModel, RepositoryError> {
    let now: Timestamp = Utc::now().into();
    Ok(transactions::ActiveModel {
        transaction_id: Set(txn.reference.clone()),
        user_id: Set(txn.user_id.get()),
        wallet_id: Set(txn.wallet_id.get()),
        transaction_type: Set(txn.transaction_type.into()),
        status: Set(txn.status.into()),
        amount: Set(txn.amount),
        fee: Set(txn.fee),
        net_amount: Set(txn.net_amount),
        currency: Set(txn.currency.to_string()),
        payment_method: Set(txn.payment_method.into()),
        counterparty_user_id: Set(txn.counterparty_user_id.map(UserId::get)),
        counterparty_wallet_id: Set(txn.counterparty_wallet_id.map(WalletId::get)),
        credit_line_id: Set(txn.credit_line_id.map(CreditLineId::get)),
        invoice_id: Set(txn.invoice_id.map(InvoiceId::get)),
        refund_of: Set(txn.refund_of.map(TransactionId::get)),
        description: Set(txn.description.clone()),
        balance_portion: Set(txn.balance_portion),
        credit_portion: Set(txn.credit_portion),
        processed_at: Set(stored_opt(txn.processed_at)),
        failure_reason: Set(txn.failure_reason.clone()),
        retry_count: Set(stored_count(txn.retry_count)?),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    })
}

// ========== Credit lines ==========

pub(crate) fn credit_line_from_model(
    model: &credit_lines::Model,
) -> Result<CreditLine, RepositoryError> {
    Ok(CreditLine {
        id: CreditLineId::new(model.id),
        user_id: UserId::new(model.user_id),
        credit_type: model.credit_type.into(),
        provider: model.provider.clone(),
        approved_limit: model.approved_limit,
        current_limit: model.current_limit,
        used_amount: model.used_amount,
        available_amount: model.available_amount,
        interest_rate: model.interest_rate,
        term_months: count("credit_line", model.term_months)?,
        payment_frequency: model.payment_frequency.into(),
        status: model.status.into(),
        approval_date: utc_opt(model.approval_date),
        activation_date: utc_opt(model.activation_date),
        maturity_date: utc_opt(model.maturity_date),
        minimum_payment: model.minimum_payment,
        next_payment_amount: model.next_payment_amount,
        next_payment_date: utc_opt(model.next_payment_date),
        last_payment_date: utc_opt(model.last_payment_date),
        total_payments_made: count("credit_line", model.total_payments_made)?,
        total_amount_paid: model.total_amount_paid,
        total_interest_paid: model.total_interest_paid,
        days_past_due: count("credit_line", model.days_past_due)?,
        late_payment_count: count("credit_line", model.late_payment_count)?,
    })
}

/// Copies every credit line field except identity onto `active`.
pub(crate) fn apply_credit_line(
    active: &mut credit_lines::ActiveModel,
    line: &CreditLine,
) -> Result<(), RepositoryError> {
    active.user_id = Set(line.user_id.get());
    active.credit_type = Set(line.credit_type.into());
    active.provider = Set(line.provider.clone());
    active.approved_limit = Set(line.approved_limit);
    active.current_limit = Set(line.current_limit);
    active.used_amount = Set(line.used_amount);
    active.available_amount = Set(line.available_amount);
    active.interest_rate = Set(line.interest_rate);
    active.term_months = Set(stored_count(line.term_months)?);
    active.payment_frequency = Set(line.payment_frequency.into());
    active.status = Set(line.status.into());
    active.approval_date = Set(stored_opt(line.approval_date));
    active.activation_date = Set(stored_opt(line.activation_date));
    active.maturity_date = Set(stored_opt(line.maturity_date));
    active.minimum_payment = Set(line.minimum_payment);
    active.next_payment_amount = Set(line.next_payment_amount);
    active.next_payment_date = Set(stored_opt(line.next_payment_date));
    active.last_payment_date = Set(stored_opt(line.last_payment_date));
    active.total_payments_made = Set(stored_count(line.total_payments_made)?);
    active.total_amount_paid = Set(line.total_amount_paid);
    active.total_interest_paid = Set(line.total_interest_paid);
    active.days_past_due = Set(stored_count(line.days_past_due)?);
    active.late_payment_count = Set(stored_count(line.late_payment_count)?);
    active.updated_at = Set(Utc::now().into());
    Ok(())
}

// ========== Invoices ==========

pub(crate) fn invoice_from_model(model: &invoices::Model) -> Result<Invoice, RepositoryError> {
    let items: Vec<InvoiceItem> = serde_json::from_value(model.items.clone())
        .map_err(|e| RepositoryError::invalid_row("invoice", format!("items: {e}")))?;
    let cfdi_use = CfdiUse::from_code(&model.cfdi_use).ok_or_else(|| {
        RepositoryError::invalid_row("invoice", format!("unknown CFDI use {}", model.cfdi_use))
    })?;

    Ok(Invoice {
        id: InvoiceId::new(model.id),
        invoice_number: model.invoice_number.clone(),
        folio: model.folio.clone(),
        series: model.series.clone(),
        issuer_id: UserId::new(model.issuer_id),
        receiver_id: UserId::new(model.receiver_id),
        subtotal: model.subtotal,
        tax_amount: model.tax_amount,
        discount_amount: model.discount_amount,
        total: model.total,
        currency: currency("invoice", &model.currency)?,
        exchange_rate: model.exchange_rate,
        status: model.status.into(),
        issue_date: utc(model.issue_date),
        due_date: utc(model.due_date),
        paid_date: utc_opt(model.paid_date),
        payment_terms: model.payment_terms.into(),
        sat_payment_method: sat_payment_method(&model.sat_payment_method)?,
        payment_form: model.payment_form.clone(),
        cfdi_uuid: model.cfdi_uuid.clone(),
        cfdi_use,
        cfdi_xml_url: model.cfdi_xml_url.clone(),
        cfdi_pdf_url: model.cfdi_pdf_url.clone(),
        cfdi_status: model.cfdi_status.into(),
        cfdi_cancellation_date: utc_opt(model.cfdi_cancellation_date),
        items,
        notes: model.notes.clone(),
        factoring_available: model.factoring_available,
        factoring_rate: model.factoring_rate,
        factored_amount: model.factored_amount,
        factoring_date: utc_opt(model.factoring_date),
        factoring_provider: model.factoring_provider.clone(),
    })
}

/// Copies every invoice field except identity onto `active`.
pub(crate) fn apply_invoice(
    active: &mut invoices::ActiveModel,
    invoice: &Invoice,
) -> Result<(), RepositoryError> {
    let items = serde_json::to_value(&invoice.items)
        .map_err(|e| RepositoryError::invalid_row("invoice", format!("items: {e}")))?;

    active.invoice_number = Set(invoice.invoice_number.clone());
    active.folio = Set(invoice.folio.clone());
    active.series = Set(invoice.series.clone());
    active.issuer_id = Set(invoice.issuer_id.get());
    active.receiver_id = Set(invoice.receiver_id.get());
    active.subtotal = Set(invoice.subtotal);
    active.tax_amount = Set(invoice.tax_amount);
    active.discount_amount = Set(invoice.discount_amount);
    active.total = Set(invoice.total);
    active.currency = Set(invoice.currency.to_string());
    active.exchange_rate = Set(invoice.exchange_rate);
    active.status = Set(invoice.status.into());
    active.issue_date = Set(invoice.issue_date.into());
    active.due_date = Set(invoice.due_date.into());
    active.paid_date = Set(stored_opt(invoice.paid_date));
    active.payment_terms = Set(invoice.payment_terms.into());
    active.sat_payment_method = Set(sat_payment_method_code(invoice.sat_payment_method).to_string());
    active.payment_form = Set(invoice.payment_form.clone());
    active.cfdi_uuid = Set(invoice.cfdi_uuid.clone());
    active.cfdi_use = Set(invoice.cfdi_use.code().to_string());
    active.cfdi_xml_url = Set(invoice.cfdi_xml_url.clone());
    active.cfdi_pdf_url = Set(invoice.cfdi_pdf_url.clone());
    active.cfdi_status = Set(invoice.cfdi_status.into());
    active.cfdi_cancellation_date = Set(stored_opt(invoice.cfdi_cancellation_date));
    active.items = Set(items);
    active.notes = Set(invoice.notes.clone());
    active.factoring_available = Set(invoice.factoring_available);
    active.factoring_rate = Set(invoice.factoring_rate);
    active.factored_amount = Set(invoice.factored_amount);
    active.factoring_date = Set(stored_opt(invoice.factoring_date));
    active.factoring_provider = Set(invoice.factoring_provider.clone());
    active.updated_at = Set(Utc::now().into());
    Ok(())
}
