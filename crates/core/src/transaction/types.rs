//! Transaction domain types.

use std::fmt;

use apex_shared::types::{
    CreditLineId, Currency, InvoiceId, TransactionId, UserId, WalletId,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::types::FundingSplit;

/// What a transaction moves and in which direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Money in from outside.
    Deposit,
    /// Cash-out from available balance.
    Withdrawal,
    /// Purchase, optionally to another wallet.
    Payment,
    /// Reversal of a payment or transfer.
    Refund,
    /// Wallet-to-wallet move.
    Transfer,
    /// Loan proceeds or manual credit.
    Credit,
    /// Reward credited to the cashback balance.
    Cashback,
    /// Platform charge.
    Fee,
    /// Proceeds of a factored invoice.
    Factoring,
    /// Repayment towards a credit line.
    CreditPayment,
}

impl TransactionType {
    /// Returns the string representation of the type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::Payment => "payment",
            Self::Refund => "refund",
            Self::Transfer => "transfer",
            Self::Credit => "credit",
            Self::Cashback => "cashback",
            Self::Fee => "fee",
            Self::Factoring => "factoring",
            Self::CreditPayment => "credit_payment",
        }
    }

    /// Returns true if a completed transaction of this type may be refunded.
    #[must_use]
    pub fn is_refundable(&self) -> bool {
        matches!(self, Self::Payment | Self::Transfer)
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transaction status.
///
/// Valid transitions:
/// - Pending → Processing (start processing)
/// - Pending, Processing → Failed, Cancelled
/// - Processing → Completed (ledger effect applied)
/// - Completed → Refunded (payments and transfers only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Created, not yet picked up.
    Pending,
    /// Being processed.
    Processing,
    /// Ledger effect applied.
    Completed,
    /// Gave up; no ledger effect.
    Failed,
    /// Withdrawn before completion; no ledger effect.
    Cancelled,
    /// Ledger effect reversed by a refund record.
    Refunded,
}

impl TransactionStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
        }
    }

    /// Returns true if the state machine allows moving to `next`.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing | Self::Failed | Self::Cancelled)
                | (
                    Self::Processing,
                    Self::Completed | Self::Failed | Self::Cancelled
                )
                | (Self::Completed, Self::Refunded)
        )
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed | Self::Cancelled | Self::Refunded)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Wallet balance.
    #[default]
    Wallet,
    /// Credit line or wallet credit.
    Credit,
    /// SPEI or other bank transfer.
    BankTransfer,
    /// Debit or credit card.
    Card,
    /// Cash at a partner location.
    Cash,
}

/// Input for a new transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    /// Owner of the wallet.
    pub user_id: UserId,
    /// Wallet the effect applies to.
    pub wallet_id: WalletId,
    /// Kind of movement.
    pub transaction_type: TransactionType,
    /// Gross amount.
    pub amount: Decimal,
    /// Platform fee included in `amount`.
    pub fee: Decimal,
    /// Currency of `amount`; must match the wallet.
    pub currency: Currency,
    /// How the customer paid.
    pub payment_method: PaymentMethod,
    /// Receiving user for payments and transfers.
    pub counterparty_user_id: Option<UserId>,
    /// Receiving wallet for payments and transfers.
    pub counterparty_wallet_id: Option<WalletId>,
    /// Related credit line.
    pub credit_line_id: Option<CreditLineId>,
    /// Related invoice.
    pub invoice_id: Option<InvoiceId>,
    /// Free-form description.
    pub description: Option<String>,
}

/// Snapshot of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Row id.
    pub id: TransactionId,
    /// Human-facing reference (`TXN-…`).
    pub reference: String,
    /// Owner of the wallet.
    pub user_id: UserId,
    /// Wallet the effect applies to.
    pub wallet_id: WalletId,
    /// Kind of movement.
    pub transaction_type: TransactionType,
    /// Current status.
    pub status: TransactionStatus,
    /// Gross amount.
    pub amount: Decimal,
    /// Platform fee.
    pub fee: Decimal,
    /// `amount - fee`.
    pub net_amount: Decimal,
    /// Currency.
    pub currency: Currency,
    /// How the customer paid.
    pub payment_method: PaymentMethod,
    /// Receiving user.
    pub counterparty_user_id: Option<UserId>,
    /// Receiving wallet.
    pub counterparty_wallet_id: Option<WalletId>,
    /// Related credit line.
    pub credit_line_id: Option<CreditLineId>,
    /// Related invoice.
    pub invoice_id: Option<InvoiceId>,
    /// For refund records, the transaction being refunded.
    pub refund_of: Option<TransactionId>,
    /// Free-form description.
    pub description: Option<String>,
    /// Part of the debit taken from balance, set at completion.
    pub balance_portion: Decimal,
    /// Part of the debit drawn from credit, set at completion.
    pub credit_portion: Decimal,
    /// When the ledger effect was applied.
    pub processed_at: Option<DateTime<Utc>>,
    /// Why the transaction failed.
    pub failure_reason: Option<String>,
    /// Processing attempts after the first.
    pub retry_count: u32,
}

impl Transaction {
    /// Funding split recorded at completion.
    #[must_use]
    pub fn funding(&self) -> FundingSplit {
        FundingSplit {
            from_balance: self.balance_portion,
            from_credit: self.credit_portion,
        }
    }
}

/// A refund produced by the processor, ready to be stored as its own
/// completed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundRecord {
    /// Transaction that was refunded.
    pub refund_of: TransactionId,
    /// Owner of the refunded wallet.
    pub user_id: UserId,
    /// Wallet that received the money back.
    pub wallet_id: WalletId,
    /// Amount returned to the owner.
    pub amount: Decimal,
    /// Currency.
    pub currency: Currency,
    /// Counterparty the money was reclaimed from, if any.
    pub counterparty_user_id: Option<UserId>,
    /// Counterparty wallet the money was reclaimed from, if any.
    pub counterparty_wallet_id: Option<WalletId>,
    /// How the returned amount was split between balance and credit.
    pub restored: FundingSplit,
    /// When the refund was applied.
    pub processed_at: DateTime<Utc>,
}

impl RefundRecord {
    /// Builds the stored transaction for this refund.
    #[must_use]
    pub fn into_transaction(self, id: TransactionId, reference: String) -> Transaction {
        Transaction {
            id,
            reference,
            user_id: self.user_id,
            wallet_id: self.wallet_id,
            transaction_type: TransactionType::Refund,
            status: TransactionStatus::Completed,
            amount: self.amount,
            fee: Decimal::ZERO,
            net_amount: self.amount,
            currency: self.currency,
            payment_method: PaymentMethod::Wallet,
            counterparty_user_id: self.counterparty_user_id,
            counterparty_wallet_id: self.counterparty_wallet_id,
            credit_line_id: None,
            invoice_id: None,
            refund_of: Some(self.refund_of),
            description: Some(format!("Refund of transaction {}", self.refund_of)),
            balance_portion: self.restored.from_balance,
            credit_portion: self.restored.from_credit,
            processed_at: Some(self.processed_at),
            failure_reason: None,
            retry_count: 0,
        }
    }
}
