//! Wallet domain types.

use std::fmt;

use apex_shared::types::{Currency, UserId, WalletId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::ledger::window::{SpendLimits, SpendWindow};

/// Default maximum outgoing total per day.
pub const DEFAULT_DAILY_LIMIT: Decimal = dec!(50000);
/// Default maximum outgoing total per month.
pub const DEFAULT_MONTHLY_LIMIT: Decimal = dec!(500000);
/// Default maximum withdrawals per day.
pub const DEFAULT_WITHDRAWAL_LIMIT: Decimal = dec!(20000);

/// Wallet lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletStatus {
    /// Wallet can move money.
    Active,
    /// Temporarily blocked.
    Suspended,
    /// Soft-deleted; never reopened.
    Closed,
}

impl WalletStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for WalletStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of a wallet's balances, limits and spend counters.
///
/// Invariants kept by every ledger operation:
/// - `available_balance + frozen_balance == balance`
/// - `available_credit == max(0, credit_limit - used_credit)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Wallet id.
    pub id: WalletId,
    /// Owning user.
    pub user_id: UserId,
    /// Wallet currency.
    pub currency: Currency,
    /// Total funds held.
    pub balance: Decimal,
    /// Funds that can be spent.
    pub available_balance: Decimal,
    /// Funds on hold.
    pub frozen_balance: Decimal,
    /// Overdraft credit granted to the wallet.
    pub credit_limit: Decimal,
    /// Credit currently drawn.
    pub used_credit: Decimal,
    /// Credit still available.
    pub available_credit: Decimal,
    /// Cashback not yet redeemed.
    pub cashback_balance: Decimal,
    /// Lifetime cashback.
    pub total_cashback_earned: Decimal,
    /// Maximum outgoing total per day.
    pub daily_limit: Decimal,
    /// Maximum outgoing total per month.
    pub monthly_limit: Decimal,
    /// Maximum withdrawals per day.
    pub withdrawal_limit: Decimal,
    /// Period-to-date spend counters.
    pub window: SpendWindow,
    /// Lifecycle status.
    pub status: WalletStatus,
    /// When the last completed movement touched this wallet.
    pub last_transaction_at: Option<DateTime<Utc>>,
}

impl Wallet {
    /// Creates an empty active wallet with the default limits.
    #[must_use]
    pub fn new(id: WalletId, user_id: UserId, currency: Currency, today: NaiveDate) -> Self {
        Self {
            id,
            user_id,
            currency,
            balance: Decimal::ZERO,
            available_balance: Decimal::ZERO,
            frozen_balance: Decimal::ZERO,
            credit_limit: Decimal::ZERO,
            used_credit: Decimal::ZERO,
            available_credit: Decimal::ZERO,
            cashback_balance: Decimal::ZERO,
            total_cashback_earned: Decimal::ZERO,
            daily_limit: DEFAULT_DAILY_LIMIT,
            monthly_limit: DEFAULT_MONTHLY_LIMIT,
            withdrawal_limit: DEFAULT_WITHDRAWAL_LIMIT,
            window: SpendWindow::new(today),
            status: WalletStatus::Active,
            last_transaction_at: None,
        }
    }

    /// Returns the limits the spend window is checked against.
    #[must_use]
    pub fn limits(&self) -> SpendLimits {
        SpendLimits {
            daily: self.daily_limit,
            monthly: self.monthly_limit,
            withdrawal: self.withdrawal_limit,
        }
    }

    /// Returns true if the wallet can move money.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == WalletStatus::Active
    }
}

/// How a debit was funded.
///
/// Recorded on the transaction at completion so that a refund can put each
/// part back where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FundingSplit {
    /// Taken from `available_balance`.
    pub from_balance: Decimal,
    /// Drawn from `available_credit`.
    pub from_credit: Decimal,
}

impl FundingSplit {
    /// Total amount funded.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.from_balance + self.from_credit
    }
}
