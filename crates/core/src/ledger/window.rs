//! Period-to-date spend tracking.
//!
//! Daily and monthly limits are checked against counters that are stored
//! with the wallet. Periods are calendar days and calendar months in UTC:
//! the first movement on a new day clears the daily counters, and the first
//! movement in a new month clears the monthly counter as well.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::error::{LedgerError, LimitKind};

/// Spend counters for the period that contains `day`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendWindow {
    /// Day the counters were last written.
    pub day: NaiveDate,
    /// Outgoing total for `day`.
    pub spent_today: Decimal,
    /// Outgoing total for the month containing `day`.
    pub spent_this_month: Decimal,
    /// Withdrawals for `day`.
    pub withdrawn_today: Decimal,
}

/// The limits a window is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpendLimits {
    /// Maximum outgoing total per day.
    pub daily: Decimal,
    /// Maximum outgoing total per month.
    pub monthly: Decimal,
    /// Maximum withdrawals per day.
    pub withdrawal: Decimal,
}

impl SpendWindow {
    /// Creates empty counters starting at `day`.
    #[must_use]
    pub fn new(day: NaiveDate) -> Self {
        Self {
            day,
            spent_today: Decimal::ZERO,
            spent_this_month: Decimal::ZERO,
            withdrawn_today: Decimal::ZERO,
        }
    }

    /// Returns the counters as they stand on `today`.
    ///
    /// A `today` earlier than the stored day (clock skew between writers)
    /// keeps the stored counters.
    #[must_use]
    pub fn rolled(&self, today: NaiveDate) -> Self {
        if today <= self.day {
            return *self;
        }
        let same_month = today.year() == self.day.year() && today.month() == self.day.month();
        Self {
            day: today,
            spent_today: Decimal::ZERO,
            spent_this_month: if same_month {
                self.spent_this_month
            } else {
                Decimal::ZERO
            },
            withdrawn_today: Decimal::ZERO,
        }
    }

    /// Checks that an outgoing `amount` fits the daily and monthly limits.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::LimitExceeded` naming the first limit hit.
    pub fn check_spend(
        &self,
        limits: &SpendLimits,
        amount: Decimal,
        today: NaiveDate,
    ) -> Result<(), LedgerError> {
        let current = self.rolled(today);
        ensure_within(LimitKind::Daily, limits.daily, current.spent_today + amount)?;
        ensure_within(
            LimitKind::Monthly,
            limits.monthly,
            current.spent_this_month + amount,
        )
    }

    /// Checks that a withdrawal fits the withdrawal limit and the spend limits.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::LimitExceeded` naming the first limit hit.
    pub fn check_withdrawal(
        &self,
        limits: &SpendLimits,
        amount: Decimal,
        today: NaiveDate,
    ) -> Result<(), LedgerError> {
        let current = self.rolled(today);
        ensure_within(
            LimitKind::Withdrawal,
            limits.withdrawal,
            current.withdrawn_today + amount,
        )?;
        self.check_spend(limits, amount, today)
    }

    /// Adds an outgoing movement to the counters for `today`.
    pub fn record_spend(&mut self, amount: Decimal, today: NaiveDate) {
        *self = self.rolled(today);
        self.spent_today += amount;
        self.spent_this_month += amount;
    }

    /// Adds a withdrawal to the counters for `today`.
    pub fn record_withdrawal(&mut self, amount: Decimal, today: NaiveDate) {
        self.record_spend(amount, today);
        self.withdrawn_today += amount;
    }
}

fn ensure_within(kind: LimitKind, limit: Decimal, attempted: Decimal) -> Result<(), LedgerError> {
    if attempted > limit {
        Err(LedgerError::LimitExceeded {
            kind,
            limit,
            attempted,
        })
    } else {
        Ok(())
    }
}
