//! Credit line engine: draws, repayments, amortization and lifecycle.

use chrono::{DateTime, Months, TimeDelta, Utc};
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

use apex_shared::types::{CreditLineId, UserId, round_currency};

use crate::credit::status::{is_active, is_overdue};
use crate::credit::types::{
    CreditLine, CreditLineStatus, CreditTerms, PaymentFrequency, Repayment,
};
use crate::ledger::error::LedgerError;

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Highest annual rate, in percent, a line can be opened with.
pub const MAX_INTEREST_RATE: Decimal = dec!(999);

/// Longest term a line can be opened with.
pub const MAX_TERM_MONTHS: u32 = 600;

/// Stateless service for credit line operations.
pub struct CreditEngine;

impl CreditEngine {
    /// Opens a pending credit line.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` if the limit is not positive, the rate is
    /// outside `0..=MAX_INTEREST_RATE`, or the term is outside
    /// `1..=MAX_TERM_MONTHS`.
    pub fn open(
        id: CreditLineId,
        user_id: UserId,
        terms: CreditTerms,
    ) -> Result<CreditLine, LedgerError> {
        if terms.approved_limit <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(format!(
                "approved limit must be positive, got {}",
                terms.approved_limit
            )));
        }
        if terms.interest_rate < Decimal::ZERO || terms.interest_rate > MAX_INTEREST_RATE {
            return Err(LedgerError::InvalidAmount(format!(
                "interest rate must be between 0 and {MAX_INTEREST_RATE}, got {}",
                terms.interest_rate
            )));
        }
        if terms.term_months == 0 || terms.term_months > MAX_TERM_MONTHS {
            return Err(LedgerError::InvalidAmount(format!(
                "term must be between 1 and {MAX_TERM_MONTHS} months, got {}",
                terms.term_months
            )));
        }
        Ok(CreditLine::new(id, user_id, terms))
    }

    /// Draws `amount` from the line.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount <= 0`
    /// - `CreditLineInactive` if the line is not active or is overdue
    /// - `CreditLimitExceeded` if `amount > available_amount`
    pub fn draw(line: &mut CreditLine, amount: Decimal) -> Result<(), LedgerError> {
        apex_shared::types::ensure_currency_amount(amount)?;
        if !is_active(line) || is_overdue(line) {
            return Err(LedgerError::CreditLineInactive);
        }
        if amount > line.available_amount {
            return Err(LedgerError::CreditLimitExceeded {
                requested: amount,
                available: line.available_amount,
            });
        }

        line.used_amount += amount;
        recompute_available(line);
        refresh_schedule(line);
        Ok(())
    }

    /// Applies a payment: one month of interest on the outstanding balance
    /// first, the remainder to principal.
    ///
    /// A payment at least as large as the scheduled payment brings the line
    /// current again.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount <= 0` or it exceeds the outstanding
    ///   balance plus interest
    /// - `CreditLineInactive` if the line does not accept payments
    pub fn repay(
        line: &mut CreditLine,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Repayment, LedgerError> {
        apex_shared::types::ensure_currency_amount(amount)?;
        if !line.status.accepts_payments() {
            return Err(LedgerError::CreditLineInactive);
        }

        let interest = monthly_interest(line).min(amount);
        let principal = amount - interest;
        if principal > line.used_amount {
            return Err(LedgerError::InvalidAmount(format!(
                "payment {amount} exceeds outstanding balance {} plus interest {interest}",
                line.used_amount
            )));
        }

        let scheduled = line.next_payment_amount;
        line.used_amount -= principal;
        recompute_available(line);
        line.total_payments_made += 1;
        line.total_amount_paid += amount;
        line.total_interest_paid += interest;
        line.last_payment_date = Some(now);
        if amount >= scheduled {
            line.days_past_due = 0;
        }
        line.next_payment_date = next_due_date(now, line.payment_frequency);
        refresh_schedule(line);

        Ok(Repayment {
            interest,
            principal,
        })
    }

    /// Payment that amortizes `used_amount` over the remaining months.
    ///
    /// `P = r·A / (1 − (1+r)^−n)` with `r` the monthly rate, `A` the used
    /// amount and `n` the remaining months. Zero rate divides evenly; an
    /// expired term returns the full used amount. When `(1+r)^n` leaves the
    /// `Decimal` range the discount term is zero and the payment is the
    /// interest-only limit `r·A`.
    #[must_use]
    pub fn calculate_monthly_payment(line: &CreditLine) -> Decimal {
        if line.used_amount.is_zero() {
            return Decimal::ZERO;
        }

        let remaining = i64::from(line.term_months) - i64::from(line.total_payments_made);
        if remaining <= 0 {
            return line.used_amount;
        }

        let rate = monthly_rate(line);
        if rate.is_zero() {
            return round_currency(line.used_amount / Decimal::from(remaining));
        }

        // remaining is at most u32::MAX here
        let discount = (Decimal::ONE + rate)
            .checked_powu(remaining.unsigned_abs())
            .and_then(|growth| Decimal::ONE.checked_div(growth))
            .unwrap_or(Decimal::ZERO);
        let payment = rate
            .checked_mul(line.used_amount)
            .and_then(|interest| interest.checked_div(Decimal::ONE - discount));
        payment.map_or(line.used_amount, round_currency)
    }

    /// Pending → Approved.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` from any other status.
    pub fn approve(line: &mut CreditLine, now: DateTime<Utc>) -> Result<(), LedgerError> {
        transition(line, &[CreditLineStatus::Pending], CreditLineStatus::Approved)?;
        line.approval_date = Some(now);
        Ok(())
    }

    /// Approved → Active. Starts the term and the payment calendar.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` from any other status.
    pub fn activate(line: &mut CreditLine, now: DateTime<Utc>) -> Result<(), LedgerError> {
        transition(line, &[CreditLineStatus::Approved], CreditLineStatus::Active)?;
        line.activation_date = Some(now);
        line.maturity_date = now.checked_add_months(Months::new(line.term_months));
        line.next_payment_date = next_due_date(now, line.payment_frequency);
        Ok(())
    }

    /// Active → Suspended.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` from any other status.
    pub fn suspend(line: &mut CreditLine) -> Result<(), LedgerError> {
        transition(line, &[CreditLineStatus::Active], CreditLineStatus::Suspended)
    }

    /// Suspended → Active.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` from any other status.
    pub fn reactivate(line: &mut CreditLine) -> Result<(), LedgerError> {
        transition(line, &[CreditLineStatus::Suspended], CreditLineStatus::Active)
    }

    /// Closes a line that owes nothing.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` if the line is closed, defaulted, or
    /// still has a used amount.
    pub fn close(line: &mut CreditLine) -> Result<(), LedgerError> {
        if !line.used_amount.is_zero() {
            return Err(LedgerError::transition(
                format!("{} with outstanding balance {}", line.status, line.used_amount),
                CreditLineStatus::Closed,
            ));
        }
        transition(
            line,
            &[
                CreditLineStatus::Pending,
                CreditLineStatus::Approved,
                CreditLineStatus::Active,
                CreditLineStatus::Suspended,
            ],
            CreditLineStatus::Closed,
        )
    }

    /// Active or Suspended → Defaulted.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` from any other status.
    pub fn mark_default(line: &mut CreditLine) -> Result<(), LedgerError> {
        transition(
            line,
            &[CreditLineStatus::Active, CreditLineStatus::Suspended],
            CreditLineStatus::Defaulted,
        )
    }

    /// Records how many days the line is past due.
    ///
    /// Going from current to late counts as one late payment.
    pub fn record_days_past_due(line: &mut CreditLine, days: u32) {
        if days > 0 && line.days_past_due == 0 {
            line.late_payment_count += 1;
        }
        line.days_past_due = days;
    }

    /// Changes the limit in force.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` unless `used_amount <= new_limit <= approved_limit`
    ///   and `new_limit > 0`
    /// - `InvalidStateTransition` if the line is closed or defaulted
    pub fn adjust_limit(line: &mut CreditLine, new_limit: Decimal) -> Result<(), LedgerError> {
        if matches!(
            line.status,
            CreditLineStatus::Closed | CreditLineStatus::Defaulted
        ) {
            return Err(LedgerError::transition(line.status, "limit adjustment"));
        }
        if new_limit <= Decimal::ZERO
            || new_limit > line.approved_limit
            || new_limit < line.used_amount
        {
            return Err(LedgerError::InvalidAmount(format!(
                "limit must be between {} and {}, got {new_limit}",
                line.used_amount.max(Decimal::new(1, 2)),
                line.approved_limit
            )));
        }

        line.current_limit = new_limit;
        recompute_available(line);
        Ok(())
    }
}

fn transition(
    line: &mut CreditLine,
    allowed_from: &[CreditLineStatus],
    to: CreditLineStatus,
) -> Result<(), LedgerError> {
    if !allowed_from.contains(&line.status) {
        return Err(LedgerError::transition(line.status, to));
    }
    line.status = to;
    Ok(())
}

fn monthly_rate(line: &CreditLine) -> Decimal {
    line.interest_rate / MONTHS_PER_YEAR / Decimal::ONE_HUNDRED
}

fn monthly_interest(line: &CreditLine) -> Decimal {
    line.used_amount
        .checked_mul(monthly_rate(line))
        .map_or(line.used_amount, round_currency)
}

fn recompute_available(line: &mut CreditLine) {
    line.available_amount = (line.current_limit - line.used_amount).max(Decimal::ZERO);
}

fn refresh_schedule(line: &mut CreditLine) {
    let payment = CreditEngine::calculate_monthly_payment(line);
    line.next_payment_amount = payment;
    line.minimum_payment = payment;
}

fn next_due_date(from: DateTime<Utc>, frequency: PaymentFrequency) -> Option<DateTime<Utc>> {
    match frequency {
        PaymentFrequency::Weekly => from.checked_add_signed(TimeDelta::days(7)),
        PaymentFrequency::Biweekly => from.checked_add_signed(TimeDelta::days(14)),
        PaymentFrequency::Monthly => from.checked_add_months(Months::new(1)),
        PaymentFrequency::Quarterly => from.checked_add_months(Months::new(3)),
    }
}
