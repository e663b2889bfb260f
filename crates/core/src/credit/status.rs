//! Read-only views over a credit line snapshot.

use rust_decimal::Decimal;

use crate::credit::types::{CreditLine, CreditLineStatus, PaymentStatus};

/// Classifies delinquency by days past due.
#[must_use]
pub fn payment_status(days_past_due: u32) -> PaymentStatus {
    match days_past_due {
        0 => PaymentStatus::Current,
        1..=30 => PaymentStatus::Late,
        31..=90 => PaymentStatus::Delinquent,
        _ => PaymentStatus::Default,
    }
}

/// Returns true if the line is in the `active` status.
#[must_use]
pub fn is_active(line: &CreditLine) -> bool {
    line.status == CreditLineStatus::Active
}

/// Returns true if any scheduled payment is overdue.
#[must_use]
pub fn is_overdue(line: &CreditLine) -> bool {
    line.days_past_due > 0
}

/// Returns true if `amount` could be drawn right now.
#[must_use]
pub fn can_draw(line: &CreditLine, amount: Decimal) -> bool {
    is_active(line)
        && amount > Decimal::ZERO
        && amount <= line.available_amount
        && !is_overdue(line)
}

/// Share of the current limit in use, as a percentage.
#[must_use]
pub fn utilization_rate(line: &CreditLine) -> Decimal {
    if line.current_limit.is_zero() {
        return Decimal::ZERO;
    }
    line.used_amount / line.current_limit * Decimal::ONE_HUNDRED
}

/// Checks the available-amount invariant.
#[must_use]
pub fn is_consistent(line: &CreditLine) -> bool {
    line.available_amount == (line.current_limit - line.used_amount).max(Decimal::ZERO)
        && line.used_amount <= line.current_limit
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, PaymentStatus::Current)]
    #[case(1, PaymentStatus::Late)]
    #[case(30, PaymentStatus::Late)]
    #[case(31, PaymentStatus::Delinquent)]
    #[case(90, PaymentStatus::Delinquent)]
    #[case(91, PaymentStatus::Default)]
    #[case(u32::MAX, PaymentStatus::Default)]
    fn test_payment_status_buckets(#[case] days: u32, #[case] expected: PaymentStatus) {
        assert_eq!(payment_status(days), expected);
    }
}
