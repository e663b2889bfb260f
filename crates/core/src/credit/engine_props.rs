//! Property-based tests for the credit engine.

use apex_shared::types::{CreditLineId, UserId};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::credit::engine::CreditEngine;
use crate::credit::status::is_consistent;
use crate::credit::types::{CreditLine, CreditTerms, CreditType, PaymentFrequency};

fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..=500_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Active lines with a limit up to 50,000 and an annual rate up to 60%.
fn arb_active_line() -> impl Strategy<Value = CreditLine> {
    (100i64..=5_000_000i64, 0i64..=6_000i64, 1u32..=60u32).prop_map(
        |(limit_cents, rate_bp, months)| {
            let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
            let terms = CreditTerms {
                credit_type: CreditType::Inventory,
                approved_limit: Decimal::new(limit_cents, 2),
                interest_rate: Decimal::new(rate_bp, 2),
                term_months: months,
                payment_frequency: PaymentFrequency::Monthly,
                provider: "test".to_string(),
            };
            let mut line = CreditEngine::open(CreditLineId::new(1), UserId::new(1), terms).unwrap();
            CreditEngine::approve(&mut line, now).unwrap();
            CreditEngine::activate(&mut line, now).unwrap();
            line
        },
    )
}

#[derive(Debug, Clone)]
enum Op {
    Draw(Decimal),
    Repay(Decimal),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        arb_amount().prop_map(Op::Draw),
        arb_amount().prop_map(Op::Repay),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// `available_amount == max(0, current_limit - used_amount)` and
    /// `used_amount <= current_limit` after any sequence of draws and
    /// repayments; failed operations change nothing.
    #[test]
    fn prop_available_amount_invariant(
        mut line in arb_active_line(),
        ops in prop::collection::vec(arb_op(), 1..30)
    ) {
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        for op in &ops {
            let before = line.clone();
            let result = match op {
                Op::Draw(amount) => CreditEngine::draw(&mut line, *amount),
                Op::Repay(amount) => CreditEngine::repay(&mut line, *amount, now).map(|_| ()),
            };
            if result.is_err() {
                prop_assert_eq!(&line, &before);
            }
            prop_assert!(is_consistent(&line));
        }
    }

    /// A repayment reduces `used_amount` by its principal part only.
    #[test]
    fn prop_repayment_reduces_by_principal(
        mut line in arb_active_line(),
        draw in arb_amount(),
        payment in arb_amount()
    ) {
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        if CreditEngine::draw(&mut line, draw).is_ok() {
            let used_before = line.used_amount;
            if let Ok(repayment) = CreditEngine::repay(&mut line, payment, now) {
                prop_assert_eq!(repayment.interest + repayment.principal, payment);
                prop_assert_eq!(line.used_amount, used_before - repayment.principal);
                prop_assert!(line.used_amount >= Decimal::ZERO);
            }
        }
    }

    /// The scheduled payment never exceeds one month's balance plus interest.
    #[test]
    fn prop_monthly_payment_bounds(mut line in arb_active_line(), draw in arb_amount()) {
        if CreditEngine::draw(&mut line, draw).is_ok() {
            let payment = CreditEngine::calculate_monthly_payment(&line);
            prop_assert!(payment >= Decimal::ZERO);
            prop_assert!(payment <= line.used_amount * (Decimal::ONE + line.interest_rate / Decimal::ONE_HUNDRED) + Decimal::ONE);
        }
    }
}
