//! Property-based tests for the wallet ledger.

use apex_shared::types::{Currency, UserId, WalletId};
use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::ledger::error::LedgerError;
use crate::ledger::service::{WalletLedger, is_consistent, total_available};
use crate::ledger::types::Wallet;

/// Strategy for amounts between 0.01 and 10,000.00.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..=1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for wallets holding some balance and overdraft credit.
fn arb_wallet() -> impl Strategy<Value = Wallet> {
    (arb_amount(), 0i64..=500_000i64).prop_map(|(balance, limit_cents)| {
        let today = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let mut wallet = Wallet::new(WalletId::new(1), UserId::new(1), Currency::Mxn, today);
        wallet.balance = balance;
        wallet.available_balance = balance;
        wallet.credit_limit = Decimal::new(limit_cents, 2);
        wallet.available_credit = wallet.credit_limit;
        wallet
    })
}

#[derive(Debug, Clone)]
enum Op {
    Credit(Decimal),
    Debit(Decimal),
    Freeze(Decimal),
    Unfreeze(Decimal),
    CreditLimit(Decimal),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        arb_amount().prop_map(Op::Credit),
        arb_amount().prop_map(Op::Debit),
        arb_amount().prop_map(Op::Freeze),
        arb_amount().prop_map(Op::Unfreeze),
        arb_amount().prop_map(Op::CreditLimit),
    ]
}

fn apply(wallet: &mut Wallet, op: &Op) -> Result<(), LedgerError> {
    match op {
        Op::Credit(amount) => WalletLedger::credit(wallet, *amount),
        Op::Debit(amount) => WalletLedger::debit(wallet, *amount).map(|_| ()),
        Op::Freeze(amount) => WalletLedger::freeze(wallet, *amount),
        Op::Unfreeze(amount) => WalletLedger::unfreeze(wallet, *amount),
        Op::CreditLimit(limit) => WalletLedger::set_credit_limit(wallet, *limit),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Both wallet invariants hold after any sequence of operations,
    /// whether each operation succeeded or failed.
    #[test]
    fn prop_invariants_hold_for_any_sequence(
        mut wallet in arb_wallet(),
        ops in prop::collection::vec(arb_op(), 1..40)
    ) {
        for op in &ops {
            let before = wallet.clone();
            if apply(&mut wallet, op).is_err() {
                prop_assert_eq!(&wallet, &before);
            }
            prop_assert!(is_consistent(&wallet));
            prop_assert!(wallet.available_balance >= Decimal::ZERO);
            prop_assert!(wallet.frozen_balance >= Decimal::ZERO);
        }
    }

    /// Debiting more than balance plus credit fails and changes nothing.
    #[test]
    fn prop_overdraft_rejected(wallet in arb_wallet(), extra in arb_amount()) {
        let mut target = wallet.clone();
        let amount = total_available(&wallet) + extra;
        let result = WalletLedger::debit(&mut target, amount);
        let is_insufficient = matches!(result, Err(LedgerError::InsufficientFunds { .. }));
        prop_assert!(is_insufficient);
        prop_assert_eq!(target, wallet);
    }

    /// A successful debit's split adds up to the amount and restoring it
    /// returns the wallet to its prior state.
    #[test]
    fn prop_debit_then_restore_is_identity(wallet in arb_wallet(), amount in arb_amount()) {
        let mut target = wallet.clone();
        if let Ok(split) = WalletLedger::debit(&mut target, amount) {
            prop_assert_eq!(split.total(), amount);
            prop_assert!(split.from_credit.is_zero() || target.available_balance.is_zero());
            WalletLedger::restore(&mut target, split).unwrap();
            prop_assert_eq!(target, wallet);
        }
    }
}
