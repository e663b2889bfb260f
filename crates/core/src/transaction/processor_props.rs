//! Property-based tests for the transaction processor.

use apex_shared::RefundFeePolicy;
use apex_shared::types::{Currency, TransactionId, UserId, WalletId};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::ledger::service::is_consistent;
use crate::ledger::types::Wallet;
use crate::transaction::processor::TransactionProcessor;
use crate::transaction::types::{NewTransaction, PaymentMethod, TransactionType};

fn arb_cents(max: i64) -> impl Strategy<Value = Decimal> {
    (0i64..=max).prop_map(|cents| Decimal::new(cents, 2))
}

fn arb_wallet(id: i64) -> impl Strategy<Value = Wallet> {
    (arb_cents(2_000_000), arb_cents(2_000_000)).prop_map(move |(balance, credit_limit)| {
        let today = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap().date_naive();
        let mut wallet = Wallet::new(WalletId::new(id), UserId::new(id), Currency::Mxn, today);
        wallet.balance = balance;
        wallet.available_balance = balance;
        wallet.credit_limit = credit_limit;
        wallet.available_credit = credit_limit;
        wallet
    })
}

fn arb_policy() -> impl Strategy<Value = RefundFeePolicy> {
    prop_oneof![Just(RefundFeePolicy::Retain), Just(RefundFeePolicy::Reverse)]
}

/// Amount between 1.00 and 20,000.00 with a fee below it.
fn arb_amount_and_fee() -> impl Strategy<Value = (Decimal, Decimal)> {
    (100i64..=2_000_000i64).prop_flat_map(|cents| {
        (Just(Decimal::new(cents, 2)), (0i64..cents / 10).prop_map(|fee| Decimal::new(fee, 2)))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Completing then refunding a transfer restores both wallets, except
    /// that a retained fee stays with the platform.
    #[test]
    fn prop_refund_round_trip(
        owner in arb_wallet(1),
        other in arb_wallet(2),
        (amount, fee) in arb_amount_and_fee(),
        policy in arb_policy(),
    ) {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap();
        let new = NewTransaction {
            user_id: UserId::new(1),
            wallet_id: WalletId::new(1),
            transaction_type: TransactionType::Transfer,
            amount,
            fee,
            currency: Currency::Mxn,
            payment_method: PaymentMethod::Wallet,
            counterparty_user_id: Some(UserId::new(2)),
            counterparty_wallet_id: Some(WalletId::new(2)),
            credit_line_id: None,
            invoice_id: None,
            description: None,
        };
        let mut txn = TransactionProcessor::create(TransactionId::new(1), "TXN-P".into(), new).unwrap();
        TransactionProcessor::start_processing(&mut txn).unwrap();

        let (mut owner_after, mut other_after) = (owner.clone(), other.clone());
        if TransactionProcessor::complete(&mut txn, &mut owner_after, Some(&mut other_after), now).is_err() {
            prop_assert_eq!(&owner_after, &owner);
            prop_assert_eq!(&other_after, &other);
            return Ok(());
        }
        prop_assert_eq!(txn.balance_portion + txn.credit_portion, amount);

        TransactionProcessor::refund(&mut txn, &mut owner_after, Some(&mut other_after), policy, now)
            .unwrap();

        let kept_fee = match policy {
            RefundFeePolicy::Retain => fee,
            RefundFeePolicy::Reverse => Decimal::ZERO,
        };
        let owner_total = |w: &Wallet| w.balance - w.used_credit;
        prop_assert_eq!(owner_total(&owner_after), owner_total(&owner) - kept_fee);
        prop_assert_eq!(other_after.balance, other.balance);
        prop_assert!(is_consistent(&owner_after));
        prop_assert!(is_consistent(&other_after));
        if kept_fee.is_zero() {
            prop_assert_eq!(owner_after.balance, owner.balance);
            prop_assert_eq!(owner_after.used_credit, owner.used_credit);
        }
    }
}
