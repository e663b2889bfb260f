use std::sync::Barrier;
use std::thread;

use apex_shared::types::{Currency, UserId, WalletId};
use apex_shared::{LedgerConfig, RefundFeePolicy};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::LedgerBook;
use crate::ledger::error::LedgerError;
use crate::ledger::service::is_consistent;
use crate::transaction::processor::{MAX_RETRIES_EXCEEDED, RetryDecision};
use crate::transaction::types::{
    NewTransaction, PaymentMethod, TransactionStatus, TransactionType,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap()
}

fn today() -> NaiveDate {
    now().date_naive()
}

fn funded_wallet(book: &LedgerBook, user: i64, amount: Decimal) -> WalletId {
    let wallet = book.open_wallet(UserId::new(user), Currency::Mxn, today());
    book.credit(wallet.id, amount).unwrap();
    wallet.id
}

fn transfer(from: WalletId, to: WalletId, amount: Decimal, fee: Decimal) -> NewTransaction {
    NewTransaction {
        user_id: UserId::new(from.get()),
        wallet_id: from,
        transaction_type: TransactionType::Transfer,
        amount,
        fee,
        currency: Currency::Mxn,
        payment_method: PaymentMethod::Wallet,
        counterparty_user_id: Some(UserId::new(to.get())),
        counterparty_wallet_id: Some(to),
        credit_line_id: None,
        invoice_id: None,
        description: None,
    }
}

fn run_transfer(book: &LedgerBook, new: NewTransaction) -> Result<(), LedgerError> {
    let txn = book.create_transaction(new)?;
    book.start_processing(txn.id)?;
    book.complete(txn.id, now())?;
    Ok(())
}

#[test]
fn test_concurrent_debits_cannot_overdraw() {
    let book = LedgerBook::default();
    let id = funded_wallet(&book, 1, dec!(1000));
    let barrier = Barrier::new(2);

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = [dec!(600), dec!(700)]
            .into_iter()
            .map(|amount| {
                let (book, barrier) = (&book, &barrier);
                s.spawn(move || {
                    barrier.wait();
                    book.debit(id, amount).map(|_| amount)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let succeeded: Vec<Decimal> = results.iter().filter_map(|r| r.clone().ok()).collect();
    assert_eq!(succeeded.len(), 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(LedgerError::InsufficientFunds { .. })
    )));

    let wallet = book.wallet(id).unwrap();
    assert_eq!(wallet.balance, dec!(1000) - succeeded[0]);
    assert!(is_consistent(&wallet));
}

#[test]
fn test_opposite_transfers_do_not_deadlock() {
    let book = LedgerBook::default();
    let a = funded_wallet(&book, 1, dec!(1000));
    let b = funded_wallet(&book, 2, dec!(1000));
    let barrier = Barrier::new(2);

    thread::scope(|s| {
        for (from, to) in [(a, b), (b, a)] {
            let (book, barrier) = (&book, &barrier);
            s.spawn(move || {
                barrier.wait();
                for _ in 0..50 {
                    run_transfer(book, transfer(from, to, dec!(10), Decimal::ZERO)).unwrap();
                }
            });
        }
    });

    let (a, b) = (book.wallet(a).unwrap(), book.wallet(b).unwrap());
    assert_eq!(a.balance, dec!(1000));
    assert_eq!(b.balance, dec!(1000));
    assert_eq!(a.window.spent_today, dec!(500));
}

#[test]
fn test_failed_completion_leaves_wallets_untouched() {
    let book = LedgerBook::default();
    let a = funded_wallet(&book, 1, dec!(100));
    let b = funded_wallet(&book, 2, dec!(0));

    let txn = book
        .create_transaction(transfer(a, b, dec!(150), Decimal::ZERO))
        .unwrap();
    book.start_processing(txn.id).unwrap();
    assert!(matches!(
        book.complete(txn.id, now()),
        Err(LedgerError::InsufficientFunds { .. })
    ));

    assert_eq!(book.wallet(a).unwrap().balance, dec!(100));
    assert_eq!(book.wallet(b).unwrap().balance, Decimal::ZERO);
    assert_eq!(
        book.transaction(txn.id).unwrap().status,
        TransactionStatus::Processing
    );
}

#[test]
fn test_refund_records_new_transaction() {
    let book = LedgerBook::new(LedgerConfig {
        refund_fee_policy: RefundFeePolicy::Retain,
        ..LedgerConfig::default()
    });
    let a = funded_wallet(&book, 1, dec!(500));
    let b = funded_wallet(&book, 2, dec!(0));

    let txn = book
        .create_transaction(transfer(a, b, dec!(200), dec!(5)))
        .unwrap();
    book.start_processing(txn.id).unwrap();
    book.complete(txn.id, now()).unwrap();
    assert_eq!(book.wallet(b).unwrap().balance, dec!(195));

    let refund = book.refund(txn.id, now()).unwrap();
    assert_eq!(refund.transaction_type, TransactionType::Refund);
    assert_eq!(refund.refund_of, Some(txn.id));
    assert_eq!(refund.amount, dec!(195));
    assert_eq!(book.transaction(refund.id).unwrap(), refund);
    assert_eq!(
        book.transaction(txn.id).unwrap().status,
        TransactionStatus::Refunded
    );
    assert_eq!(book.wallet(a).unwrap().balance, dec!(495));
    assert_eq!(book.wallet(b).unwrap().balance, Decimal::ZERO);

    assert!(matches!(
        book.refund(txn.id, now()),
        Err(LedgerError::InvalidStateTransition { .. })
    ));
}

#[test]
fn test_record_retry_uses_configured_cap() {
    let book = LedgerBook::new(LedgerConfig {
        max_processing_retries: 2,
        ..LedgerConfig::default()
    });
    let a = funded_wallet(&book, 1, dec!(100));
    let b = funded_wallet(&book, 2, dec!(0));
    let txn = book
        .create_transaction(transfer(a, b, dec!(10), Decimal::ZERO))
        .unwrap();

    assert_eq!(
        book.record_retry(txn.id).unwrap(),
        RetryDecision::Retry { attempt: 1 }
    );
    assert_eq!(
        book.record_retry(txn.id).unwrap(),
        RetryDecision::Retry { attempt: 2 }
    );
    assert_eq!(book.record_retry(txn.id).unwrap(), RetryDecision::Exhausted);

    let failed = book.transaction(txn.id).unwrap();
    assert_eq!(failed.status, TransactionStatus::Failed);
    assert_eq!(failed.retry_count, 2);
    assert_eq!(failed.failure_reason.as_deref(), Some(MAX_RETRIES_EXCEEDED));
}

#[test]
fn test_unknown_rows() {
    let book = LedgerBook::default();
    let a = funded_wallet(&book, 1, dec!(100));
    let missing = WalletId::new(99);

    assert_eq!(
        book.credit(missing, dec!(1)).unwrap_err(),
        LedgerError::WalletNotFound(missing)
    );
    assert_eq!(
        book.create_transaction(transfer(a, missing, dec!(1), Decimal::ZERO))
            .unwrap_err(),
        LedgerError::WalletNotFound(missing)
    );
}

#[test]
fn test_freeze_round_trip() {
    let book = LedgerBook::default();
    let a = funded_wallet(&book, 1, dec!(100));

    let frozen = book.freeze(a, dec!(40)).unwrap();
    assert_eq!(frozen.available_balance, dec!(60));
    assert!(book.debit(a, dec!(70)).is_err());

    let released = book.unfreeze(a, dec!(40)).unwrap();
    assert_eq!(released.available_balance, dec!(100));
    assert_eq!(released.frozen_balance, Decimal::ZERO);
}
