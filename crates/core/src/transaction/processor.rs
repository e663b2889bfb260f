//! Transaction processor.
//!
//! Completion is the only transition that touches wallets, and it can only
//! happen once because `completed` is never re-entered. Effects are computed
//! on copies of the wallets and written back together, so a failing
//! counterparty leaves the owner untouched as well.

use apex_shared::RefundFeePolicy;
use apex_shared::types::TransactionId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::ledger::error::LedgerError;
use crate::ledger::service::WalletLedger;
use crate::ledger::types::{FundingSplit, Wallet};
use crate::transaction::effect::{apply_owner_effect, effect_of};
use crate::transaction::types::{
    NewTransaction, RefundRecord, Transaction, TransactionStatus, TransactionType,
};

/// Failure reason recorded when the retry cap is reached.
pub const MAX_RETRIES_EXCEEDED: &str = "max retries exceeded";

/// Outcome of recording a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Try again; this is retry number `attempt`.
    Retry {
        /// Retries so far, including this one.
        attempt: u32,
    },
    /// The cap was reached and the transaction is now failed.
    Exhausted,
}

/// Stateless service driving the transaction state machine.
pub struct TransactionProcessor;

impl TransactionProcessor {
    /// Validates the input and builds a pending transaction.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount <= 0` or the fee is negative or not
    ///   smaller than the amount
    /// - `InvalidTransaction` for refund records or a counterparty equal to
    ///   the owner wallet
    /// - `MissingCounterparty` for a transfer without a counterparty wallet
    pub fn create(
        id: TransactionId,
        reference: String,
        new: NewTransaction,
    ) -> Result<Transaction, LedgerError> {
        apex_shared::types::ensure_currency_amount(new.amount)?;
        if new.fee < Decimal::ZERO || new.fee >= new.amount {
            return Err(LedgerError::InvalidAmount(format!(
                "fee {} must be at least zero and below the amount {}",
                new.fee, new.amount
            )));
        }
        apex_shared::types::ensure_currency_scale(new.fee)?;
        if new.transaction_type == TransactionType::Refund {
            return Err(LedgerError::InvalidTransaction(
                "refund records are created by refunding a completed transaction".to_string(),
            ));
        }
        if new.transaction_type == TransactionType::Transfer
            && new.counterparty_wallet_id.is_none()
        {
            return Err(LedgerError::MissingCounterparty);
        }
        if new.counterparty_wallet_id == Some(new.wallet_id) {
            return Err(LedgerError::InvalidTransaction(
                "counterparty wallet must differ from the owner wallet".to_string(),
            ));
        }

        Ok(Transaction {
            id,
            reference,
            user_id: new.user_id,
            wallet_id: new.wallet_id,
            transaction_type: new.transaction_type,
            status: TransactionStatus::Pending,
            amount: new.amount,
            fee: new.fee,
            net_amount: new.amount - new.fee,
            currency: new.currency,
            payment_method: new.payment_method,
            counterparty_user_id: new.counterparty_user_id,
            counterparty_wallet_id: new.counterparty_wallet_id,
            credit_line_id: new.credit_line_id,
            invoice_id: new.invoice_id,
            refund_of: None,
            description: new.description,
            balance_portion: Decimal::ZERO,
            credit_portion: Decimal::ZERO,
            processed_at: None,
            failure_reason: None,
            retry_count: 0,
        })
    }

    /// Pending → Processing.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` from any other status.
    pub fn start_processing(txn: &mut Transaction) -> Result<(), LedgerError> {
        move_to(txn, TransactionStatus::Processing)
    }

    /// Processing → Completed, applying the ledger effect.
    ///
    /// `counterparty` must be the wallet named by `counterparty_wallet_id`
    /// when the transaction has one.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` unless the transaction is processing
    /// - `MissingCounterparty` if the counterparty wallet is required but
    ///   not supplied
    /// - `CurrencyMismatch` if a wallet is in another currency
    /// - any wallet ledger error; nothing is changed in that case
    pub fn complete(
        txn: &mut Transaction,
        wallet: &mut Wallet,
        counterparty: Option<&mut Wallet>,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        ensure_transition(txn.status, TransactionStatus::Completed)?;
        ensure_wallet(wallet, txn)?;
        let effect = effect_of(txn)?;

        let mut owner = wallet.clone();
        let split = apply_owner_effect(&mut owner, effect.owner, now.date_naive())?;
        owner.last_transaction_at = Some(now);

        let counterparty = match effect.counterparty_credit {
            Some(net) => {
                let target = counterparty.ok_or(LedgerError::MissingCounterparty)?;
                ensure_counterparty(target, txn)?;
                let mut updated = target.clone();
                WalletLedger::credit(&mut updated, net)?;
                updated.last_transaction_at = Some(now);
                Some((target, updated))
            }
            None => None,
        };

        *wallet = owner;
        if let Some((target, updated)) = counterparty {
            *target = updated;
        }
        txn.status = TransactionStatus::Completed;
        txn.balance_portion = split.from_balance;
        txn.credit_portion = split.from_credit;
        txn.processed_at = Some(now);
        txn.failure_reason = None;
        Ok(())
    }

    /// Pending or Processing → Failed. Never touches the ledger.
    ///
    /// # Errors
    ///
    /// - `InvalidTransaction` if the reason is blank
    /// - `InvalidStateTransition` from any other status
    pub fn fail(txn: &mut Transaction, reason: &str) -> Result<(), LedgerError> {
        if reason.trim().is_empty() {
            return Err(LedgerError::InvalidTransaction(
                "failure reason is required".to_string(),
            ));
        }
        move_to(txn, TransactionStatus::Failed)?;
        txn.failure_reason = Some(reason.trim().to_string());
        Ok(())
    }

    /// Pending or Processing → Cancelled.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` from any other status.
    pub fn cancel(txn: &mut Transaction) -> Result<(), LedgerError> {
        move_to(txn, TransactionStatus::Cancelled)
    }

    /// Counts a processing re-attempt. Once `max_retries` re-attempts have
    /// been made, the next call marks the transaction failed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStateTransition` unless the transaction is pending or
    /// processing.
    pub fn record_retry(
        txn: &mut Transaction,
        max_retries: u32,
    ) -> Result<RetryDecision, LedgerError> {
        if !matches!(
            txn.status,
            TransactionStatus::Pending | TransactionStatus::Processing
        ) {
            return Err(LedgerError::transition(txn.status, "retry"));
        }

        if txn.retry_count >= max_retries {
            txn.status = TransactionStatus::Failed;
            txn.failure_reason = Some(MAX_RETRIES_EXCEEDED.to_string());
            return Ok(RetryDecision::Exhausted);
        }

        txn.retry_count += 1;
        Ok(RetryDecision::Retry {
            attempt: txn.retry_count,
        })
    }

    /// Completed → Refunded, reversing the original effect.
    ///
    /// The owner gets back `net_amount` under [`RefundFeePolicy::Retain`] or
    /// the full `amount` under [`RefundFeePolicy::Reverse`], repaying credit
    /// first. A counterparty gives back the `net_amount` it received.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` unless the transaction is completed
    /// - `NotRefundable` unless it is a payment or transfer
    /// - `MissingCounterparty` if the counterparty wallet is required but
    ///   not supplied
    /// - `InsufficientFunds` if the counterparty has already spent the money
    pub fn refund(
        original: &mut Transaction,
        wallet: &mut Wallet,
        counterparty: Option<&mut Wallet>,
        policy: RefundFeePolicy,
        now: DateTime<Utc>,
    ) -> Result<RefundRecord, LedgerError> {
        ensure_transition(original.status, TransactionStatus::Refunded)?;
        if !original.transaction_type.is_refundable() {
            return Err(LedgerError::NotRefundable(original.transaction_type));
        }
        ensure_wallet(wallet, original)?;

        let restored = refund_split(original, policy);
        let mut owner = wallet.clone();
        WalletLedger::restore(&mut owner, restored)?;
        owner.last_transaction_at = Some(now);

        let counterparty = match original.counterparty_wallet_id {
            Some(_) => {
                let target = counterparty.ok_or(LedgerError::MissingCounterparty)?;
                ensure_counterparty(target, original)?;
                let mut updated = target.clone();
                WalletLedger::reclaim(&mut updated, original.net_amount)?;
                updated.last_transaction_at = Some(now);
                Some((target, updated))
            }
            None => None,
        };

        *wallet = owner;
        if let Some((target, updated)) = counterparty {
            *target = updated;
        }
        original.status = TransactionStatus::Refunded;

        Ok(RefundRecord {
            refund_of: original.id,
            user_id: original.user_id,
            wallet_id: original.wallet_id,
            amount: restored.total(),
            currency: original.currency,
            counterparty_user_id: original.counterparty_user_id,
            counterparty_wallet_id: original.counterparty_wallet_id,
            restored,
            processed_at: now,
        })
    }
}

/// How much of a refund goes back to credit and how much to balance.
#[must_use]
pub fn refund_split(original: &Transaction, policy: RefundFeePolicy) -> FundingSplit {
    let returned = match policy {
        RefundFeePolicy::Retain => original.net_amount,
        RefundFeePolicy::Reverse => original.amount,
    };
    let from_credit = returned.min(original.credit_portion);
    FundingSplit {
        from_balance: returned - from_credit,
        from_credit,
    }
}

fn ensure_transition(from: TransactionStatus, to: TransactionStatus) -> Result<(), LedgerError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(LedgerError::transaction_transition(from, to))
    }
}

fn move_to(txn: &mut Transaction, to: TransactionStatus) -> Result<(), LedgerError> {
    ensure_transition(txn.status, to)?;
    txn.status = to;
    Ok(())
}

fn ensure_wallet(wallet: &Wallet, txn: &Transaction) -> Result<(), LedgerError> {
    if wallet.id != txn.wallet_id {
        return Err(LedgerError::Internal(format!(
            "wallet {} supplied for transaction on wallet {}",
            wallet.id, txn.wallet_id
        )));
    }
    if wallet.currency != txn.currency {
        return Err(LedgerError::CurrencyMismatch {
            expected: wallet.currency,
            actual: txn.currency,
        });
    }
    Ok(())
}

fn ensure_counterparty(wallet: &Wallet, txn: &Transaction) -> Result<(), LedgerError> {
    if Some(wallet.id) != txn.counterparty_wallet_id {
        return Err(LedgerError::Internal(format!(
            "wallet {} supplied as counterparty of transaction {}",
            wallet.id, txn.id
        )));
    }
    if wallet.currency != txn.currency {
        return Err(LedgerError::CurrencyMismatch {
            expected: wallet.currency,
            actual: txn.currency,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::error::LimitKind;
    use crate::ledger::service::is_consistent;
    use crate::transaction::types::PaymentMethod;
    use apex_shared::types::{Currency, UserId, WalletId};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 15, 10, 30, 0).unwrap()
    }

    fn wallet(id: i64, balance: Decimal, credit_limit: Decimal) -> Wallet {
        let mut wallet = Wallet::new(
            WalletId::new(id),
            UserId::new(id),
            Currency::Mxn,
            now().date_naive(),
        );
        wallet.balance = balance;
        wallet.available_balance = balance;
        wallet.credit_limit = credit_limit;
        wallet.available_credit = credit_limit;
        wallet
    }

    fn new_txn(kind: TransactionType, amount: Decimal, fee: Decimal) -> NewTransaction {
        NewTransaction {
            user_id: UserId::new(1),
            wallet_id: WalletId::new(1),
            transaction_type: kind,
            amount,
            fee,
            currency: Currency::Mxn,
            payment_method: PaymentMethod::Wallet,
            counterparty_user_id: None,
            counterparty_wallet_id: None,
            credit_line_id: None,
            invoice_id: None,
            description: None,
        }
    }

    fn transfer(amount: Decimal, fee: Decimal) -> NewTransaction {
        NewTransaction {
            counterparty_user_id: Some(UserId::new(2)),
            counterparty_wallet_id: Some(WalletId::new(2)),
            ..new_txn(TransactionType::Transfer, amount, fee)
        }
    }

    fn processing(new: NewTransaction) -> Transaction {
        let mut txn =
            TransactionProcessor::create(TransactionId::new(10), "TXN-TEST".to_string(), new)
                .unwrap();
        TransactionProcessor::start_processing(&mut txn).unwrap();
        txn
    }

    #[test]
    fn test_create_validates_input() {
        let id = TransactionId::new(1);
        let reference = || "TXN-1".to_string();

        assert!(matches!(
            TransactionProcessor::create(id, reference(), new_txn(TransactionType::Deposit, dec!(0), dec!(0))),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            TransactionProcessor::create(id, reference(), new_txn(TransactionType::Deposit, dec!(10), dec!(10))),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            TransactionProcessor::create(id, reference(), new_txn(TransactionType::Refund, dec!(10), dec!(0))),
            Err(LedgerError::InvalidTransaction(_))
        ));
        assert_eq!(
            TransactionProcessor::create(id, reference(), new_txn(TransactionType::Transfer, dec!(10), dec!(0))),
            Err(LedgerError::MissingCounterparty)
        );

        let txn = TransactionProcessor::create(id, reference(), transfer(dec!(100), dec!(2.50))).unwrap();
        assert_eq!(txn.status, TransactionStatus::Pending);
        assert_eq!(txn.net_amount, dec!(97.50));
    }

    #[test]
    fn test_deposit_credits_net_amount() {
        let mut owner = wallet(1, dec!(0), dec!(0));
        let mut txn = processing(new_txn(TransactionType::Deposit, dec!(100), dec!(1)));

        TransactionProcessor::complete(&mut txn, &mut owner, None, now()).unwrap();
        assert_eq!(owner.balance, dec!(99));
        assert_eq!(txn.status, TransactionStatus::Completed);
        assert_eq!(txn.processed_at, Some(now()));
        assert_eq!(owner.last_transaction_at, Some(now()));
    }

    #[test]
    fn test_complete_requires_processing() {
        let mut owner = wallet(1, dec!(0), dec!(0));
        let mut txn = TransactionProcessor::create(
            TransactionId::new(1),
            "TXN-1".to_string(),
            new_txn(TransactionType::Deposit, dec!(100), dec!(0)),
        )
        .unwrap();

        let err = TransactionProcessor::complete(&mut txn, &mut owner, None, now()).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidStateTransition { .. }));
        assert_eq!(owner.balance, dec!(0));
    }

    #[test]
    fn test_effect_applied_exactly_once() {
        let mut owner = wallet(1, dec!(0), dec!(0));
        let mut txn = processing(new_txn(TransactionType::Deposit, dec!(100), dec!(0)));

        TransactionProcessor::complete(&mut txn, &mut owner, None, now()).unwrap();
        assert!(TransactionProcessor::complete(&mut txn, &mut owner, None, now()).is_err());
        assert_eq!(owner.balance, dec!(100));
    }

    #[test]
    fn test_transfer_moves_funds_between_wallets() {
        let mut owner = wallet(1, dec!(100), dec!(200));
        let mut other = wallet(2, dec!(0), dec!(0));
        let mut txn = processing(transfer(dec!(150), dec!(5)));

        TransactionProcessor::complete(&mut txn, &mut owner, Some(&mut other), now()).unwrap();
        assert_eq!(owner.balance, dec!(0));
        assert_eq!(owner.used_credit, dec!(50));
        assert_eq!(other.balance, dec!(145));
        assert_eq!(txn.balance_portion, dec!(100));
        assert_eq!(txn.credit_portion, dec!(50));
        assert_eq!(owner.window.spent_today, dec!(150));
        assert!(is_consistent(&owner));
        assert!(is_consistent(&other));
    }

    #[test]
    fn test_transfer_failure_leaves_both_wallets_untouched() {
        let mut owner = wallet(1, dec!(100), dec!(0));
        let mut other = wallet(2, dec!(0), dec!(0));
        other.status = crate::ledger::types::WalletStatus::Suspended;
        let (owner_before, other_before) = (owner.clone(), other.clone());
        let mut txn = processing(transfer(dec!(50), dec!(0)));

        let err =
            TransactionProcessor::complete(&mut txn, &mut owner, Some(&mut other), now()).unwrap_err();
        assert_eq!(err, LedgerError::WalletClosed(WalletId::new(2)));
        assert_eq!(owner, owner_before);
        assert_eq!(other, other_before);
        assert_eq!(txn.status, TransactionStatus::Processing);
    }

    #[test]
    fn test_transfer_without_counterparty_wallet() {
        let mut owner = wallet(1, dec!(100), dec!(0));
        let mut txn = processing(transfer(dec!(50), dec!(0)));
        assert_eq!(
            TransactionProcessor::complete(&mut txn, &mut owner, None, now()),
            Err(LedgerError::MissingCounterparty)
        );
        assert_eq!(owner.balance, dec!(100));
    }

    #[test]
    fn test_withdrawal_respects_limit() {
        let mut owner = wallet(1, dec!(30000), dec!(10000));
        let mut txn = processing(new_txn(TransactionType::Withdrawal, dec!(20001), dec!(0)));
        let err = TransactionProcessor::complete(&mut txn, &mut owner, None, now()).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::LimitExceeded {
                kind: LimitKind::Withdrawal,
                ..
            }
        ));
        assert_eq!(owner.balance, dec!(30000));
    }

    #[test]
    fn test_cashback_goes_to_cashback_balance() {
        let mut owner = wallet(1, dec!(10), dec!(0));
        let mut txn = processing(new_txn(TransactionType::Cashback, dec!(5), dec!(0)));
        TransactionProcessor::complete(&mut txn, &mut owner, None, now()).unwrap();
        assert_eq!(owner.balance, dec!(10));
        assert_eq!(owner.cashback_balance, dec!(5));
    }

    #[test]
    fn test_currency_mismatch() {
        let mut owner = wallet(1, dec!(10), dec!(0));
        let mut txn = processing(NewTransaction {
            currency: Currency::Usd,
            ..new_txn(TransactionType::Deposit, dec!(5), dec!(0))
        });
        assert_eq!(
            TransactionProcessor::complete(&mut txn, &mut owner, None, now()),
            Err(LedgerError::CurrencyMismatch {
                expected: Currency::Mxn,
                actual: Currency::Usd,
            })
        );
    }

    #[test]
    fn test_fail_and_cancel() {
        let mut txn = processing(new_txn(TransactionType::Deposit, dec!(5), dec!(0)));
        assert!(TransactionProcessor::fail(&mut txn, "  ").is_err());
        TransactionProcessor::fail(&mut txn, "bank rejected").unwrap();
        assert_eq!(txn.status, TransactionStatus::Failed);
        assert_eq!(txn.failure_reason.as_deref(), Some("bank rejected"));
        assert!(TransactionProcessor::cancel(&mut txn).is_err());

        let mut txn = processing(new_txn(TransactionType::Deposit, dec!(5), dec!(0)));
        TransactionProcessor::cancel(&mut txn).unwrap();
        assert_eq!(txn.status, TransactionStatus::Cancelled);
    }

    #[test]
    fn test_retry_cap_marks_failed() {
        let mut txn = processing(new_txn(TransactionType::Deposit, dec!(5), dec!(0)));
        assert_eq!(
            TransactionProcessor::record_retry(&mut txn, 2),
            Ok(RetryDecision::Retry { attempt: 1 })
        );
        assert_eq!(
            TransactionProcessor::record_retry(&mut txn, 2),
            Ok(RetryDecision::Retry { attempt: 2 })
        );
        assert_eq!(
            TransactionProcessor::record_retry(&mut txn, 2),
            Ok(RetryDecision::Exhausted)
        );
        assert_eq!(txn.status, TransactionStatus::Failed);
        assert_eq!(txn.failure_reason.as_deref(), Some(MAX_RETRIES_EXCEEDED));
        assert_eq!(txn.retry_count, 2);
        assert!(TransactionProcessor::record_retry(&mut txn, 2).is_err());
    }

    #[test]
    fn test_refund_retain_fee() {
        let mut owner = wallet(1, dec!(100), dec!(200));
        let mut other = wallet(2, dec!(0), dec!(0));
        let owner_before = owner.clone();
        let mut txn = processing(transfer(dec!(150), dec!(10)));
        TransactionProcessor::complete(&mut txn, &mut owner, Some(&mut other), now()).unwrap();

        let record = TransactionProcessor::refund(
            &mut txn,
            &mut owner,
            Some(&mut other),
            RefundFeePolicy::Retain,
            now(),
        )
        .unwrap();

        assert_eq!(txn.status, TransactionStatus::Refunded);
        assert_eq!(record.amount, dec!(140));
        assert_eq!(record.restored.from_credit, dec!(50));
        assert_eq!(record.restored.from_balance, dec!(90));
        assert_eq!(owner.used_credit, dec!(0));
        assert_eq!(owner.balance, owner_before.balance - dec!(10));
        assert_eq!(other.balance, dec!(0));
    }

    #[test]
    fn test_refund_reverse_fee_restores_exactly() {
        let mut owner = wallet(1, dec!(100), dec!(200));
        let mut other = wallet(2, dec!(0), dec!(0));
        let (owner_before, other_before) = (owner.clone(), other.clone());
        let mut txn = processing(transfer(dec!(150), dec!(10)));
        TransactionProcessor::complete(&mut txn, &mut owner, Some(&mut other), now()).unwrap();

        TransactionProcessor::refund(
            &mut txn,
            &mut owner,
            Some(&mut other),
            RefundFeePolicy::Reverse,
            now(),
        )
        .unwrap();

        assert_eq!(owner.balance, owner_before.balance);
        assert_eq!(owner.used_credit, owner_before.used_credit);
        assert_eq!(owner.available_credit, owner_before.available_credit);
        assert_eq!(other.balance, other_before.balance);
    }

    #[test]
    fn test_refund_only_once_and_only_for_completed() {
        let mut owner = wallet(1, dec!(100), dec!(0));
        let mut txn = processing(new_txn(TransactionType::Payment, dec!(40), dec!(0)));
        assert!(matches!(
            TransactionProcessor::refund(&mut txn, &mut owner, None, RefundFeePolicy::Retain, now()),
            Err(LedgerError::InvalidStateTransition { .. })
        ));

        TransactionProcessor::complete(&mut txn, &mut owner, None, now()).unwrap();
        TransactionProcessor::refund(&mut txn, &mut owner, None, RefundFeePolicy::Retain, now())
            .unwrap();
        assert_eq!(owner.balance, dec!(100));
        assert!(matches!(
            TransactionProcessor::refund(&mut txn, &mut owner, None, RefundFeePolicy::Retain, now()),
            Err(LedgerError::InvalidStateTransition { .. })
        ));
        assert_eq!(owner.balance, dec!(100));
    }

    #[test]
    fn test_refund_rejects_other_types() {
        let mut owner = wallet(1, dec!(0), dec!(0));
        let mut txn = processing(new_txn(TransactionType::Deposit, dec!(40), dec!(0)));
        TransactionProcessor::complete(&mut txn, &mut owner, None, now()).unwrap();
        assert_eq!(
            TransactionProcessor::refund(&mut txn, &mut owner, None, RefundFeePolicy::Retain, now()),
            Err(LedgerError::NotRefundable(TransactionType::Deposit))
        );
        assert_eq!(txn.status, TransactionStatus::Completed);
    }

    #[test]
    fn test_refund_fails_when_counterparty_spent_funds() {
        let mut owner = wallet(1, dec!(100), dec!(0));
        let mut other = wallet(2, dec!(0), dec!(0));
        let mut txn = processing(transfer(dec!(100), dec!(0)));
        TransactionProcessor::complete(&mut txn, &mut owner, Some(&mut other), now()).unwrap();
        WalletLedger::debit(&mut other, dec!(60)).unwrap();

        let (owner_before, other_before) = (owner.clone(), other.clone());
        let err = TransactionProcessor::refund(
            &mut txn,
            &mut owner,
            Some(&mut other),
            RefundFeePolicy::Retain,
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
        assert_eq!(owner, owner_before);
        assert_eq!(other, other_before);
        assert_eq!(txn.status, TransactionStatus::Completed);
    }

    #[test]
    fn test_refund_record_into_transaction() {
        let mut owner = wallet(1, dec!(100), dec!(0));
        let mut txn = processing(new_txn(TransactionType::Payment, dec!(40), dec!(1)));
        TransactionProcessor::complete(&mut txn, &mut owner, None, now()).unwrap();
        let record =
            TransactionProcessor::refund(&mut txn, &mut owner, None, RefundFeePolicy::Retain, now())
                .unwrap();

        let refund = record.into_transaction(TransactionId::new(11), "TXN-R".to_string());
        assert_eq!(refund.transaction_type, TransactionType::Refund);
        assert_eq!(refund.status, TransactionStatus::Completed);
        assert_eq!(refund.refund_of, Some(TransactionId::new(10)));
        assert_eq!(refund.amount, dec!(39));
        assert_eq!(refund.balance_portion, dec!(39));
    }
}
