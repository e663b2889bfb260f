//! In-process ledger book.
//!
//! Holds wallets and transactions in memory and runs the same ledger and
//! processor functions the repositories run, under per-row mutexes.
//!
//! Lock order: the transaction first, then wallets in ascending id order.
//! Every operation follows it, so two transfers in opposite directions
//! cannot deadlock.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use apex_shared::LedgerConfig;
use apex_shared::types::{
    Currency, ReferenceKind, TransactionId, UserId, WalletId, new_reference,
};
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::ledger::error::LedgerError;
use crate::ledger::service::WalletLedger;
use crate::ledger::types::{FundingSplit, Wallet};
use crate::transaction::processor::{RetryDecision, TransactionProcessor};
use crate::transaction::types::{NewTransaction, Transaction};

#[cfg(test)]
mod tests;

type Shared<T> = Arc<Mutex<T>>;

/// Concurrent in-memory store of wallets and transactions.
#[derive(Debug, Default)]
pub struct LedgerBook {
    config: LedgerConfig,
    wallets: DashMap<WalletId, Shared<Wallet>>,
    transactions: DashMap<TransactionId, Shared<Transaction>>,
    next_wallet_id: AtomicI64,
    next_transaction_id: AtomicI64,
}

impl LedgerBook {
    /// Creates an empty book.
    #[must_use]
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Opens an active wallet with zero balances and default limits.
    pub fn open_wallet(&self, user_id: UserId, currency: Currency, today: NaiveDate) -> Wallet {
        let id = WalletId::new(self.next_wallet_id.fetch_add(1, Ordering::Relaxed) + 1);
        let wallet = Wallet::new(id, user_id, currency, today);
        self.wallets.insert(id, Arc::new(Mutex::new(wallet.clone())));
        info!(wallet_id = %id, user_id = %user_id, "wallet opened");
        wallet
    }

    /// Snapshot of a wallet.
    ///
    /// # Errors
    ///
    /// Returns `WalletNotFound` for an unknown id.
    pub fn wallet(&self, id: WalletId) -> Result<Wallet, LedgerError> {
        let handle = self.wallet_handle(id)?;
        let wallet = lock(&handle)?;
        Ok(wallet.clone())
    }

    /// Snapshot of a transaction.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` for an unknown id.
    pub fn transaction(&self, id: TransactionId) -> Result<Transaction, LedgerError> {
        let handle = self.transaction_handle(id)?;
        let txn = lock(&handle)?;
        Ok(txn.clone())
    }

    /// Credits a wallet directly.
    ///
    /// # Errors
    ///
    /// See [`WalletLedger::credit`].
    pub fn credit(&self, id: WalletId, amount: Decimal) -> Result<Wallet, LedgerError> {
        self.update_wallet(id, |wallet| WalletLedger::credit(wallet, amount))
            .map(|(wallet, ())| wallet)
    }

    /// Debits a wallet directly, returning how the debit was funded.
    ///
    /// # Errors
    ///
    /// See [`WalletLedger::debit`].
    pub fn debit(&self, id: WalletId, amount: Decimal) -> Result<FundingSplit, LedgerError> {
        self.update_wallet(id, |wallet| WalletLedger::debit(wallet, amount))
            .map(|(_, split)| split)
    }

    /// Reserves part of the available balance.
    ///
    /// # Errors
    ///
    /// See [`WalletLedger::freeze`].
    pub fn freeze(&self, id: WalletId, amount: Decimal) -> Result<Wallet, LedgerError> {
        self.update_wallet(id, |wallet| WalletLedger::freeze(wallet, amount))
            .map(|(wallet, ())| wallet)
    }

    /// Releases a reservation.
    ///
    /// # Errors
    ///
    /// See [`WalletLedger::unfreeze`].
    pub fn unfreeze(&self, id: WalletId, amount: Decimal) -> Result<Wallet, LedgerError> {
        self.update_wallet(id, |wallet| WalletLedger::unfreeze(wallet, amount))
            .map(|(wallet, ())| wallet)
    }

    /// Records a pending transaction.
    ///
    /// # Errors
    ///
    /// - `WalletNotFound` if the owner or counterparty wallet is unknown
    /// - any validation error from [`TransactionProcessor::create`]
    pub fn create_transaction(&self, new: NewTransaction) -> Result<Transaction, LedgerError> {
        self.wallet_handle(new.wallet_id)?;
        if let Some(counterparty) = new.counterparty_wallet_id {
            self.wallet_handle(counterparty)?;
        }

        let id = TransactionId::new(self.next_transaction_id.fetch_add(1, Ordering::Relaxed) + 1);
        let txn =
            TransactionProcessor::create(id, new_reference(ReferenceKind::Transaction), new)?;
        self.transactions.insert(id, Arc::new(Mutex::new(txn.clone())));
        info!(
            transaction_id = %id,
            reference = %txn.reference,
            kind = %txn.transaction_type,
            "transaction created"
        );
        Ok(txn)
    }

    /// Pending → Processing.
    ///
    /// # Errors
    ///
    /// See [`TransactionProcessor::start_processing`].
    pub fn start_processing(&self, id: TransactionId) -> Result<Transaction, LedgerError> {
        self.update_transaction(id, TransactionProcessor::start_processing)
    }

    /// Processing → Completed, applying the ledger effect.
    ///
    /// # Errors
    ///
    /// See [`TransactionProcessor::complete`].
    pub fn complete(
        &self,
        id: TransactionId,
        now: DateTime<Utc>,
    ) -> Result<Transaction, LedgerError> {
        let handle = self.transaction_handle(id)?;
        let mut txn = lock(&handle)?;
        let (owner, counterparty) = (txn.wallet_id, txn.counterparty_wallet_id);
        let result = self.with_wallets(owner, counterparty, |wallet, other| {
            TransactionProcessor::complete(&mut txn, wallet, other, now)
        });

        match result {
            Ok(()) => {
                info!(
                    transaction_id = %id,
                    wallet_id = %owner,
                    amount = %txn.amount,
                    "transaction completed"
                );
                Ok(txn.clone())
            }
            Err(err) => {
                warn!(
                    transaction_id = %id,
                    wallet_id = %owner,
                    error = %err,
                    "transaction not completed"
                );
                Err(err)
            }
        }
    }

    /// Pending or Processing → Failed.
    ///
    /// # Errors
    ///
    /// See [`TransactionProcessor::fail`].
    pub fn fail(&self, id: TransactionId, reason: &str) -> Result<Transaction, LedgerError> {
        self.update_transaction(id, |txn| TransactionProcessor::fail(txn, reason))
    }

    /// Pending or Processing → Cancelled.
    ///
    /// # Errors
    ///
    /// See [`TransactionProcessor::cancel`].
    pub fn cancel(&self, id: TransactionId) -> Result<Transaction, LedgerError> {
        self.update_transaction(id, TransactionProcessor::cancel)
    }

    /// Counts a processing re-attempt against `max_processing_retries`.
    ///
    /// # Errors
    ///
    /// See [`TransactionProcessor::record_retry`].
    pub fn record_retry(&self, id: TransactionId) -> Result<RetryDecision, LedgerError> {
        let handle = self.transaction_handle(id)?;
        let mut txn = lock(&handle)?;
        let decision =
            TransactionProcessor::record_retry(&mut txn, self.config.max_processing_retries)?;
        if decision == RetryDecision::Exhausted {
            warn!(
                transaction_id = %id,
                retries = txn.retry_count,
                "transaction failed after retries"
            );
        }
        Ok(decision)
    }

    /// Completed → Refunded. Stores and returns the new refund transaction.
    ///
    /// # Errors
    ///
    /// See [`TransactionProcessor::refund`].
    pub fn refund(
        &self,
        id: TransactionId,
        now: DateTime<Utc>,
    ) -> Result<Transaction, LedgerError> {
        let handle = self.transaction_handle(id)?;
        let mut original = lock(&handle)?;
        let (owner, counterparty) = (original.wallet_id, original.counterparty_wallet_id);
        let policy = self.config.refund_fee_policy;
        let record = self.with_wallets(owner, counterparty, |wallet, other| {
            TransactionProcessor::refund(&mut original, wallet, other, policy, now)
        })?;

        let refund_id =
            TransactionId::new(self.next_transaction_id.fetch_add(1, Ordering::Relaxed) + 1);
        let refund = record.into_transaction(refund_id, new_reference(ReferenceKind::Transaction));
        self.transactions
            .insert(refund_id, Arc::new(Mutex::new(refund.clone())));
        info!(
            transaction_id = %id,
            refund_id = %refund_id,
            amount = %refund.amount,
            "transaction refunded"
        );
        Ok(refund)
    }

    fn wallet_handle(&self, id: WalletId) -> Result<Shared<Wallet>, LedgerError> {
        self.wallets
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(LedgerError::WalletNotFound(id))
    }

    fn transaction_handle(&self, id: TransactionId) -> Result<Shared<Transaction>, LedgerError> {
        self.transactions
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(LedgerError::TransactionNotFound(id))
    }

    /// Runs `op` on a copy of the wallet and stores it only on success.
    fn update_wallet<R>(
        &self,
        id: WalletId,
        op: impl FnOnce(&mut Wallet) -> Result<R, LedgerError>,
    ) -> Result<(Wallet, R), LedgerError> {
        let handle = self.wallet_handle(id)?;
        let mut guard = lock(&handle)?;
        let mut wallet = guard.clone();
        let out = op(&mut wallet)?;
        *guard = wallet.clone();
        Ok((wallet, out))
    }

    fn update_transaction(
        &self,
        id: TransactionId,
        op: impl FnOnce(&mut Transaction) -> Result<(), LedgerError>,
    ) -> Result<Transaction, LedgerError> {
        let handle = self.transaction_handle(id)?;
        let mut txn = lock(&handle)?;
        op(&mut txn)?;
        Ok(txn.clone())
    }

    /// Locks the owner wallet and, if given, the counterparty wallet in
    /// ascending id order, then runs `op` with them in owner-first order.
    fn with_wallets<R>(
        &self,
        owner: WalletId,
        counterparty: Option<WalletId>,
        op: impl FnOnce(&mut Wallet, Option<&mut Wallet>) -> Result<R, LedgerError>,
    ) -> Result<R, LedgerError> {
        let owner_handle = self.wallet_handle(owner)?;
        let Some(other) = counterparty else {
            let mut wallet = lock(&owner_handle)?;
            return op(&mut *wallet, None);
        };
        if other == owner {
            return Err(LedgerError::InvalidTransaction(
                "counterparty wallet must differ from the owner wallet".to_string(),
            ));
        }

        let other_handle = self.wallet_handle(other)?;
        if owner < other {
            let mut wallet = lock(&owner_handle)?;
            let mut counterparty = lock(&other_handle)?;
            op(&mut *wallet, Some(&mut *counterparty))
        } else {
            let mut counterparty = lock(&other_handle)?;
            let mut wallet = lock(&owner_handle)?;
            op(&mut *wallet, Some(&mut *counterparty))
        }
    }
}

fn lock<T>(handle: &Mutex<T>) -> Result<MutexGuard<'_, T>, LedgerError> {
    handle
        .lock()
        .map_err(|_| LedgerError::Internal("ledger book lock poisoned".to_string()))
}
