//! Transaction repository.
//!
//! Lock order inside a unit of work: the transaction row first, then the
//! wallets in ascending id order.

use apex_core::LedgerError;
use apex_core::RetryPolicy;
use apex_core::transaction::{NewTransaction, RetryDecision, Transaction, TransactionProcessor};
use apex_shared::types::{
    PageRequest, PageResponse, ReferenceKind, TransactionId, WalletId, new_reference,
};
use apex_shared::{LedgerConfig, RefundFeePolicy};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use tracing::{info, warn};

use super::error::RepositoryError;
use super::mapping::{
    apply_transaction, new_transaction_row, transaction_from_model, wallet_from_model,
};
use super::retry::with_retry;
use super::wallet::{lock_pair, save_wallet};
use crate::entities::{transactions, wallets};

/// Transaction repository.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
    retry: RetryPolicy,
    max_processing_retries: u32,
    refund_fee_policy: RefundFeePolicy,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: &LedgerConfig) -> Self {
        Self {
            db,
            retry: RetryPolicy::with_attempts(config.conflict_retry_attempts),
            max_processing_retries: config.max_processing_retries,
            refund_fee_policy: config.refund_fee_policy,
        }
    }

    /// Records a pending transaction.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the owner or counterparty wallet does not exist
    /// - any validation error from [`TransactionProcessor::create`]
    pub async fn create(&self, new: NewTransaction) -> Result<Transaction, RepositoryError> {
        ensure_wallet_exists(&self.db, new.wallet_id).await?;
        if let Some(counterparty) = new.counterparty_wallet_id {
            ensure_wallet_exists(&self.db, counterparty).await?;
        }

        let draft = TransactionProcessor::create(
            TransactionId::new(0),
            new_reference(ReferenceKind::Transaction),
            new,
        )?;
        let model = new_transaction_row(&draft)?.insert(&self.db).await?;
        info!(
            transaction_id = model.id,
            reference = %model.transaction_id,
            kind = %draft.transaction_type,
            "transaction created"
        );
        transaction_from_model(&model)
    }

    /// Finds a transaction by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if there is no such transaction.
    pub async fn find(&self, id: TransactionId) -> Result<Transaction, RepositoryError> {
        let model = transactions::Entity::find_by_id(id.get())
            .one(&self.db)
            .await?
            .ok_or(not_found(id))?;
        transaction_from_model(&model)
    }

    /// Lists transactions where the wallet is owner or counterparty, newest
    /// first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_for_wallet(
        &self,
        wallet_id: WalletId,
        page: PageRequest,
    ) -> Result<PageResponse<Transaction>, RepositoryError> {
        let query = transactions::Entity::find().filter(
            Condition::any()
                .add(transactions::Column::WalletId.eq(wallet_id.get()))
                .add(transactions::Column::CounterpartyWalletId.eq(wallet_id.get())),
        );

        let total = query.clone().count(&self.db).await?;
        let data = query
            .order_by_desc(transactions::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?
            .iter()
            .map(transaction_from_model)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    /// Pending → Processing.
    ///
    /// # Errors
    ///
    /// See [`TransactionProcessor::start_processing`].
    pub async fn start_processing(&self, id: TransactionId) -> Result<Transaction, RepositoryError> {
        self.mutate(id, "transaction.start_processing", |txn| {
            TransactionProcessor::start_processing(txn)
        })
        .await
        .map(|(txn, ())| txn)
    }

    /// Pending or Processing → Failed.
    ///
    /// # Errors
    ///
    /// See [`TransactionProcessor::fail`].
    pub async fn fail(
        &self,
        id: TransactionId,
        reason: &str,
    ) -> Result<Transaction, RepositoryError> {
        self.mutate(id, "transaction.fail", |txn| TransactionProcessor::fail(txn, reason))
            .await
            .map(|(txn, ())| txn)
    }

    /// Pending or Processing → Cancelled.
    ///
    /// # Errors
    ///
    /// See [`TransactionProcessor::cancel`].
    pub async fn cancel(&self, id: TransactionId) -> Result<Transaction, RepositoryError> {
        self.mutate(id, "transaction.cancel", |txn| TransactionProcessor::cancel(txn))
            .await
            .map(|(txn, ())| txn)
    }

    /// Counts a processing re-attempt; the transaction fails once the
    /// configured cap is reached.
    ///
    /// # Errors
    ///
    /// See [`TransactionProcessor::record_retry`].
    pub async fn record_retry(&self, id: TransactionId) -> Result<RetryDecision, RepositoryError> {
        let max = self.max_processing_retries;
        let (txn, decision) = self
            .mutate(id, "transaction.record_retry", move |txn| {
                TransactionProcessor::record_retry(txn, max)
            })
            .await?;
        if decision == RetryDecision::Exhausted {
            warn!(
                transaction_id = %id,
                retries = txn.retry_count,
                "transaction failed after retries"
            );
        }
        Ok(decision)
    }

    /// Processing → Completed, applying the ledger effect to the wallets in
    /// the same database transaction.
    ///
    /// # Errors
    ///
    /// See [`TransactionProcessor::complete`]; `RetriesExhausted` if the unit
    /// keeps conflicting.
    pub async fn complete(
        &self,
        id: TransactionId,
        now: DateTime<Utc>,
    ) -> Result<Transaction, RepositoryError> {
        let result = with_retry(self.retry, "transaction.complete", || async move {
            let db_txn = self.db.begin().await?;
            let model = lock_transaction(&db_txn, id).await?;
            let mut record = transaction_from_model(&model)?;

            let (owner_row, counterparty_row) =
                lock_pair(&db_txn, record.wallet_id, record.counterparty_wallet_id).await?;
            let mut owner = wallet_from_model(&owner_row)?;
            let mut counterparty = counterparty_row.as_ref().map(wallet_from_model).transpose()?;

            TransactionProcessor::complete(&mut record, &mut owner, counterparty.as_mut(), now)?;

            save_transaction(&db_txn, model, &record).await?;
            save_wallet(&db_txn, owner_row, &owner).await?;
            if let (Some(row), Some(wallet)) = (counterparty_row, counterparty.as_ref()) {
                save_wallet(&db_txn, row, wallet).await?;
            }
            db_txn.commit().await?;
            Ok::<_, RepositoryError>(record)
        })
        .await;

        match &result {
            Ok(record) => info!(
                transaction_id = %id,
                wallet_id = %record.wallet_id,
                amount = %record.amount,
                "transaction completed"
            ),
            Err(err) => warn!(transaction_id = %id, error = %err, "transaction not completed"),
        }
        result
    }

    /// Completed → Refunded. Reverses the effect and stores a refund
    /// transaction pointing at the original, which is returned.
    ///
    /// # Errors
    ///
    /// See [`TransactionProcessor::refund`].
    pub async fn refund(
        &self,
        id: TransactionId,
        now: DateTime<Utc>,
    ) -> Result<Transaction, RepositoryError> {
        let policy = self.refund_fee_policy;
        let refund = with_retry(self.retry, "transaction.refund", || async move {
            let db_txn = self.db.begin().await?;
            let model = lock_transaction(&db_txn, id).await?;
            let mut original = transaction_from_model(&model)?;

            let (owner_row, counterparty_row) =
                lock_pair(&db_txn, original.wallet_id, original.counterparty_wallet_id).await?;
            let mut owner = wallet_from_model(&owner_row)?;
            let mut counterparty = counterparty_row.as_ref().map(wallet_from_model).transpose()?;

            let record = TransactionProcessor::refund(
                &mut original,
                &mut owner,
                counterparty.as_mut(),
                policy,
                now,
            )?;

            save_transaction(&db_txn, model, &original).await?;
            save_wallet(&db_txn, owner_row, &owner).await?;
            if let (Some(row), Some(wallet)) = (counterparty_row, counterparty.as_ref()) {
                save_wallet(&db_txn, row, wallet).await?;
            }

            let refund = record.into_transaction(
                TransactionId::new(0),
                new_reference(ReferenceKind::Transaction),
            );
            let inserted = new_transaction_row(&refund)?.insert(&db_txn).await?;
            db_txn.commit().await?;
            Ok::<_, RepositoryError>(inserted)
        })
        .await?;

        info!(
            transaction_id = %id,
            refund_id = refund.id,
            amount = %refund.amount,
            "transaction refunded"
        );
        transaction_from_model(&refund)
    }

    /// Runs `op` on the locked transaction row, without touching wallets.
    async fn mutate<T>(
        &self,
        id: TransactionId,
        operation: &'static str,
        op: impl Fn(&mut Transaction) -> Result<T, LedgerError>,
    ) -> Result<(Transaction, T), RepositoryError> {
        let op = &op;
        with_retry(self.retry, operation, || async move {
            let db_txn = self.db.begin().await?;
            let model = lock_transaction(&db_txn, id).await?;
            let mut record = transaction_from_model(&model)?;
            let out = op(&mut record)?;
            save_transaction(&db_txn, model, &record).await?;
            db_txn.commit().await?;
            Ok::<_, RepositoryError>((record, out))
        })
        .await
    }
}

fn not_found(id: TransactionId) -> RepositoryError {
    RepositoryError::NotFound {
        entity: "transaction",
        id: id.get(),
    }
}

async fn ensure_wallet_exists<C: ConnectionTrait>(
    conn: &C,
    id: WalletId,
) -> Result<(), RepositoryError> {
    wallets::Entity::find_by_id(id.get())
        .one(conn)
        .await?
        .map(|_| ())
        .ok_or(RepositoryError::NotFound {
            entity: "wallet",
            id: id.get(),
        })
}

async fn lock_transaction<C: ConnectionTrait>(
    conn: &C,
    id: TransactionId,
) -> Result<transactions::Model, RepositoryError> {
    transactions::Entity::find_by_id(id.get())
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or(not_found(id))
}

async fn save_transaction<C: ConnectionTrait>(
    conn: &C,
    model: transactions::Model,
    record: &Transaction,
) -> Result<(), RepositoryError> {
    let mut active: transactions::ActiveModel = model.into();
    apply_transaction(&mut active, record)?;
    active.update(conn).await?;
    Ok(())
}
