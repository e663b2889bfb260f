//! Wallet repository.
//!
//! Every mutation is one unit of work: `SELECT … FOR UPDATE` the row, run the
//! ledger operation on the snapshot, write it back, commit.

use apex_core::ledger::{FundingSplit, Wallet, WalletLedger};
use apex_core::{LedgerError, RetryPolicy};
use apex_shared::LedgerConfig;
use apex_shared::types::{Currency, ReferenceKind, UserId, WalletId, new_reference};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;

use super::error::RepositoryError;
use super::mapping::{apply_wallet, wallet_from_model};
use super::retry::with_retry;
use crate::entities::wallets;

/// Wallet repository.
#[derive(Debug, Clone)]
pub struct WalletRepository {
    db: DatabaseConnection,
    retry: RetryPolicy,
}

impl WalletRepository {
    /// Creates a new wallet repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: &LedgerConfig) -> Self {
        Self {
            db,
            retry: RetryPolicy::with_attempts(config.conflict_retry_attempts),
        }
    }

    /// Opens an active wallet with zero balances and the default limits.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn open(
        &self,
        user_id: UserId,
        currency: Currency,
        description: Option<String>,
    ) -> Result<Wallet, RepositoryError> {
        let now = Utc::now();
        let template = Wallet::new(WalletId::new(0), user_id, currency, now.date_naive());

        let mut row = wallets::ActiveModel {
            wallet_number: Set(new_reference(ReferenceKind::Wallet)),
            user_id: Set(user_id.get()),
            currency: Set(currency.to_string()),
            description: Set(description),
            created_at: Set(now.into()),
            ..Default::default()
        };
        apply_wallet(&mut row, &template);

        let model = row.insert(&self.db).await?;
        info!(wallet_id = model.id, user_id = %user_id, "wallet opened");
        wallet_from_model(&model)
    }

    /// Finds a wallet by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if there is no such wallet.
    pub async fn find(&self, id: WalletId) -> Result<Wallet, RepositoryError> {
        let model = wallets::Entity::find_by_id(id.get())
            .one(&self.db)
            .await?
            .ok_or(RepositoryError::NotFound {
                entity: "wallet",
                id: id.get(),
            })?;
        wallet_from_model(&model)
    }

    /// Lists a user's wallets, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_user(&self, user_id: UserId) -> Result<Vec<Wallet>, RepositoryError> {
        wallets::Entity::find()
            .filter(wallets::Column::UserId.eq(user_id.get()))
            .order_by_asc(wallets::Column::Id)
            .all(&self.db)
            .await?
            .iter()
            .map(wallet_from_model)
            .collect()
    }

    /// Credits the wallet.
    ///
    /// # Errors
    ///
    /// See [`WalletLedger::credit`].
    pub async fn credit(&self, id: WalletId, amount: Decimal) -> Result<Wallet, RepositoryError> {
        self.mutate(id, "wallet.credit", move |wallet, _| {
            WalletLedger::credit(wallet, amount)
        })
        .await
        .map(|(wallet, ())| wallet)
    }

    /// Debits the wallet, balance first, then credit.
    ///
    /// # Errors
    ///
    /// See [`WalletLedger::debit`].
    pub async fn debit(
        &self,
        id: WalletId,
        amount: Decimal,
    ) -> Result<FundingSplit, RepositoryError> {
        self.mutate(id, "wallet.debit", move |wallet, _| {
            WalletLedger::debit(wallet, amount)
        })
        .await
        .map(|(_, split)| split)
    }

    /// Withdraws from the balance, checking the withdrawal window.
    ///
    /// # Errors
    ///
    /// See [`WalletLedger::withdraw`].
    pub async fn withdraw(
        &self,
        id: WalletId,
        amount: Decimal,
    ) -> Result<FundingSplit, RepositoryError> {
        self.mutate(id, "wallet.withdraw", move |wallet, today| {
            WalletLedger::withdraw(wallet, amount, today)
        })
        .await
        .map(|(_, split)| split)
    }

    /// Moves funds from available to frozen.
    ///
    /// # Errors
    ///
    /// See [`WalletLedger::freeze`].
    pub async fn freeze(&self, id: WalletId, amount: Decimal) -> Result<Wallet, RepositoryError> {
        self.mutate(id, "wallet.freeze", move |wallet, _| {
            WalletLedger::freeze(wallet, amount)
        })
        .await
        .map(|(wallet, ())| wallet)
    }

    /// Moves funds from frozen back to available.
    ///
    /// # Errors
    ///
    /// See [`WalletLedger::unfreeze`].
    pub async fn unfreeze(
        &self,
        id: WalletId,
        amount: Decimal,
    ) -> Result<Wallet, RepositoryError> {
        self.mutate(id, "wallet.unfreeze", move |wallet, _| {
            WalletLedger::unfreeze(wallet, amount)
        })
        .await
        .map(|(wallet, ())| wallet)
    }

    /// Sets the overdraft credit limit.
    ///
    /// # Errors
    ///
    /// See [`WalletLedger::set_credit_limit`].
    pub async fn set_credit_limit(
        &self,
        id: WalletId,
        limit: Decimal,
    ) -> Result<Wallet, RepositoryError> {
        self.mutate(id, "wallet.set_credit_limit", move |wallet, _| {
            WalletLedger::set_credit_limit(wallet, limit)
        })
        .await
        .map(|(wallet, ())| wallet)
    }

    /// Adds to the cashback balance and the lifetime total.
    ///
    /// # Errors
    ///
    /// See [`WalletLedger::earn_cashback`].
    pub async fn earn_cashback(
        &self,
        id: WalletId,
        amount: Decimal,
    ) -> Result<Wallet, RepositoryError> {
        self.mutate(id, "wallet.earn_cashback", move |wallet, _| {
            WalletLedger::earn_cashback(wallet, amount)
        })
        .await
        .map(|(wallet, ())| wallet)
    }

    /// Moves cashback into the spendable balance.
    ///
    /// # Errors
    ///
    /// See [`WalletLedger::redeem_cashback`].
    pub async fn redeem_cashback(
        &self,
        id: WalletId,
        amount: Decimal,
    ) -> Result<Wallet, RepositoryError> {
        self.mutate(id, "wallet.redeem_cashback", move |wallet, _| {
            WalletLedger::redeem_cashback(wallet, amount)
        })
        .await
        .map(|(wallet, ())| wallet)
    }

    /// Suspends an active wallet.
    ///
    /// # Errors
    ///
    /// See [`WalletLedger::suspend`].
    pub async fn suspend(&self, id: WalletId) -> Result<Wallet, RepositoryError> {
        let (wallet, ()) = self
            .mutate(id, "wallet.suspend", |wallet, _| WalletLedger::suspend(wallet))
            .await?;
        info!(wallet_id = %id, "wallet suspended");
        Ok(wallet)
    }

    /// Reactivates a suspended wallet.
    ///
    /// # Errors
    ///
    /// See [`WalletLedger::reactivate`].
    pub async fn reactivate(&self, id: WalletId) -> Result<Wallet, RepositoryError> {
        let (wallet, ()) = self
            .mutate(id, "wallet.reactivate", |wallet, _| {
                WalletLedger::reactivate(wallet)
            })
            .await?;
        info!(wallet_id = %id, "wallet reactivated");
        Ok(wallet)
    }

    /// Soft-closes an empty wallet. The row is kept with `status = closed`.
    ///
    /// # Errors
    ///
    /// See [`WalletLedger::close`].
    pub async fn close(&self, id: WalletId) -> Result<Wallet, RepositoryError> {
        let (wallet, ()) = self
            .mutate(id, "wallet.close", |wallet, _| WalletLedger::close(wallet))
            .await?;
        info!(wallet_id = %id, "wallet closed");
        Ok(wallet)
    }

    /// Runs `op` on the locked wallet inside one database transaction,
    /// retrying the whole unit on conflict.
    async fn mutate<T>(
        &self,
        id: WalletId,
        operation: &'static str,
        op: impl Fn(&mut Wallet, NaiveDate) -> Result<T, LedgerError>,
    ) -> Result<(Wallet, T), RepositoryError> {
        let op = &op;
        with_retry(self.retry, operation, || async move {
            let txn = self.db.begin().await?;
            let model = lock_wallet(&txn, id).await?;
            let mut wallet = wallet_from_model(&model)?;
            let out = op(&mut wallet, Utc::now().date_naive())?;

            save_wallet(&txn, model, &wallet).await?;
            txn.commit().await?;
            Ok::<_, RepositoryError>((wallet, out))
        })
        .await
    }
}

/// Locks the owner and, if given, the counterparty in ascending id order.
/// Returns them owner first.
pub(crate) async fn lock_pair<C: ConnectionTrait>(
    conn: &C,
    owner: WalletId,
    counterparty: Option<WalletId>,
) -> Result<(wallets::Model, Option<wallets::Model>), RepositoryError> {
    match counterparty {
        None => Ok((lock_wallet(conn, owner).await?, None)),
        Some(other) if other < owner => {
            let other = lock_wallet(conn, other).await?;
            let owner = lock_wallet(conn, owner).await?;
            Ok((owner, Some(other)))
        }
        Some(other) => {
            let owner = lock_wallet(conn, owner).await?;
            let other = lock_wallet(conn, other).await?;
            Ok((owner, Some(other)))
        }
    }
}

/// Writes the snapshot back over the locked row.
pub(crate) async fn save_wallet<C: ConnectionTrait>(
    conn: &C,
    model: wallets::Model,
    wallet: &Wallet,
) -> Result<(), RepositoryError> {
    let mut active: wallets::ActiveModel = model.into();
    apply_wallet(&mut active, wallet);
    active.update(conn).await?;
    Ok(())
}

/// `SELECT … FOR UPDATE` on one wallet row.
pub(crate) async fn lock_wallet<C: ConnectionTrait>(
    conn: &C,
    id: WalletId,
) -> Result<wallets::Model, RepositoryError> {
    wallets::Entity::find_by_id(id.get())
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or(RepositoryError::NotFound {
            entity: "wallet",
            id: id.get(),
        })
}
