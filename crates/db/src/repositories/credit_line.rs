//! Credit line repository.

use apex_core::credit::{CreditEngine, CreditLine, CreditTerms, Repayment};
use apex_core::{LedgerError, RetryPolicy};
use apex_shared::LedgerConfig;
use apex_shared::types::{CreditLineId, ReferenceKind, UserId, new_reference};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;

use super::error::RepositoryError;
use super::mapping::{apply_credit_line, credit_line_from_model};
use super::retry::with_retry;
use crate::entities::credit_lines;

/// Credit line repository.
#[derive(Debug, Clone)]
pub struct CreditLineRepository {
    db: DatabaseConnection,
    retry: RetryPolicy,
}

impl CreditLineRepository {
    /// Creates a new credit line repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: &LedgerConfig) -> Self {
        Self {
            db,
            retry: RetryPolicy::with_attempts(config.conflict_retry_attempts),
        }
    }

    /// Opens a pending credit line.
    ///
    /// # Errors
    ///
    /// See [`CreditEngine::open`].
    pub async fn open(
        &self,
        user_id: UserId,
        terms: CreditTerms,
    ) -> Result<CreditLine, RepositoryError> {
        let line = CreditEngine::open(CreditLineId::new(0), user_id, terms)?;

        let mut row = credit_lines::ActiveModel {
            credit_line_number: Set(new_reference(ReferenceKind::CreditLine)),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        apply_credit_line(&mut row, &line)?;

        let model = row.insert(&self.db).await?;
        info!(
            credit_line_id = model.id,
            user_id = %user_id,
            limit = %model.approved_limit,
            "credit line opened"
        );
        credit_line_from_model(&model)
    }

    /// Finds a credit line by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if there is no such line.
    pub async fn find(&self, id: CreditLineId) -> Result<CreditLine, RepositoryError> {
        let model = credit_lines::Entity::find_by_id(id.get())
            .one(&self.db)
            .await?
            .ok_or(not_found(id))?;
        credit_line_from_model(&model)
    }

    /// Lists a user's credit lines, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_user(&self, user_id: UserId) -> Result<Vec<CreditLine>, RepositoryError> {
        credit_lines::Entity::find()
            .filter(credit_lines::Column::UserId.eq(user_id.get()))
            .order_by_asc(credit_lines::Column::Id)
            .all(&self.db)
            .await?
            .iter()
            .map(credit_line_from_model)
            .collect()
    }

    /// Pending → Approved.
    ///
    /// # Errors
    ///
    /// See [`CreditEngine::approve`].
    pub async fn approve(
        &self,
        id: CreditLineId,
        now: DateTime<Utc>,
    ) -> Result<CreditLine, RepositoryError> {
        self.mutate(id, "credit_line.approve", move |line| {
            CreditEngine::approve(line, now)
        })
        .await
        .map(|(line, ())| line)
    }

    /// Approved → Active; sets the maturity date.
    ///
    /// # Errors
    ///
    /// See [`CreditEngine::activate`].
    pub async fn activate(
        &self,
        id: CreditLineId,
        now: DateTime<Utc>,
    ) -> Result<CreditLine, RepositoryError> {
        self.mutate(id, "credit_line.activate", move |line| {
            CreditEngine::activate(line, now)
        })
        .await
        .map(|(line, ())| line)
    }

    /// Draws from an active line.
    ///
    /// # Errors
    ///
    /// See [`CreditEngine::draw`].
    pub async fn draw(
        &self,
        id: CreditLineId,
        amount: Decimal,
    ) -> Result<CreditLine, RepositoryError> {
        let result = self
            .mutate(id, "credit_line.draw", move |line| CreditEngine::draw(line, amount))
            .await
            .map(|(line, ())| line);
        if let Ok(line) = &result {
            info!(
                credit_line_id = %id,
                amount = %amount,
                used = %line.used_amount,
                "credit drawn"
            );
        }
        result
    }

    /// Applies a payment, interest first.
    ///
    /// # Errors
    ///
    /// See [`CreditEngine::repay`].
    pub async fn repay(
        &self,
        id: CreditLineId,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Repayment, RepositoryError> {
        let (_, repayment) = self
            .mutate(id, "credit_line.repay", move |line| {
                CreditEngine::repay(line, amount, now)
            })
            .await?;
        info!(
            credit_line_id = %id,
            interest = %repayment.interest,
            principal = %repayment.principal,
            "credit repaid"
        );
        Ok(repayment)
    }

    /// Active → Suspended.
    ///
    /// # Errors
    ///
    /// See [`CreditEngine::suspend`].
    pub async fn suspend(&self, id: CreditLineId) -> Result<CreditLine, RepositoryError> {
        self.mutate(id, "credit_line.suspend", CreditEngine::suspend)
            .await
            .map(|(line, ())| line)
    }

    /// Suspended → Active.
    ///
    /// # Errors
    ///
    /// See [`CreditEngine::reactivate`].
    pub async fn reactivate(&self, id: CreditLineId) -> Result<CreditLine, RepositoryError> {
        self.mutate(id, "credit_line.reactivate", CreditEngine::reactivate)
            .await
            .map(|(line, ())| line)
    }

    /// Closes a fully repaid line.
    ///
    /// # Errors
    ///
    /// See [`CreditEngine::close`].
    pub async fn close(&self, id: CreditLineId) -> Result<CreditLine, RepositoryError> {
        self.mutate(id, "credit_line.close", CreditEngine::close)
            .await
            .map(|(line, ())| line)
    }

    /// Marks the line as defaulted.
    ///
    /// # Errors
    ///
    /// See [`CreditEngine::mark_default`].
    pub async fn mark_default(&self, id: CreditLineId) -> Result<CreditLine, RepositoryError> {
        self.mutate(id, "credit_line.mark_default", CreditEngine::mark_default)
            .await
            .map(|(line, ())| line)
    }

    /// Records how many days the line is past due.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if there is no such line.
    pub async fn record_days_past_due(
        &self,
        id: CreditLineId,
        days: u32,
    ) -> Result<CreditLine, RepositoryError> {
        self.mutate(id, "credit_line.record_days_past_due", move |line| {
            CreditEngine::record_days_past_due(line, days);
            Ok(())
        })
        .await
        .map(|(line, ())| line)
    }

    /// Changes the current limit.
    ///
    /// # Errors
    ///
    /// See [`CreditEngine::adjust_limit`].
    pub async fn adjust_limit(
        &self,
        id: CreditLineId,
        new_limit: Decimal,
    ) -> Result<CreditLine, RepositoryError> {
        self.mutate(id, "credit_line.adjust_limit", move |line| {
            CreditEngine::adjust_limit(line, new_limit)
        })
        .await
        .map(|(line, ())| line)
    }

    async fn mutate<T>(
        &self,
        id: CreditLineId,
        operation: &'static str,
        op: impl Fn(&mut CreditLine) -> Result<T, LedgerError>,
    ) -> Result<(CreditLine, T), RepositoryError> {
        let op = &op;
        with_retry(self.retry, operation, || async move {
            let txn = self.db.begin().await?;
            let model = lock_credit_line(&txn, id).await?;
            let mut line = credit_line_from_model(&model)?;
            let out = op(&mut line)?;

            let mut active: credit_lines::ActiveModel = model.into();
            apply_credit_line(&mut active, &line)?;
            active.update(&txn).await?;
            txn.commit().await?;
            Ok::<_, RepositoryError>((line, out))
        })
        .await
    }
}

fn not_found(id: CreditLineId) -> RepositoryError {
    RepositoryError::NotFound {
        entity: "credit_line",
        id: id.get(),
    }
}

async fn lock_credit_line<C: ConnectionTrait>(
    conn: &C,
    id: CreditLineId,
) -> Result<credit_lines::Model, RepositoryError> {
    credit_lines::Entity::find_by_id(id.get())
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or(not_found(id))
}
