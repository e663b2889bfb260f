//! Invoice repository.

use apex_core::invoice::{FactoringQuote, Invoice, InvoiceService, NewInvoice, factor};
use apex_core::{LedgerError, RetryPolicy};
use apex_shared::LedgerConfig;
use apex_shared::types::{InvoiceId, PageRequest, PageResponse, ReferenceKind, UserId, new_reference};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::info;

use super::error::RepositoryError;
use super::mapping::{apply_invoice, invoice_from_model};
use super::retry::with_retry;
use crate::entities::invoices;

/// Invoice repository.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    db: DatabaseConnection,
    retry: RetryPolicy,
}

impl InvoiceRepository {
    /// Creates a new invoice repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: &LedgerConfig) -> Self {
        Self {
            db,
            retry: RetryPolicy::with_attempts(config.conflict_retry_attempts),
        }
    }

    /// Stores a draft invoice with totals computed from its items.
    ///
    /// # Errors
    ///
    /// See [`InvoiceService::draft`].
    pub async fn create(&self, new: NewInvoice) -> Result<Invoice, RepositoryError> {
        let draft = InvoiceService::draft(
            InvoiceId::new(0),
            new_reference(ReferenceKind::Invoice),
            new,
        )?;

        let mut row = invoices::ActiveModel {
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        apply_invoice(&mut row, &draft)?;

        let model = row.insert(&self.db).await?;
        info!(
            invoice_id = model.id,
            invoice_number = %model.invoice_number,
            total = %model.total,
            "invoice drafted"
        );
        invoice_from_model(&model)
    }

    /// Finds an invoice by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if there is no such invoice.
    pub async fn find(&self, id: InvoiceId) -> Result<Invoice, RepositoryError> {
        let model = invoices::Entity::find_by_id(id.get())
            .one(&self.db)
            .await?
            .ok_or(not_found(id))?;
        invoice_from_model(&model)
    }

    /// Lists invoices issued by a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_by_issuer(
        &self,
        issuer_id: UserId,
        page: PageRequest,
    ) -> Result<PageResponse<Invoice>, RepositoryError> {
        let query =
            invoices::Entity::find().filter(invoices::Column::IssuerId.eq(issuer_id.get()));

        let total = query.clone().count(&self.db).await?;
        let data = query
            .order_by_desc(invoices::Column::IssueDate)
            .order_by_desc(invoices::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?
            .iter()
            .map(invoice_from_model)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    /// Draft → Sent.
    ///
    /// # Errors
    ///
    /// See [`InvoiceService::send`].
    pub async fn send(&self, id: InvoiceId) -> Result<Invoice, RepositoryError> {
        self.mutate(id, "invoice.send", InvoiceService::send)
            .await
            .map(|(invoice, ())| invoice)
    }

    /// Sent or Overdue → Paid.
    ///
    /// # Errors
    ///
    /// See [`InvoiceService::mark_paid`].
    pub async fn mark_paid(
        &self,
        id: InvoiceId,
        now: DateTime<Utc>,
    ) -> Result<Invoice, RepositoryError> {
        self.mutate(id, "invoice.mark_paid", move |invoice| {
            InvoiceService::mark_paid(invoice, now)
        })
        .await
        .map(|(invoice, ())| invoice)
    }

    /// Sent → Overdue once the due date has passed.
    ///
    /// # Errors
    ///
    /// See [`InvoiceService::mark_overdue`].
    pub async fn mark_overdue(
        &self,
        id: InvoiceId,
        now: DateTime<Utc>,
    ) -> Result<Invoice, RepositoryError> {
        self.mutate(id, "invoice.mark_overdue", move |invoice| {
            InvoiceService::mark_overdue(invoice, now)
        })
        .await
        .map(|(invoice, ())| invoice)
    }

    /// Cancels an unfactored invoice.
    ///
    /// # Errors
    ///
    /// See [`InvoiceService::cancel`].
    pub async fn cancel(&self, id: InvoiceId) -> Result<Invoice, RepositoryError> {
        self.mutate(id, "invoice.cancel", InvoiceService::cancel)
            .await
            .map(|(invoice, ())| invoice)
    }

    /// Paid → Refunded.
    ///
    /// # Errors
    ///
    /// See [`InvoiceService::refund`].
    pub async fn refund(&self, id: InvoiceId) -> Result<Invoice, RepositoryError> {
        self.mutate(id, "invoice.refund", InvoiceService::refund)
            .await
            .map(|(invoice, ())| invoice)
    }

    /// Records the stamped tax document.
    ///
    /// # Errors
    ///
    /// See [`InvoiceService::attach_cfdi`].
    pub async fn attach_cfdi(
        &self,
        id: InvoiceId,
        cfdi_uuid: &str,
        xml_url: Option<String>,
        pdf_url: Option<String>,
    ) -> Result<Invoice, RepositoryError> {
        self.mutate(id, "invoice.attach_cfdi", move |invoice| {
            InvoiceService::attach_cfdi(invoice, cfdi_uuid, xml_url.clone(), pdf_url.clone())
        })
        .await
        .map(|(invoice, ())| invoice)
    }

    /// Cancels the tax document.
    ///
    /// # Errors
    ///
    /// See [`InvoiceService::cancel_cfdi`].
    pub async fn cancel_cfdi(
        &self,
        id: InvoiceId,
        now: DateTime<Utc>,
    ) -> Result<Invoice, RepositoryError> {
        self.mutate(id, "invoice.cancel_cfdi", move |invoice| {
            InvoiceService::cancel_cfdi(invoice, now)
        })
        .await
        .map(|(invoice, ())| invoice)
    }

    /// Factors a sent invoice.
    ///
    /// # Errors
    ///
    /// See [`factor`].
    pub async fn factor(
        &self,
        id: InvoiceId,
        provider: &str,
        now: DateTime<Utc>,
    ) -> Result<FactoringQuote, RepositoryError> {
        let (_, quote) = self
            .mutate(id, "invoice.factor", move |invoice| factor(invoice, provider, now))
            .await?;
        info!(
            invoice_id = %id,
            rate = %quote.rate,
            factored_amount = %quote.factored_amount,
            "invoice factored"
        );
        Ok(quote)
    }

    async fn mutate<T>(
        &self,
        id: InvoiceId,
        operation: &'static str,
        op: impl Fn(&mut Invoice) -> Result<T, LedgerError>,
    ) -> Result<(Invoice, T), RepositoryError> {
        let op = &op;
        with_retry(self.retry, operation, || async move {
            let txn = self.db.begin().await?;
            let model = lock_invoice(&txn, id).await?;
            let mut invoice = invoice_from_model(&model)?;
            let out = op(&mut invoice)?;

            let mut active: invoices::ActiveModel = model.into();
            apply_invoice(&mut active, &invoice)?;
            active.update(&txn).await?;
            txn.commit().await?;
            Ok::<_, RepositoryError>((invoice, out))
        })
        .await
    }
}

fn not_found(id: InvoiceId) -> RepositoryError {
    RepositoryError::NotFound {
        entity: "invoice",
        id: id.get(),
    }
}

async fn lock_invoice<C: ConnectionTrait>(
    conn: &C,
    id: InvoiceId,
) -> Result<invoices::Model, RepositoryError> {
    invoices::Entity::find_by_id(id.get())
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or(not_found(id))
}
