//! `SeaORM` Entity for invoices table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{CfdiStatus, InvoiceStatus, PaymentTerms};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
#[allow(missing_docs)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub invoice_number: String,
    pub folio: Option<String>,
    pub series: Option<String>,
    pub issuer_id: i64,
    pub receiver_id: i64,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
    pub currency: String,
    pub exchange_rate: Decimal,
    pub status: InvoiceStatus,
    pub issue_date: DateTimeWithTimeZone,
    pub due_date: DateTimeWithTimeZone,
    pub paid_date: Option<DateTimeWithTimeZone>,
    pub payment_terms: PaymentTerms,
    /// `PUE` or `PPD`.
    pub sat_payment_method: String,
    pub payment_form: String,
    pub cfdi_uuid: Option<String>,
    /// SAT code such as `G03`.
    pub cfdi_use: String,
    pub cfdi_xml_url: Option<String>,
    pub cfdi_pdf_url: Option<String>,
    pub cfdi_status: CfdiStatus,
    pub cfdi_cancellation_date: Option<DateTimeWithTimeZone>,
    /// Invoice lines as a JSON array.
    pub items: Json,
    pub notes: Option<String>,
    pub factoring_available: bool,
    pub factoring_rate: Option<Decimal>,
    pub factored_amount: Option<Decimal>,
    pub factoring_date: Option<DateTimeWithTimeZone>,
    pub factoring_provider: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
#[allow(missing_docs)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
