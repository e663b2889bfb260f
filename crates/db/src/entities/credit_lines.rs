//! `SeaORM` Entity for credit_lines table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{CreditLineStatus, CreditType, PaymentFrequency};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "credit_lines")]
#[allow(missing_docs)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub credit_line_number: String,
    pub user_id: i64,
    pub credit_type: CreditType,
    pub provider: String,
    pub approved_limit: Decimal,
    pub current_limit: Decimal,
    pub used_amount: Decimal,
    pub available_amount: Decimal,
    /// Annual rate in percent.
    pub interest_rate: Decimal,
    pub term_months: i32,
    pub payment_frequency: PaymentFrequency,
    pub status: CreditLineStatus,
    pub approval_date: Option<DateTimeWithTimeZone>,
    pub activation_date: Option<DateTimeWithTimeZone>,
    pub maturity_date: Option<DateTimeWithTimeZone>,
    pub minimum_payment: Decimal,
    pub next_payment_amount: Decimal,
    pub next_payment_date: Option<DateTimeWithTimeZone>,
    pub last_payment_date: Option<DateTimeWithTimeZone>,
    pub total_payments_made: i32,
    pub total_amount_paid: Decimal,
    pub total_interest_paid: Decimal,
    pub days_past_due: i32,
    pub late_payment_count: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
#[allow(missing_docs)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
