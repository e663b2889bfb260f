//! `SeaORM` Entity for wallets table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::WalletStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "wallets")]
#[allow(missing_docs)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub wallet_number: String,
    pub user_id: i64,
    pub currency: String,
    pub balance: Decimal,
    pub available_balance: Decimal,
    pub frozen_balance: Decimal,
    pub credit_limit: Decimal,
    pub used_credit: Decimal,
    pub available_credit: Decimal,
    pub cashback_balance: Decimal,
    pub total_cashback_earned: Decimal,
    pub daily_limit: Decimal,
    pub monthly_limit: Decimal,
    pub withdrawal_limit: Decimal,
    pub window_day: Date,
    pub spent_today: Decimal,
    pub spent_this_month: Decimal,
    pub withdrawn_today: Decimal,
    pub status: WalletStatus,
    pub description: Option<String>,
    pub last_transaction_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
#[allow(missing_docs)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
