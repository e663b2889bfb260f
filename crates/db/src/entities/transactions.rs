//! `SeaORM` Entity for transactions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{PaymentMethod, TransactionStatus, TransactionType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
#[allow(missing_docs)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-facing reference (`TXN-…`).
    #[sea_orm(unique)]
    pub transaction_id: String,
    pub user_id: i64,
    pub wallet_id: i64,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub amount: Decimal,
    pub fee: Decimal,
    pub net_amount: Decimal,
    pub currency: String,
    pub exchange_rate: Decimal,
    pub payment_method: PaymentMethod,
    /// Reference supplied by the payment network.
    pub reference: Option<String>,
    pub external_id: Option<String>,
    pub counterparty_user_id: Option<i64>,
    pub counterparty_wallet_id: Option<i64>,
    pub credit_line_id: Option<i64>,
    pub invoice_id: Option<i64>,
    pub refund_of: Option<i64>,
    pub description: Option<String>,
    pub balance_portion: Decimal,
    pub credit_portion: Decimal,
    pub processed_at: Option<DateTimeWithTimeZone>,
    pub failure_reason: Option<String>,
    pub retry_count: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
#[allow(missing_docs)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::wallets::Entity",
        from = "Column::WalletId",
        to = "super::wallets::Column::Id"
    )]
    Wallets,
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
