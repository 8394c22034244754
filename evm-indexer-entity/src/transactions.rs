use sea_orm::entity::prelude::*;

use super::sea_orm_active_enums::{TransactionStatus, TransactionType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(
    table_name = "transactions",
    indexes = [
        (name = "idx_transactions_block_hash_index", columns = ["block_hash", "transaction_index"], unique)
    ]
)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub hash: String,
    pub block_hash: String,
    pub block_number: i64,
    pub transaction_index: i32,
    pub from_address: String,
    pub to_address: Option<String>,
    pub value: String,
    pub gas_limit: i64,
    pub gas_used: Option<i64>,
    pub gas_price: Option<String>,
    pub max_fee_per_gas: Option<String>,
    pub max_priority_fee_per_gas: Option<String>,
    pub nonce: i64,
    pub input: String,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub contract_address: Option<String>,
    pub logs_bloom: Option<String>,
    pub method_type: Option<String>,
    pub method_name: Option<String>,
    pub mined_at: Option<DateTimeUtc>,
    pub removed: bool,
    pub inserted_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::blocks::Entity",
        from = "Column::BlockHash",
        to = "super::blocks::Column::Hash"
    )]
    Block,
}

impl Related<super::blocks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Block.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
