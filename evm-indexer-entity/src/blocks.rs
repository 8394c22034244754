use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "blocks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub hash: String,
    #[sea_orm(unique)]
    pub number: i64,
    pub parent_hash: String,
    pub timestamp: i64,
    pub proposer: Option<String>,
    pub gas_limit: i64,
    pub gas_used: i64,
    pub base_fee_per_gas: Option<String>,
    pub transaction_count: i32,
    pub size: Option<i64>,
    pub extra_data: Option<String>,
    pub state_root: Option<String>,
    pub receipts_root: Option<String>,
    pub transactions_root: Option<String>,
    pub nonce: Option<String>,
    pub mix_hash: Option<String>,
    pub removed: bool,
    pub inserted_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
    #[sea_orm(has_many = "super::events::Entity")]
    Events,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Events.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
