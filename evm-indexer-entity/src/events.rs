use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(
    table_name = "events",
    indexes = [
        (name = "idx_events_block_hash_log_index", columns = ["block_hash", "log_index"], unique)
    ]
)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub contract_address: String,
    pub tx_hash: String,
    pub block_number: i64,
    pub block_hash: String,
    pub log_index: i32,
    pub transaction_index: i32,
    pub topics: Vec<String>,
    pub data: String,
    pub decoded_data: Option<serde_json::Value>,
    pub event_name: Option<String>,
    pub event_signature: Option<String>,
    pub removed: bool,
    pub timestamp: Option<DateTimeUtc>,
    pub inserted_at: DateTimeUtc,
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
