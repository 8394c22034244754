use sea_orm::entity::prelude::*;

use super::sea_orm_active_enums::VerificationStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "smart_contracts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub address: String,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub contract_type: Option<String>,
    pub creator_address: Option<String>,
    pub creation_tx_hash: Option<String>,
    pub creation_block: Option<i64>,
    pub verification_status: VerificationStatus,
    pub abi: Option<serde_json::Value>,
    pub bytecode: Option<String>,
    pub total_transactions: i64,
    pub unique_interactors: i64,
    pub total_gas_used: String,
    pub total_value_transferred: String,
    pub total_events: i64,
    pub is_proxy: bool,
    pub implementation_address: Option<String>,
    pub inserted_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
