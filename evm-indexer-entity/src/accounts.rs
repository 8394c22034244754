use sea_orm::entity::prelude::*;

use super::sea_orm_active_enums::AccountType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub address: String,
    pub account_type: AccountType,
    pub balance: Option<String>,
    pub nonce: Option<i64>,
    pub transaction_count: i64,
    pub contract_interactions_count: i64,
    pub first_seen: DateTimeUtc,
    pub last_activity: DateTimeUtc,
    pub is_contract: bool,
    pub contract_type: Option<String>,
    pub factory: Option<String>,
    pub implementation: Option<String>,
    pub owner: Option<String>,
    pub label: Option<String>,
    pub risk_score: Option<f64>,
    pub compliance_status: Option<String>,
    pub inserted_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
