use sea_orm::entity::prelude::*;

/// Marker row recorded in the same transaction as an account/contract-metric
/// accumulation, so a replayed delivery can be detected and skipped before
/// the delta is applied a second time.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "processed_transaction_hashes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub tx_hash: String,
    pub processed_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
