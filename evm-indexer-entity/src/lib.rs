pub mod accounts;
pub mod blocks;
pub mod events;
pub mod indexer_checkpoints;
pub mod manual;
pub mod processed_transaction_hashes;
pub mod sea_orm_active_enums;
pub mod smart_contracts;
pub mod transactions;
pub mod validators;

pub mod prelude {
    pub use super::accounts::Entity as Accounts;
    pub use super::blocks::Entity as Blocks;
    pub use super::events::Entity as Events;
    pub use super::indexer_checkpoints::Entity as IndexerCheckpoints;
    pub use super::processed_transaction_hashes::Entity as ProcessedTransactionHashes;
    pub use super::smart_contracts::Entity as SmartContracts;
    pub use super::transactions::Entity as Transactions;
    pub use super::validators::Entity as Validators;
}
