//! Idempotent persistence. Every upsert here is safe to apply any number of
//! times with the same input; replays beyond the first leave the row
//! unchanged except for `updated_at`.

mod batch;
mod deltas;

pub use batch::BatchBuffer;
pub use deltas::{AccountDeltas, ContractMetricDeltas};

use chrono::{TimeZone, Utc};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, TransactionTrait,
    sea_query::OnConflict,
};

use evm_indexer_entity::sea_orm_active_enums::{AccountType, TransactionStatus, TransactionType};
use evm_indexer_entity::{
    accounts, blocks, events, processed_transaction_hashes, smart_contracts, transactions,
    validators,
};

use crate::error::StoreError;
use crate::node::{NodeBlock, NodeLog, NodeReceipt, NodeTransaction};

#[derive(Clone)]
pub struct Store {
    db: DatabaseConnection,
}

impl Store {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn block_exists(&self, hash: &str) -> Result<bool, StoreError> {
        Ok(blocks::Entity::find_by_id(hash.to_owned())
            .one(&self.db)
            .await?
            .is_some())
    }

    pub async fn latest_block(&self) -> Result<Option<blocks::Model>, StoreError> {
        use sea_orm::QueryOrder;
        Ok(blocks::Entity::find()
            .order_by_desc(blocks::Column::Number)
            .one(&self.db)
            .await?)
    }

    pub async fn block_upsert(&self, block: &NodeBlock) -> Result<(), StoreError> {
        let model = blocks::ActiveModel {
            hash: Set(block.hash.clone()),
            number: Set(block.number as i64),
            parent_hash: Set(block.parent_hash.clone()),
            timestamp: Set(block.timestamp),
            proposer: Set(block.proposer.clone()),
            gas_limit: Set(block.gas_limit as i64),
            gas_used: Set(block.gas_used as i64),
            base_fee_per_gas: Set(block.base_fee_per_gas.clone()),
            transaction_count: Set(block.transaction_hashes.len() as i32),
            size: Set(block.size.map(|s| s as i64)),
            extra_data: Set(block.extra_data.clone()),
            state_root: Set(block.state_root.clone()),
            receipts_root: Set(block.receipts_root.clone()),
            transactions_root: Set(block.transactions_root.clone()),
            nonce: Set(block.nonce.clone()),
            mix_hash: Set(block.mix_hash.clone()),
            removed: Set(false),
            inserted_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
        };

        blocks::Entity::insert(model)
            .on_conflict(
                OnConflict::column(blocks::Column::Hash)
                    .update_columns([
                        blocks::Column::Proposer,
                        blocks::Column::GasUsed,
                        blocks::Column::TransactionCount,
                        blocks::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;
        Ok(())
    }

    pub async fn tx_exists(&self, hash: &str) -> Result<bool, StoreError> {
        Ok(transactions::Entity::find_by_id(hash.to_owned())
            .one(&self.db)
            .await?
            .is_some())
    }

    pub async fn txs_by_block(&self, block_hash: &str) -> Result<Vec<transactions::Model>, StoreError> {
        Ok(transactions::Entity::find()
            .filter(transactions::Column::BlockHash.eq(block_hash))
            .all(&self.db)
            .await?)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn tx_upsert(
        &self,
        tx: &NodeTransaction,
        receipt: Option<&NodeReceipt>,
        mined_at: Option<i64>,
        method_type: Option<String>,
        method_name: Option<String>,
    ) -> Result<(), StoreError> {
        let status = match receipt {
            Some(r) if r.status => TransactionStatus::Success,
            Some(_) => TransactionStatus::Failed,
            None => TransactionStatus::Pending,
        };

        let model = transactions::ActiveModel {
            hash: Set(tx.hash.clone()),
            block_hash: Set(tx.block_hash.clone().unwrap_or_default()),
            block_number: Set(tx.block_number.unwrap_or_default() as i64),
            transaction_index: Set(tx.transaction_index.unwrap_or_default() as i32),
            from_address: Set(tx.from.clone()),
            to_address: Set(tx.to.clone()),
            value: Set(tx.value.clone()),
            gas_limit: Set(tx.gas_limit as i64),
            gas_used: Set(receipt.map(|r| r.gas_used as i64)),
            gas_price: Set(tx.gas_price.clone()),
            max_fee_per_gas: Set(tx.max_fee_per_gas.clone()),
            max_priority_fee_per_gas: Set(tx.max_priority_fee_per_gas.clone()),
            nonce: Set(tx.nonce as i64),
            input: Set(tx.input.clone()),
            transaction_type: Set(match tx.transaction_type {
                crate::node::NodeTransactionType::Legacy => TransactionType::Legacy,
                crate::node::NodeTransactionType::AccessList => TransactionType::AccessList,
                crate::node::NodeTransactionType::DynamicFee => TransactionType::DynamicFee,
            }),
            status: Set(status),
            contract_address: Set(receipt.and_then(|r| r.contract_address.clone())),
            logs_bloom: Set(receipt.map(|r| r.logs_bloom.clone())),
            method_type: Set(method_type),
            method_name: Set(method_name),
            mined_at: Set(mined_at.and_then(|ts| Utc.timestamp_opt(ts, 0).single())),
            removed: Set(false),
            inserted_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
        };

        transactions::Entity::insert(model)
            .on_conflict(
                OnConflict::column(transactions::Column::Hash)
                    .update_columns([
                        transactions::Column::Status,
                        transactions::Column::GasUsed,
                        transactions::Column::ContractAddress,
                        transactions::Column::MethodType,
                        transactions::Column::MethodName,
                        transactions::Column::MinedAt,
                        transactions::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;
        Ok(())
    }

    pub async fn event_exists(&self, id: &str) -> Result<bool, StoreError> {
        Ok(events::Entity::find_by_id(id.to_owned())
            .one(&self.db)
            .await?
            .is_some())
    }

    pub async fn event_upsert(&self, log: &NodeLog, decoded: DecodedEvent) -> Result<(), StoreError> {
        let id = event_id(&log.block_hash, log.log_index);
        let model = events::ActiveModel {
            id: Set(id),
            contract_address: Set(log.address.clone()),
            tx_hash: Set(log.transaction_hash.clone()),
            block_number: Set(log.block_number as i64),
            block_hash: Set(log.block_hash.clone()),
            log_index: Set(log.log_index as i32),
            transaction_index: Set(log.transaction_index as i32),
            topics: Set(log.topics.clone()),
            data: Set(log.data.clone()),
            decoded_data: Set(decoded.decoded_data),
            event_name: Set(decoded.event_name),
            event_signature: Set(decoded.event_signature),
            removed: Set(log.removed),
            timestamp: Set(decoded.timestamp.and_then(|ts| Utc.timestamp_opt(ts, 0).single())),
            inserted_at: Set(Utc::now()),
        };

        events::Entity::insert(model)
            .on_conflict(
                OnConflict::column(events::Column::Id)
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(&self.db)
            .await
            .ok();
        Ok(())
    }

    pub async fn contract_name_by_address(
        &self,
        address: &str,
    ) -> Result<Option<String>, StoreError> {
        Ok(smart_contracts::Entity::find_by_id(address.to_owned())
            .one(&self.db)
            .await?
            .and_then(|m| m.name))
    }

    /// Upserts the account row, then — exactly once per `tx_hash` — applies
    /// `deltas` inside the same transaction as a marker insert into
    /// `processed_transaction_hashes`. A replayed `tx_hash` short-circuits
    /// before the delta is applied a second time.
    pub async fn account_upsert_and_increment(
        &self,
        address: &str,
        account_type: AccountType,
        is_contract: bool,
        tx_hash: &str,
        deltas: AccountDeltas,
    ) -> Result<(), StoreError> {
        let txn = self.db.begin().await?;

        let marker = processed_transaction_hashes::ActiveModel {
            tx_hash: Set(format!("account:{address}:{tx_hash}")),
            processed_at: Set(Utc::now()),
        };
        let insert_result = processed_transaction_hashes::Entity::insert(marker)
            .on_conflict(
                OnConflict::column(processed_transaction_hashes::Column::TxHash)
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(&txn)
            .await;

        let already_processed = matches!(
            insert_result,
            Err(sea_orm::DbErr::RecordNotInserted) | Ok(sea_orm::TryInsertResult::Conflicted)
        );

        if already_processed {
            txn.rollback().await?;
            return Ok(());
        }

        let existing = accounts::Entity::find_by_id(address.to_owned())
            .one(&txn)
            .await?;

        let now = Utc::now();
        let model = match existing {
            Some(row) => accounts::ActiveModel {
                address: Set(row.address),
                account_type: Set(account_type),
                balance: Set(row.balance),
                nonce: Set(row.nonce),
                transaction_count: Set(row.transaction_count + deltas.transaction_count),
                contract_interactions_count: Set(
                    row.contract_interactions_count + deltas.contract_interactions_count,
                ),
                first_seen: Set(row.first_seen),
                last_activity: Set(now),
                is_contract: Set(is_contract || row.is_contract),
                contract_type: Set(row.contract_type),
                factory: Set(row.factory),
                implementation: Set(row.implementation),
                owner: Set(row.owner),
                label: Set(row.label),
                risk_score: Set(row.risk_score),
                compliance_status: Set(row.compliance_status),
                inserted_at: Set(row.inserted_at),
                updated_at: Set(now),
            },
            None => accounts::ActiveModel {
                address: Set(address.to_owned()),
                account_type: Set(account_type),
                balance: Set(None),
                nonce: Set(None),
                transaction_count: Set(deltas.transaction_count),
                contract_interactions_count: Set(deltas.contract_interactions_count),
                first_seen: Set(now),
                last_activity: Set(now),
                is_contract: Set(is_contract),
                contract_type: Set(None),
                factory: Set(None),
                implementation: Set(None),
                owner: Set(None),
                label: Set(None),
                risk_score: Set(None),
                compliance_status: Set(None),
                inserted_at: Set(now),
                updated_at: Set(now),
            },
        };

        accounts::Entity::insert(model)
            .on_conflict(
                OnConflict::column(accounts::Column::Address)
                    .update_columns([
                        accounts::Column::TransactionCount,
                        accounts::Column::ContractInteractionsCount,
                        accounts::Column::LastActivity,
                        accounts::Column::IsContract,
                        accounts::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(())
    }

    pub async fn contract_metrics_update(
        &self,
        address: &str,
        creator_address: Option<&str>,
        creation_tx_hash: Option<&str>,
        creation_block: Option<u64>,
        tx_hash: &str,
        interactor: Option<&str>,
        deltas: ContractMetricDeltas,
    ) -> Result<(), StoreError> {
        let txn = self.db.begin().await?;

        let marker = processed_transaction_hashes::ActiveModel {
            tx_hash: Set(format!("contract:{address}:{tx_hash}")),
            processed_at: Set(Utc::now()),
        };
        let insert_result = processed_transaction_hashes::Entity::insert(marker)
            .on_conflict(
                OnConflict::column(processed_transaction_hashes::Column::TxHash)
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(&txn)
            .await;

        let already_processed = matches!(
            insert_result,
            Err(sea_orm::DbErr::RecordNotInserted) | Ok(sea_orm::TryInsertResult::Conflicted)
        );
        if already_processed {
            txn.rollback().await?;
            return Ok(());
        }

        // unique_interactors counts distinct senders, not interactions: a
        // second marker keyed on (contract, sender) rather than (contract,
        // tx_hash) decides whether this sender has been seen before.
        let new_interactor = match interactor {
            Some(sender) => {
                let interactor_marker = processed_transaction_hashes::ActiveModel {
                    tx_hash: Set(format!("interactor:{address}:{sender}")),
                    processed_at: Set(Utc::now()),
                };
                let result = processed_transaction_hashes::Entity::insert(interactor_marker)
                    .on_conflict(
                        OnConflict::column(processed_transaction_hashes::Column::TxHash)
                            .do_nothing()
                            .to_owned(),
                    )
                    .do_nothing()
                    .exec(&txn)
                    .await;
                !matches!(
                    result,
                    Err(sea_orm::DbErr::RecordNotInserted) | Ok(sea_orm::TryInsertResult::Conflicted)
                )
            }
            None => false,
        };
        let unique_interactors_delta: i64 = if new_interactor { 1 } else { 0 };

        let existing = smart_contracts::Entity::find_by_id(address.to_owned())
            .one(&txn)
            .await?;
        let now = Utc::now();

        let total_gas_used = existing
            .as_ref()
            .and_then(|r| r.total_gas_used.parse::<u128>().ok())
            .unwrap_or(0)
            + deltas.gas_used as u128;
        let total_value_transferred = existing
            .as_ref()
            .and_then(|r| r.total_value_transferred.parse::<u128>().ok())
            .unwrap_or(0)
            + deltas.value_transferred;

        let model = smart_contracts::ActiveModel {
            address: Set(address.to_owned()),
            name: Set(existing.as_ref().and_then(|r| r.name.clone())),
            symbol: Set(existing.as_ref().and_then(|r| r.symbol.clone())),
            contract_type: Set(existing.as_ref().and_then(|r| r.contract_type.clone())),
            creator_address: Set(existing
                .as_ref()
                .and_then(|r| r.creator_address.clone())
                .or_else(|| creator_address.map(str::to_owned))),
            creation_tx_hash: Set(existing
                .as_ref()
                .and_then(|r| r.creation_tx_hash.clone())
                .or_else(|| creation_tx_hash.map(str::to_owned))),
            creation_block: Set(existing
                .as_ref()
                .and_then(|r| r.creation_block)
                .or(creation_block.map(|b| b as i64))),
            verification_status: Set(existing
                .as_ref()
                .map(|r| r.verification_status.clone())
                .unwrap_or(evm_indexer_entity::sea_orm_active_enums::VerificationStatus::Unverified)),
            abi: Set(existing.as_ref().and_then(|r| r.abi.clone())),
            bytecode: Set(existing.as_ref().and_then(|r| r.bytecode.clone())),
            total_transactions: Set(existing
                .as_ref()
                .map(|r| r.total_transactions)
                .unwrap_or(0)
                + deltas.transactions),
            unique_interactors: Set(existing
                .as_ref()
                .map(|r| r.unique_interactors)
                .unwrap_or(0)
                + unique_interactors_delta),
            total_gas_used: Set(total_gas_used.to_string()),
            total_value_transferred: Set(total_value_transferred.to_string()),
            total_events: Set(existing.as_ref().map(|r| r.total_events).unwrap_or(0) + deltas.events),
            is_proxy: Set(existing.as_ref().map(|r| r.is_proxy).unwrap_or(false)),
            implementation_address: Set(existing
                .as_ref()
                .and_then(|r| r.implementation_address.clone())),
            inserted_at: Set(existing.as_ref().map(|r| r.inserted_at).unwrap_or(now)),
            updated_at: Set(now),
        };

        smart_contracts::Entity::insert(model)
            .on_conflict(
                OnConflict::column(smart_contracts::Column::Address)
                    .update_columns([
                        smart_contracts::Column::TotalTransactions,
                        smart_contracts::Column::UniqueInteractors,
                        smart_contracts::Column::TotalGasUsed,
                        smart_contracts::Column::TotalValueTransferred,
                        smart_contracts::Column::TotalEvents,
                        smart_contracts::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(())
    }

    pub async fn validator_upsert_block_proposed(
        &self,
        address: &str,
        block_number: u64,
    ) -> Result<(), StoreError> {
        let existing = validators::Entity::find_by_id(address.to_owned())
            .one(&self.db)
            .await?;
        let now = Utc::now();
        let model = validators::ActiveModel {
            address: Set(address.to_owned()),
            blocks_proposed: Set(existing.as_ref().map(|r| r.blocks_proposed).unwrap_or(0) + 1),
            last_proposed_block: Set(Some(block_number as i64)),
            active: Set(existing.as_ref().map(|r| r.active).unwrap_or(true)),
            uptime_score: Set(existing.as_ref().and_then(|r| r.uptime_score)),
            inserted_at: Set(existing.as_ref().map(|r| r.inserted_at).unwrap_or(now)),
            updated_at: Set(now),
        };
        validators::Entity::insert(model)
            .on_conflict(
                OnConflict::column(validators::Column::Address)
                    .update_columns([
                        validators::Column::BlocksProposed,
                        validators::Column::LastProposedBlock,
                        validators::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;
        Ok(())
    }

    pub async fn validator_set_score(
        &self,
        address: &str,
        active: bool,
        uptime_score: f64,
    ) -> Result<(), StoreError> {
        let existing = validators::Entity::find_by_id(address.to_owned())
            .one(&self.db)
            .await?;
        let now = Utc::now();
        let model = validators::ActiveModel {
            address: Set(address.to_owned()),
            blocks_proposed: Set(existing.as_ref().map(|r| r.blocks_proposed).unwrap_or(0)),
            last_proposed_block: Set(existing.as_ref().and_then(|r| r.last_proposed_block)),
            active: Set(active),
            uptime_score: Set(Some(uptime_score)),
            inserted_at: Set(existing.as_ref().map(|r| r.inserted_at).unwrap_or(now)),
            updated_at: Set(now),
        };
        validators::Entity::insert(model)
            .on_conflict(
                OnConflict::column(validators::Column::Address)
                    .update_columns([
                        validators::Column::Active,
                        validators::Column::UptimeScore,
                        validators::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;
        Ok(())
    }
}

pub fn event_id(block_hash: &str, log_index: u32) -> String {
    format!("{block_hash}:{log_index}")
}

#[derive(Debug, Clone, Default)]
pub struct DecodedEvent {
    pub decoded_data: Option<serde_json::Value>,
    pub event_name: Option<String>,
    pub event_signature: Option<String>,
    pub timestamp: Option<i64>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn event_id_is_deterministic_in_block_hash_and_log_index() {
        assert_eq!(event_id("0xBB01", 3), event_id("0xBB01", 3));
        assert_ne!(event_id("0xBB01", 3), event_id("0xBB01", 4));
        assert_ne!(event_id("0xBB01", 3), event_id("0xBB02", 3));
    }
}
