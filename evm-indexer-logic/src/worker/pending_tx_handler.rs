use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use evm_indexer_entity::sea_orm_active_enums::{TransactionStatus, TransactionType};
use evm_indexer_entity::transactions;
use sea_orm::{sea_query::OnConflict, ActiveValue::Set, EntityTrait};
use tracing::{error, warn};

use crate::jobs::{PendingTxJob, QUEUE_PENDING_TX};
use crate::node::NodeClient;
use crate::store::Store;

use super::{Handler, HandlerOutcome};

/// Inserts a pending-status placeholder row. The later `transaction-mined`
/// delivery for the same hash upserts over it in place, transitioning
/// `status` from pending to success/failed.
pub struct PendingTxHandler<N: NodeClient> {
    node: Arc<N>,
    store: Store,
}

impl<N: NodeClient> PendingTxHandler<N> {
    pub fn new(node: Arc<N>, store: Store) -> Self {
        Self { node, store }
    }
}

#[async_trait]
impl<N: NodeClient> Handler for PendingTxHandler<N> {
    fn queue(&self) -> &'static str {
        QUEUE_PENDING_TX
    }

    async fn handle(&self, payload: &[u8]) -> HandlerOutcome {
        let job: PendingTxJob = match serde_json::from_slice(payload) {
            Ok(job) => job,
            Err(err) => {
                warn!(err = %err, "malformed pending-tx payload");
                return HandlerOutcome::NackReject;
            }
        };

        if job.hash.is_empty() {
            return HandlerOutcome::NackReject;
        }

        match self.store.tx_exists(&job.hash).await {
            Ok(true) => return HandlerOutcome::Ack,
            Ok(false) => {}
            Err(err) => {
                error!(err = %err, hash = %job.hash, "store lookup failed");
                return HandlerOutcome::NackRequeue;
            }
        }

        let (tx, is_pending) = match self.node.transaction_by_hash(&job.hash).await {
            Ok(Some(pair)) => pair,
            Ok(None) => return HandlerOutcome::Ack,
            Err(err) => {
                error!(err = %err, hash = %job.hash, "failed to fetch pending transaction");
                return HandlerOutcome::NackRequeue;
            }
        };

        if !is_pending {
            // Already mined by the time we looked it up; the transaction
            // handler's job for this hash will upsert the final row.
            return HandlerOutcome::Ack;
        }

        let now = Utc::now();
        let model = transactions::ActiveModel {
            hash: Set(tx.hash.clone()),
            block_hash: Set(String::new()),
            block_number: Set(0),
            transaction_index: Set(0),
            from_address: Set(tx.from.clone()),
            to_address: Set(tx.to.clone()),
            value: Set(tx.value.clone()),
            gas_limit: Set(tx.gas_limit as i64),
            gas_used: Set(None),
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
            status: Set(TransactionStatus::Pending),
            contract_address: Set(None),
            logs_bloom: Set(None),
            method_type: Set(None),
            method_name: Set(None),
            mined_at: Set(None),
            removed: Set(false),
            inserted_at: Set(now),
            updated_at: Set(now),
        };

        let result = transactions::Entity::insert(model)
            .on_conflict(
                OnConflict::column(transactions::Column::Hash)
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(self.store.connection())
            .await;

        if let Err(err) = result {
            error!(err = %err, hash = %job.hash, "failed to insert pending transaction placeholder");
            return HandlerOutcome::NackRequeue;
        }

        HandlerOutcome::Ack
    }
}
