use std::sync::Arc;

use async_trait::async_trait;
use evm_indexer_entity::sea_orm_active_enums::AccountType;
use tracing::{error, warn};

use crate::broker::BrokerClient;
use crate::cache::{keys, Cache, TtlTier};
use crate::enrichment::method_signatures::identify_method;
use crate::jobs::{
    TransactionMinedJob, TransactionProcessedEvent, QUEUE_TRANSACTION_MINED,
    QUEUE_TRANSACTION_PROCESSED,
};
use crate::node::NodeClient;
use crate::store::{AccountDeltas, ContractMetricDeltas, Store};

use super::{Handler, HandlerOutcome};

pub struct TransactionHandler<N: NodeClient> {
    node: Arc<N>,
    store: Store,
    cache: Cache,
    broker: Arc<BrokerClient>,
}

impl<N: NodeClient> TransactionHandler<N> {
    pub fn new(node: Arc<N>, store: Store, cache: Cache, broker: Arc<BrokerClient>) -> Self {
        Self { node, store, cache, broker }
    }
}

#[async_trait]
impl<N: NodeClient> Handler for TransactionHandler<N> {
    fn queue(&self) -> &'static str {
        QUEUE_TRANSACTION_MINED
    }

    async fn handle(&self, payload: &[u8]) -> HandlerOutcome {
        let job: TransactionMinedJob = match serde_json::from_slice(payload) {
            Ok(job) => job,
            Err(err) => {
                warn!(err = %err, "malformed transaction-mined payload");
                return HandlerOutcome::NackReject;
            }
        };

        if job.hash.is_empty() || job.block_hash.is_empty() || job.block_number == 0 {
            warn!(?job, "rejecting malformed transaction-mined job");
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
            Ok(None) => {
                warn!(hash = %job.hash, "transaction disappeared before fetch");
                return HandlerOutcome::NackRequeue;
            }
            Err(err) => {
                error!(err = %err, hash = %job.hash, "failed to fetch transaction");
                return HandlerOutcome::NackRequeue;
            }
        };

        if is_pending {
            // Will be re-emitted as transaction-mined once it is actually mined.
            return HandlerOutcome::Ack;
        }

        let receipt = match self.node.transaction_receipt(&job.hash).await {
            Ok(receipt) => receipt,
            Err(err) => {
                error!(err = %err, hash = %job.hash, "failed to fetch receipt");
                return HandlerOutcome::NackRequeue;
            }
        };

        let mined_at = match self.node.block_by_hash(&job.block_hash).await {
            Ok(Some(block)) => Some(block.timestamp),
            _ => match self.node.block_by_number(job.block_number).await {
                Ok(Some(block)) => Some(block.timestamp),
                _ => None,
            },
        };

        let method_sig = identify_method(&tx.input);
        let method_type = method_sig.map(|s| s.method_type.as_str().to_owned());
        let method_name = method_sig.map(|s| s.name.to_owned());

        if let Err(err) = self
            .store
            .tx_upsert(&tx, receipt.as_ref(), mined_at, method_type.clone(), method_name.clone())
            .await
        {
            error!(err = %err, hash = %job.hash, "failed to upsert transaction");
            return HandlerOutcome::NackRequeue;
        }

        let is_creation = receipt.as_ref().and_then(|r| r.contract_address.clone());
        let gas_used = receipt.as_ref().map(|r| r.gas_used).unwrap_or(0);
        let value: u128 = tx.value.parse().unwrap_or(0);

        if let Err(err) = self
            .store
            .account_upsert_and_increment(
                &tx.from,
                AccountType::Eoa,
                false,
                &job.hash,
                AccountDeltas { transaction_count: 1, contract_interactions_count: 0 },
            )
            .await
        {
            error!(err = %err, address = %tx.from, "failed to project sender account");
        }

        if let Some(to) = &tx.to {
            let to_is_contract = is_creation.is_none()
                && self.store.contract_name_by_address(to).await.ok().flatten().is_some();
            let to_account_type =
                if to_is_contract { AccountType::SmartAccount } else { AccountType::Eoa };
            if let Err(err) = self
                .store
                .account_upsert_and_increment(
                    to,
                    to_account_type,
                    to_is_contract,
                    &job.hash,
                    AccountDeltas { transaction_count: 1, contract_interactions_count: 1 },
                )
                .await
            {
                error!(err = %err, address = %to, "failed to project recipient account");
            }

            if to_is_contract {
                if let Err(err) = self
                    .store
                    .contract_metrics_update(
                        to,
                        None,
                        None,
                        None,
                        &job.hash,
                        Some(&tx.from),
                        ContractMetricDeltas {
                            transactions: 1,
                            gas_used,
                            value_transferred: value,
                            events: 0,
                        },
                    )
                    .await
                {
                    error!(err = %err, address = %to, "failed to accumulate contract metrics");
                }
            }
        }

        if let Some(created) = &is_creation {
            if let Err(err) = self
                .store
                .account_upsert_and_increment(
                    created,
                    AccountType::SmartAccount,
                    true,
                    &job.hash,
                    AccountDeltas::default(),
                )
                .await
            {
                error!(err = %err, address = %created, "failed to project created contract account");
            }
            if let Err(err) = self
                .store
                .contract_metrics_update(
                    created,
                    Some(&tx.from),
                    Some(&job.hash),
                    Some(job.block_number),
                    &job.hash,
                    None,
                    ContractMetricDeltas::default(),
                )
                .await
            {
                error!(err = %err, address = %created, "failed to record contract creation");
            }
        }

        self.cache.set(&keys::tx_summary(&job.hash), &job.hash, TtlTier::Warm).await;

        let status = match &receipt {
            Some(r) if r.status => "success",
            Some(_) => "failed",
            None => "pending",
        };
        let event = TransactionProcessedEvent {
            kind: TransactionProcessedEvent::KIND,
            hash: job.hash.clone(),
            block_number: job.block_number,
            from_address: tx.from.clone(),
            to_address: tx.to.clone(),
            value: tx.value.clone(),
            gas_used: receipt.as_ref().map(|r| r.gas_used as i64),
            status: status.to_owned(),
            timestamp: mined_at,
        };
        if let Ok(payload) = serde_json::to_vec(&event) {
            if let Err(err) = self.broker.publish(QUEUE_TRANSACTION_PROCESSED, &payload).await {
                error!(err = %err, "failed to publish transaction-processed");
            }
        }

        HandlerOutcome::Ack
    }
}
