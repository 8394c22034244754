use crate::broker::BrokerClient;
use crate::jobs::{
    AccountDiscoveredJob, DiscoveredVia, EventDiscoveredJob, TransactionMinedJob,
    QUEUE_ACCOUNT_DISCOVERED, QUEUE_EVENT_DISCOVERED, QUEUE_TRANSACTION_MINED,
};
use crate::node::{NodeBlock, NodeClient};

use super::publish_job;

/// Publishes `transaction-mined`, `account-discovered`, and
/// `event-discovered` jobs for every transaction and log in `block`.
pub async fn fan_out_block<N: NodeClient>(
    broker: &BrokerClient,
    node: &N,
    block: &NodeBlock,
) -> anyhow::Result<()> {
    for hash in &block.transaction_hashes {
        publish_job(
            broker,
            QUEUE_TRANSACTION_MINED,
            &TransactionMinedJob {
                hash: hash.clone(),
                block_hash: block.hash.clone(),
                block_number: block.number,
            },
        )
        .await?;

        if let Ok(Some((tx, _is_pending))) = node.transaction_by_hash(hash).await {
            publish_job(
                broker,
                QUEUE_ACCOUNT_DISCOVERED,
                &AccountDiscoveredJob {
                    address: tx.from.clone(),
                    discovered_via: DiscoveredVia::TransactionFrom,
                },
            )
            .await?;
            if let Some(to) = &tx.to {
                publish_job(
                    broker,
                    QUEUE_ACCOUNT_DISCOVERED,
                    &AccountDiscoveredJob {
                        address: to.clone(),
                        discovered_via: DiscoveredVia::TransactionTo,
                    },
                )
                .await?;
            }
        }
    }

    if let Ok(logs) = node.logs_in_range(block.number, block.number).await {
        for log in logs {
            publish_job(
                broker,
                QUEUE_EVENT_DISCOVERED,
                &EventDiscoveredJob {
                    id: crate::store::event_id(&log.block_hash, log.log_index),
                    contract_address: log.address.clone(),
                    tx_hash: log.transaction_hash.clone(),
                    block_number: log.block_number,
                    block_hash: log.block_hash.clone(),
                    log_index: log.log_index,
                    transaction_index: log.transaction_index,
                    topics: log.topics.clone(),
                    data: log.data.clone(),
                    removed: log.removed,
                },
            )
            .await?;
            publish_job(
                broker,
                QUEUE_ACCOUNT_DISCOVERED,
                &AccountDiscoveredJob {
                    address: log.address,
                    discovered_via: DiscoveredVia::EventParticipant,
                },
            )
            .await?;
        }
    }

    Ok(())
}
