use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, warn};

use crate::broker::BrokerClient;
use crate::cache::{keys, Cache, TtlTier};
use crate::jobs::{BlockMinedJob, BlockProcessedEvent, QUEUE_BLOCK_MINED, QUEUE_BLOCK_PROCESSED};
use crate::node::NodeClient;
use crate::store::{BatchBuffer, Store};

use super::{Handler, HandlerOutcome};

pub struct BlockHandler<N: NodeClient> {
    node: Arc<N>,
    store: Store,
    cache: Cache,
    broker: Arc<BrokerClient>,
    batch: Arc<BatchBuffer<crate::node::NodeBlock>>,
}

impl<N: NodeClient> BlockHandler<N> {
    pub fn new(
        node: Arc<N>,
        store: Store,
        cache: Cache,
        broker: Arc<BrokerClient>,
        batch: Arc<BatchBuffer<crate::node::NodeBlock>>,
    ) -> Self {
        Self { node, store, cache, broker, batch }
    }
}

#[async_trait]
impl<N: NodeClient> Handler for BlockHandler<N> {
    fn queue(&self) -> &'static str {
        QUEUE_BLOCK_MINED
    }

    async fn handle(&self, payload: &[u8]) -> HandlerOutcome {
        let job: BlockMinedJob = match serde_json::from_slice(payload) {
            Ok(job) => job,
            Err(err) => {
                warn!(err = %err, "malformed block-mined payload");
                return HandlerOutcome::NackReject;
            }
        };

        match self.store.block_exists(&job.hash).await {
            Ok(true) => return HandlerOutcome::Ack,
            Ok(false) => {}
            Err(err) => {
                error!(err = %err, hash = %job.hash, "store lookup failed");
                return HandlerOutcome::NackRequeue;
            }
        }

        let block = match self.node.block_by_hash(&job.hash).await {
            Ok(Some(block)) => block,
            Ok(None) => {
                warn!(hash = %job.hash, "block disappeared between mined and fetch");
                return HandlerOutcome::NackRequeue;
            }
            Err(err) => {
                error!(err = %err, hash = %job.hash, "failed to fetch full block");
                return HandlerOutcome::NackRequeue;
            }
        };

        let transaction_count = block.transaction_hashes.len() as i32;

        if let Some(batch) = self.batch.push(block.clone()).await {
            if let Err(err) = flush_blocks(&self.store, batch).await {
                error!(err = %err, "failed to flush block batch");
                return HandlerOutcome::NackRequeue;
            }
        }

        match self.cache.get::<u64>(&keys::latest_block()).await {
            Some(latest) if latest >= block.number => {}
            _ => self.cache.set(&keys::latest_block(), &block.number, TtlTier::Hot).await,
        }

        let event = BlockProcessedEvent {
            number: block.number,
            hash: block.hash.clone(),
            timestamp: block.timestamp,
            transaction_count,
        };
        if let Ok(payload) = serde_json::to_vec(&event) {
            if let Err(err) = self.broker.publish(QUEUE_BLOCK_PROCESSED, &payload).await {
                error!(err = %err, "failed to publish block-processed");
            }
        }

        HandlerOutcome::Ack
    }
}

async fn flush_blocks(store: &Store, batch: Vec<crate::node::NodeBlock>) -> anyhow::Result<()> {
    for block in batch {
        store.block_upsert(&block).await?;
    }
    Ok(())
}
