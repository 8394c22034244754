//! The Indexer: subscribes to the node, publishes ingest jobs, and tracks
//! the resume cursor. Structured as one long-running task per concern
//! (new heads, pending transactions, validator polling) sharing the same
//! node/broker/store handles, generalized from a single indexing loop to
//! several independent ones.

mod accounts;
mod validators;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::StreamExt;
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::broker::BrokerClient;
use crate::cursor::{self, Cursor, INDEXER_COMPONENT};
use crate::jobs::{BlockMinedJob, PendingTxJob, QUEUE_BLOCK_MINED, QUEUE_PENDING_TX};
use crate::node::{NodeBlock, NodeClient};
use crate::settings::ValidatorMonitorSettings;
use crate::store::Store;

pub struct Indexer<N: NodeClient> {
    node: Arc<N>,
    broker: Arc<BrokerClient>,
    store: Store,
    validator_settings: ValidatorMonitorSettings,
    starting_block: Option<u64>,
    is_running: Arc<AtomicBool>,
    handles: RwLock<Vec<JoinHandle<()>>>,
}

impl<N: NodeClient> Indexer<N> {
    pub fn new(
        node: Arc<N>,
        broker: Arc<BrokerClient>,
        store: Store,
        validator_settings: ValidatorMonitorSettings,
        starting_block: Option<u64>,
    ) -> Self {
        Self {
            node,
            broker,
            store,
            validator_settings,
            starting_block,
            is_running: Arc::new(AtomicBool::new(false)),
            handles: RwLock::new(Vec::new()),
        }
    }

    pub async fn start(&self) -> anyhow::Result<()> {
        if self.is_running.swap(true, Ordering::AcqRel) {
            warn!("indexer is already running");
            return Ok(());
        }

        let cursor = cursor::load_cursor(self.store.connection(), INDEXER_COMPONENT).await?;
        let cursor = match self.starting_block {
            Some(start) => cursor.advanced(start),
            None => cursor,
        };
        info!(cursor = cursor.0, "indexer starting from cursor");

        let mut handles = Vec::new();
        handles.push(self.spawn_new_heads_loop(cursor));
        handles.push(self.spawn_pending_tx_loop());
        handles.push(self.spawn_validator_loop());
        *self.handles.write() = handles;

        Ok(())
    }

    pub async fn stop(&self) {
        if !self.is_running.swap(false, Ordering::AcqRel) {
            return;
        }
        for handle in self.handles.write().drain(..) {
            handle.abort();
        }
    }

    fn spawn_new_heads_loop(&self, initial_cursor: Cursor) -> JoinHandle<()> {
        let node = self.node.clone();
        let broker = self.broker.clone();
        let store = self.store.clone();
        let is_running = self.is_running.clone();

        tokio::spawn(async move {
            let mut cursor = initial_cursor;
            let mut heads = node.subscribe_new_heads();
            while is_running.load(Ordering::Acquire) {
                let Some(block) = heads.next().await else {
                    error!("new-heads stream ended, reconnecting in 5s");
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    heads = node.subscribe_new_heads();
                    continue;
                };

                if block.number <= cursor.0 {
                    // Already published (duplicate delivery on reconnect); skip.
                    continue;
                }

                match publish_block(&broker, &node, &block).await {
                    Ok(()) => {
                        cursor = cursor.advanced(block.number);
                        if let Err(err) =
                            cursor::store_cursor(store.connection(), INDEXER_COMPONENT, cursor)
                                .await
                        {
                            error!(err = %err, "failed to persist cursor");
                        }
                    }
                    Err(err) => {
                        error!(err = %err, number = block.number, "failed to publish block jobs");
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        })
    }

    fn spawn_pending_tx_loop(&self) -> JoinHandle<()> {
        let node = self.node.clone();
        let broker = self.broker.clone();
        let is_running = self.is_running.clone();

        tokio::spawn(async move {
            let mut pending = node.subscribe_pending_tx_hashes();
            while is_running.load(Ordering::Acquire) {
                let Some(hash) = pending.next().await else {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    pending = node.subscribe_pending_tx_hashes();
                    continue;
                };
                let job = PendingTxJob { hash };
                if let Err(err) = publish_json(&broker, QUEUE_PENDING_TX, &job).await {
                    error!(err = %err, "failed to publish pending-tx job");
                }
            }
        })
    }

    fn spawn_validator_loop(&self) -> JoinHandle<()> {
        let node = self.node.clone();
        let store = self.store.clone();
        let settings = self.validator_settings.clone();
        let is_running = self.is_running.clone();

        tokio::spawn(async move {
            let mut last_polled_at = 0u64;
            while is_running.load(Ordering::Acquire) {
                match node.current_block_number().await {
                    Ok(current)
                        if current.saturating_sub(last_polled_at)
                            >= settings.poll_interval_blocks =>
                    {
                        if let Err(err) =
                            validators::poll_and_score(&*node, &store, &settings, current).await
                        {
                            error!(err = %err, "validator monitoring iteration failed");
                        }
                        last_polled_at = current;
                    }
                    Ok(_) => {}
                    Err(err) => error!(err = %err, "failed to read current block number"),
                }
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        })
    }
}

async fn publish_block<N: NodeClient>(
    broker: &BrokerClient,
    node: &N,
    header: &NodeBlock,
) -> anyhow::Result<()> {
    let job = BlockMinedJob {
        number: header.number,
        hash: header.hash.clone(),
        timestamp: header.timestamp,
    };
    publish_json(broker, QUEUE_BLOCK_MINED, &job).await?;

    // Fan out transaction/account/event jobs from the full block body so
    // the Transaction/Event handlers have less to re-fetch.
    if let Ok(Some(full)) = node.block_by_hash(&header.hash).await {
        accounts::fan_out_block(broker, node, &full).await?;
    }

    Ok(())
}

async fn publish_json<T: serde::Serialize>(
    broker: &BrokerClient,
    queue: &str,
    value: &T,
) -> anyhow::Result<()> {
    let payload = serde_json::to_vec(value)?;
    broker.publish(queue, &payload).await?;
    Ok(())
}

pub(crate) use publish_json as publish_job;
