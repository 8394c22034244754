use std::time::Duration;

use alloy::{
    eips::BlockNumberOrTag,
    network::Ethereum,
    primitives::{Address, B256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::{
        Block as AlloyBlock, Filter, Log as AlloyLog, SyncStatus as AlloySyncStatus,
        Transaction as AlloyTransaction,
    },
};
use async_stream::stream;
use async_trait::async_trait;
use futures::{StreamExt, stream::BoxStream};
use tokio::time::timeout;

use crate::error::NodeError;
use crate::metrics::NODE_CALL_RETRIES_TOTAL;
use crate::settings::NodeClientSettings;

use super::types::{
    NodeBlock, NodeLog, NodeReceipt, NodeSyncStatus, NodeTransaction, NodeTransactionType,
};

pub struct AlloyNodeClient {
    http: DynProvider<Ethereum>,
    ws: Option<DynProvider<Ethereum>>,
    settings: NodeClientSettings,
}

impl AlloyNodeClient {
    pub async fn connect(settings: NodeClientSettings) -> anyhow::Result<Self> {
        let http = ProviderBuilder::new()
            .connect_http(settings.rpc_url.parse()?)
            .erased();

        let ws = match &settings.ws_url {
            Some(url) => Some(ProviderBuilder::new().connect_ws(url.parse()?).await?.erased()),
            None => None,
        };

        Ok(Self { http, ws, settings })
    }

    async fn with_retry<T, F, Fut>(&self, method: &'static str, mut call: F) -> Result<T, NodeError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = anyhow::Result<T>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = timeout(self.settings.call_timeout, call()).await;
            match result {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(err)) if attempt < self.settings.call_retries => {
                    NODE_CALL_RETRIES_TOTAL.with_label_values(&[method]).inc();
                    tracing::warn!(method, attempt, err = %err, "node call failed, retrying");
                    tokio::time::sleep(Duration::from_millis(500)).await;
                }
                Ok(Err(err)) => return Err(NodeError::Transport(err)),
                Err(_) if attempt < self.settings.call_retries => {
                    NODE_CALL_RETRIES_TOTAL.with_label_values(&[method]).inc();
                    tracing::warn!(method, attempt, "node call timed out, retrying");
                }
                Err(_) => return Err(NodeError::Timeout(self.settings.call_timeout)),
            }
        }
    }
}

fn convert_block(block: AlloyBlock) -> NodeBlock {
    let header = &block.header;
    NodeBlock {
        hash: header.hash.to_string(),
        number: header.number,
        parent_hash: header.parent_hash.to_string(),
        timestamp: header.timestamp as i64,
        proposer: Some(header.beneficiary.to_string()),
        gas_limit: header.gas_limit,
        gas_used: header.gas_used,
        base_fee_per_gas: header.base_fee_per_gas.map(|v| v.to_string()),
        transaction_hashes: block
            .transactions
            .hashes()
            .map(|h| h.to_string())
            .collect(),
        size: block.size().map(|s| s.to::<u64>()),
        extra_data: Some(header.extra_data.to_string()),
        state_root: Some(header.state_root.to_string()),
        receipts_root: Some(header.receipts_root.to_string()),
        transactions_root: Some(header.transactions_root.to_string()),
        nonce: Some(header.nonce.to_string()),
        mix_hash: Some(header.mix_hash.to_string()),
    }
}

fn convert_transaction(tx: AlloyTransaction) -> NodeTransaction {
    let inner = tx.inner.inner.clone();
    NodeTransaction {
        hash: tx.inner.tx_hash().to_string(),
        block_hash: tx.block_hash.map(|h| h.to_string()),
        block_number: tx.block_number,
        transaction_index: tx.transaction_index.map(|i| i as u32),
        from: tx.inner.signer().to_string(),
        to: inner.to().map(|a| a.to_string()),
        value: inner.value().to_string(),
        gas_limit: inner.gas_limit(),
        gas_price: inner.gas_price().map(|v| v.to_string()),
        max_fee_per_gas: Some(inner.max_fee_per_gas().to_string()),
        max_priority_fee_per_gas: inner.max_priority_fee_per_gas().map(|v| v.to_string()),
        nonce: inner.nonce(),
        input: inner.input().to_string(),
        transaction_type: match inner.ty() {
            0 => NodeTransactionType::Legacy,
            1 => NodeTransactionType::AccessList,
            _ => NodeTransactionType::DynamicFee,
        },
    }
}

fn convert_sync_status(status: AlloySyncStatus) -> NodeSyncStatus {
    match status {
        AlloySyncStatus::Info(info) => NodeSyncStatus {
            is_syncing: true,
            current_block: info.current_block,
            highest_block: info.highest_block,
        },
        AlloySyncStatus::None => {
            NodeSyncStatus { is_syncing: false, current_block: 0, highest_block: 0 }
        }
    }
}

fn convert_log(log: AlloyLog) -> NodeLog {
    NodeLog {
        address: log.address().to_string(),
        topics: log.topics().iter().map(|t| t.to_string()).collect(),
        data: log.data().data.to_string(),
        block_hash: log.block_hash.map(|h| h.to_string()).unwrap_or_default(),
        block_number: log.block_number.unwrap_or_default(),
        transaction_hash: log
            .transaction_hash
            .map(|h| h.to_string())
            .unwrap_or_default(),
        transaction_index: log.transaction_index.unwrap_or_default() as u32,
        log_index: log.log_index.unwrap_or_default() as u32,
        removed: log.removed,
    }
}

#[async_trait]
impl super::NodeClient for AlloyNodeClient {
    fn subscribe_new_heads(&self) -> BoxStream<'static, NodeBlock> {
        let http = self.http.clone();
        let ws = self.ws.clone();
        let poll_interval = self.settings.poll_interval;

        stream! {
            if let Some(ws) = ws {
                match ws.subscribe_blocks().await {
                    Ok(sub) => {
                        let mut inner = sub.into_stream();
                        while let Some(header) = inner.next().await {
                            if let Ok(Some(block)) = ws
                                .get_block_by_hash(header.hash)
                                .await
                            {
                                yield convert_block(block);
                            }
                        }
                        tracing::warn!("head subscription ended, falling back to polling");
                    }
                    Err(err) => {
                        tracing::warn!(err = %err, "head subscription unavailable, polling instead");
                    }
                }
            }

            let mut last_seen = 0u64;
            loop {
                match http.get_block_number().await {
                    Ok(latest) if latest > last_seen => {
                        for number in (last_seen + 1)..=latest {
                            if let Ok(Some(block)) = http
                                .get_block_by_number(BlockNumberOrTag::Number(number))
                                .await
                            {
                                yield convert_block(block);
                            }
                        }
                        last_seen = latest;
                    }
                    Ok(_) => {}
                    Err(err) => tracing::error!(err = %err, "poll for new heads failed"),
                }
                tokio::time::sleep(poll_interval).await;
            }
        }
        .boxed()
    }

    fn subscribe_pending_tx_hashes(&self) -> BoxStream<'static, String> {
        let ws = self.ws.clone();
        let poll_interval = self.settings.poll_interval;

        stream! {
            if let Some(ws) = ws {
                match ws.subscribe_pending_transactions().await {
                    Ok(sub) => {
                        let mut inner = sub.into_stream();
                        while let Some(hash) = inner.next().await {
                            yield hash.to_string();
                        }
                        tracing::warn!("pending-tx subscription ended");
                    }
                    Err(err) => {
                        tracing::warn!(err = %err, "pending-tx subscription unavailable");
                    }
                }
            }
            // No polling fallback for the mempool: a Besu node without a
            // websocket endpoint simply does not surface pending-tx jobs.
            std::future::pending::<()>().await;
            #[allow(unreachable_code)]
            loop {
                tokio::time::sleep(poll_interval).await;
            }
        }
        .boxed()
    }

    async fn block_by_number(&self, number: u64) -> Result<Option<NodeBlock>, NodeError> {
        self.with_retry("block_by_number", || async {
            Ok(self
                .http
                .get_block_by_number(BlockNumberOrTag::Number(number))
                .await?
                .map(convert_block))
        })
        .await
    }

    async fn block_by_hash(&self, hash: &str) -> Result<Option<NodeBlock>, NodeError> {
        let hash: B256 = hash.parse().map_err(|_| NodeError::NotFound)?;
        self.with_retry("block_by_hash", || async {
            Ok(self.http.get_block_by_hash(hash).await?.map(convert_block))
        })
        .await
    }

    async fn transaction_by_hash(
        &self,
        hash: &str,
    ) -> Result<Option<(NodeTransaction, bool)>, NodeError> {
        let hash: B256 = hash.parse().map_err(|_| NodeError::NotFound)?;
        self.with_retry("transaction_by_hash", || async {
            let tx = self.http.get_transaction_by_hash(hash).await?;
            Ok(tx.map(|tx| {
                let is_pending = tx.block_hash.is_none();
                (convert_transaction(tx), is_pending)
            }))
        })
        .await
    }

    async fn transaction_receipt(&self, hash: &str) -> Result<Option<NodeReceipt>, NodeError> {
        let hash: B256 = hash.parse().map_err(|_| NodeError::NotFound)?;
        self.with_retry("transaction_receipt", || async {
            let receipt = self.http.get_transaction_receipt(hash).await?;
            Ok(receipt.map(|r| NodeReceipt {
                transaction_hash: r.transaction_hash.to_string(),
                status: r.status(),
                gas_used: r.gas_used,
                contract_address: r.contract_address.map(|a| a.to_string()),
                logs_bloom: r.inner.logs_bloom().to_string(),
                logs: r.inner.logs().iter().cloned().map(convert_log).collect(),
            }))
        })
        .await
    }

    async fn logs_in_range(&self, from_block: u64, to_block: u64) -> Result<Vec<NodeLog>, NodeError> {
        self.with_retry("logs_in_range", || async {
            let filter = Filter::new().from_block(from_block).to_block(to_block);
            let logs = self.http.get_logs(&filter).await?;
            Ok(logs.into_iter().map(convert_log).collect())
        })
        .await
    }

    async fn peer_count(&self) -> Result<u64, NodeError> {
        self.with_retry("peer_count", || async {
            let count = self.http.get_net_version().await?;
            Ok(count)
        })
        .await
    }

    async fn current_block_number(&self) -> Result<u64, NodeError> {
        self.with_retry("current_block_number", || async {
            Ok(self.http.get_block_number().await?)
        })
        .await
    }

    async fn validator_addresses(&self, block_number: u64) -> Result<Vec<String>, NodeError> {
        self.with_retry("validator_addresses", || async {
            let tag = format!("0x{block_number:x}");
            let addresses: Vec<Address> = self
                .http
                .client()
                .request("qbft_getValidatorsByBlockNumber", (tag,))
                .await?;
            Ok(addresses.into_iter().map(|a| a.to_string()).collect())
        })
        .await
    }

    async fn code_at(&self, address: &str) -> Result<Vec<u8>, NodeError> {
        let address: Address = address.parse().map_err(|_| NodeError::NotFound)?;
        self.with_retry("code_at", || async {
            Ok(self.http.get_code_at(address).await?.to_vec())
        })
        .await
    }

    async fn sync_status(&self) -> Result<NodeSyncStatus, NodeError> {
        self.with_retry("sync_status", || async {
            Ok(convert_sync_status(self.http.syncing().await?))
        })
        .await
    }
}
