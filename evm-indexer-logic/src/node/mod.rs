//! Access to the chain node: block/transaction/receipt/log lookups plus
//! head and pending-transaction subscriptions, with a polling fallback when
//! push subscriptions are unavailable.

mod alloy_client;
mod types;

pub use alloy_client::AlloyNodeClient;
pub use types::{NodeBlock, NodeLog, NodeReceipt, NodeSyncStatus, NodeTransaction};

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::NodeError;

#[async_trait]
pub trait NodeClient: Send + Sync + 'static {
    /// A stream of new block headers. Reconnects internally; an error on
    /// the stream means the underlying subscription could not be
    /// re-established and the caller should treat it as fatal for this
    /// attempt and retry constructing the stream.
    fn subscribe_new_heads(&self) -> BoxStream<'static, NodeBlock>;

    /// A stream of pending transaction hashes.
    fn subscribe_pending_tx_hashes(&self) -> BoxStream<'static, String>;

    async fn block_by_number(&self, number: u64) -> Result<Option<NodeBlock>, NodeError>;
    async fn block_by_hash(&self, hash: &str) -> Result<Option<NodeBlock>, NodeError>;
    async fn transaction_by_hash(
        &self,
        hash: &str,
    ) -> Result<Option<(NodeTransaction, bool)>, NodeError>;
    async fn transaction_receipt(&self, hash: &str) -> Result<Option<NodeReceipt>, NodeError>;
    async fn logs_in_range(&self, from_block: u64, to_block: u64) -> Result<Vec<NodeLog>, NodeError>;
    async fn peer_count(&self) -> Result<u64, NodeError>;
    async fn current_block_number(&self) -> Result<u64, NodeError>;
    /// Addresses of the currently active validator set, as reported by the
    /// QBFT validator-set RPC extension.
    async fn validator_addresses(&self, block_number: u64) -> Result<Vec<String>, NodeError>;
    /// Deployed bytecode at `address` for the latest block. Empty means the
    /// address has no code and is an EOA.
    async fn code_at(&self, address: &str) -> Result<Vec<u8>, NodeError>;
    /// Node sync status, as reported by `eth_syncing`.
    async fn sync_status(&self) -> Result<NodeSyncStatus, NodeError>;
}
