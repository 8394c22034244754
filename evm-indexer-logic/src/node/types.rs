//! Node-facing DTOs, decoupled from alloy's wire types so the store and
//! handler layers don't depend on the RPC client's type choices.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeBlock {
    pub hash: String,
    pub number: u64,
    pub parent_hash: String,
    pub timestamp: i64,
    pub proposer: Option<String>,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub base_fee_per_gas: Option<String>,
    pub transaction_hashes: Vec<String>,
    pub size: Option<u64>,
    pub extra_data: Option<String>,
    pub state_root: Option<String>,
    pub receipts_root: Option<String>,
    pub transactions_root: Option<String>,
    pub nonce: Option<String>,
    pub mix_hash: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NodeTransactionType {
    Legacy,
    AccessList,
    DynamicFee,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeTransaction {
    pub hash: String,
    pub block_hash: Option<String>,
    pub block_number: Option<u64>,
    pub transaction_index: Option<u32>,
    pub from: String,
    pub to: Option<String>,
    pub value: String,
    pub gas_limit: u64,
    pub gas_price: Option<String>,
    pub max_fee_per_gas: Option<String>,
    pub max_priority_fee_per_gas: Option<String>,
    pub nonce: u64,
    pub input: String,
    pub transaction_type: NodeTransactionType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeReceipt {
    pub transaction_hash: String,
    pub status: bool,
    pub gas_used: u64,
    pub contract_address: Option<String>,
    pub logs_bloom: String,
    pub logs: Vec<NodeLog>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeSyncStatus {
    pub is_syncing: bool,
    pub current_block: u64,
    pub highest_block: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeLog {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
    pub block_hash: String,
    pub block_number: u64,
    pub transaction_hash: String,
    pub transaction_index: u32,
    pub log_index: u32,
    pub removed: bool,
}
