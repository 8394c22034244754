//! Wire payloads exchanged over the durable queues described in the external
//! interfaces. Every job is plain JSON; handlers validate required fields at
//! the deserialization boundary and reject anything that doesn't parse.

use serde::{Deserialize, Serialize};

pub const QUEUE_BLOCK_MINED: &str = "block-mined";
pub const QUEUE_TRANSACTION_MINED: &str = "transaction-mined";
pub const QUEUE_PENDING_TX: &str = "pending-tx";
pub const QUEUE_EVENT_DISCOVERED: &str = "event-discovered";
pub const QUEUE_ACCOUNT_DISCOVERED: &str = "account-discovered";
pub const QUEUE_BLOCK_PROCESSED: &str = "block-processed";
pub const QUEUE_TRANSACTION_PROCESSED: &str = "transaction-processed";
pub const QUEUE_EVENT_PROCESSED: &str = "event-processed";

/// All ingest + processed queues, declared durable at startup by both the
/// indexer and the worker so either side can come up first.
pub const ALL_QUEUES: &[&str] = &[
    QUEUE_BLOCK_MINED,
    QUEUE_TRANSACTION_MINED,
    QUEUE_PENDING_TX,
    QUEUE_EVENT_DISCOVERED,
    QUEUE_ACCOUNT_DISCOVERED,
    QUEUE_BLOCK_PROCESSED,
    QUEUE_TRANSACTION_PROCESSED,
    QUEUE_EVENT_PROCESSED,
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockMinedJob {
    pub number: u64,
    pub hash: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionMinedJob {
    pub hash: String,
    pub block_hash: String,
    pub block_number: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingTxJob {
    pub hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventDiscoveredJob {
    pub id: String,
    pub contract_address: String,
    pub tx_hash: String,
    pub block_number: u64,
    pub block_hash: String,
    pub log_index: u32,
    pub transaction_index: u32,
    pub topics: Vec<String>,
    pub data: String,
    pub removed: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DiscoveredVia {
    TransactionFrom,
    TransactionTo,
    ContractCreation,
    EventParticipant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountDiscoveredJob {
    pub address: String,
    pub discovered_via: DiscoveredVia,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockProcessedEvent {
    pub number: u64,
    pub hash: String,
    pub timestamp: i64,
    pub transaction_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionProcessedEvent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub hash: String,
    pub block_number: u64,
    pub from_address: String,
    pub to_address: Option<String>,
    pub value: String,
    pub gas_used: Option<i64>,
    pub status: String,
    pub timestamp: Option<i64>,
}

impl TransactionProcessedEvent {
    pub const KIND: &'static str = "transaction-processed";
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventProcessedEvent {
    pub id: String,
    pub contract_address: String,
    pub contract_name: Option<String>,
    pub event_name: Option<String>,
    pub decoded_data: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn block_mined_job_roundtrips_through_json() {
        let job = BlockMinedJob {
            number: 100,
            hash: "0xBB01".to_owned(),
            timestamp: 1_700_000_000,
        };
        let encoded = serde_json::to_string(&job).unwrap();
        let decoded: BlockMinedJob = serde_json::from_str(&encoded).unwrap();
        assert_eq!(job, decoded);
    }

    #[test]
    fn all_queues_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for q in ALL_QUEUES {
            assert!(seen.insert(*q), "duplicate queue name: {q}");
        }
    }
}
