/// Counters applied once per `tx_hash` onto an account row.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountDeltas {
    pub transaction_count: i64,
    pub contract_interactions_count: i64,
}

/// Counters applied once per `tx_hash` onto a smart-contract row.
/// `unique_interactors` is not one of these: it is derived from a
/// per-(contract, sender) marker rather than supplied by the caller, since
/// it counts distinct senders rather than interactions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContractMetricDeltas {
    pub transactions: i64,
    pub gas_used: u64,
    pub value_transferred: u128,
    pub events: i64,
}
