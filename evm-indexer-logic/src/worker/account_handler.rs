use std::sync::Arc;

use async_trait::async_trait;
use evm_indexer_entity::sea_orm_active_enums::AccountType;
use tracing::{error, warn};

use crate::jobs::{AccountDiscoveredJob, QUEUE_ACCOUNT_DISCOVERED};
use crate::node::NodeClient;
use crate::store::{AccountDeltas, Store};

use super::{Handler, HandlerOutcome};

/// Creates missing account rows for addresses discovered via transaction
/// or event fan-out, with no delta applied — the transaction handler owns
/// the accumulative counters (see `transaction_handler`). `account_type`
/// is assigned from an on-chain code-size probe: empty bytecode is an EOA,
/// any bytecode makes it a contract.
pub struct AccountHandler<N: NodeClient> {
    node: Arc<N>,
    store: Store,
}

impl<N: NodeClient> AccountHandler<N> {
    pub fn new(node: Arc<N>, store: Store) -> Self {
        Self { node, store }
    }
}

#[async_trait]
impl<N: NodeClient> Handler for AccountHandler<N> {
    fn queue(&self) -> &'static str {
        QUEUE_ACCOUNT_DISCOVERED
    }

    async fn handle(&self, payload: &[u8]) -> HandlerOutcome {
        let job: AccountDiscoveredJob = match serde_json::from_slice(payload) {
            Ok(job) => job,
            Err(err) => {
                warn!(err = %err, "malformed account-discovered payload");
                return HandlerOutcome::NackReject;
            }
        };

        if job.address.is_empty() {
            return HandlerOutcome::NackReject;
        }

        let is_contract = match self.node.code_at(&job.address).await {
            Ok(code) => !code.is_empty(),
            Err(err) => {
                error!(err = %err, address = %job.address, "failed to probe account code, retrying");
                return HandlerOutcome::NackRequeue;
            }
        };
        let account_type = if is_contract { AccountType::SmartAccount } else { AccountType::Eoa };

        // A marker tx_hash scoped to discovery keeps this idempotent without
        // colliding with the transaction handler's per-tx_hash markers.
        let marker = format!("discovered:{}", job.address);
        if let Err(err) = self
            .store
            .account_upsert_and_increment(
                &job.address,
                account_type,
                is_contract,
                &marker,
                AccountDeltas::default(),
            )
            .await
        {
            error!(err = %err, address = %job.address, "failed to register discovered account");
            return HandlerOutcome::NackRequeue;
        }

        HandlerOutcome::Ack
    }
}
