use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, warn};

use crate::broker::BrokerClient;
use crate::enrichment::event_signatures::identify_event;
use crate::jobs::{EventDiscoveredJob, EventProcessedEvent, QUEUE_EVENT_DISCOVERED, QUEUE_EVENT_PROCESSED};
use crate::node::NodeLog;
use crate::store::{DecodedEvent, Store};

use super::{Handler, HandlerOutcome};

pub struct EventHandler {
    store: Store,
    broker: Arc<BrokerClient>,
}

impl EventHandler {
    pub fn new(store: Store, broker: Arc<BrokerClient>) -> Self {
        Self { store, broker }
    }
}

#[async_trait]
impl Handler for EventHandler {
    fn queue(&self) -> &'static str {
        QUEUE_EVENT_DISCOVERED
    }

    async fn handle(&self, payload: &[u8]) -> HandlerOutcome {
        let job: EventDiscoveredJob = match serde_json::from_slice(payload) {
            Ok(job) => job,
            Err(err) => {
                warn!(err = %err, "malformed event-discovered payload");
                return HandlerOutcome::NackReject;
            }
        };

        match self.store.event_exists(&job.id).await {
            Ok(true) => return HandlerOutcome::Ack,
            Ok(false) => {}
            Err(err) => {
                error!(err = %err, id = %job.id, "store lookup failed");
                return HandlerOutcome::NackRequeue;
            }
        }

        let identified = identify_event(&job.topics, &job.data);
        let decoded = DecodedEvent {
            decoded_data: identified.as_ref().map(|(_, data)| data.clone()),
            event_name: identified.as_ref().map(|(sig, _)| sig.name.to_owned()),
            event_signature: job.topics.first().cloned(),
            timestamp: None,
        };

        let contract_name = self
            .store
            .contract_name_by_address(&job.contract_address)
            .await
            .ok()
            .flatten();

        let log = NodeLog {
            address: job.contract_address.clone(),
            topics: job.topics.clone(),
            data: job.data.clone(),
            block_hash: job.block_hash.clone(),
            block_number: job.block_number,
            transaction_hash: job.tx_hash.clone(),
            transaction_index: job.transaction_index,
            log_index: job.log_index,
            removed: job.removed,
        };

        if let Err(err) = self.store.event_upsert(&log, decoded.clone()).await {
            error!(err = %err, id = %job.id, "failed to upsert event");
            return HandlerOutcome::NackRequeue;
        }

        let event = EventProcessedEvent {
            id: job.id.clone(),
            contract_address: job.contract_address.clone(),
            contract_name,
            event_name: decoded.event_name,
            decoded_data: decoded.decoded_data,
        };
        if let Ok(payload) = serde_json::to_vec(&event) {
            if let Err(err) = self.broker.publish(QUEUE_EVENT_PROCESSED, &payload).await {
                error!(err = %err, "failed to publish event-processed");
            }
        }

        HandlerOutcome::Ack
    }
}
