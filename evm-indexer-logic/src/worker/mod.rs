//! Worker-side consumption: one shared consume loop, specialized per queue
//! by handing it a `Handler` implementation. Generalized from the teacher's
//! "one task per bridge indexer" shape to "one task per queue".

pub mod account_handler;
pub mod block_handler;
pub mod event_handler;
pub mod pending_tx_handler;
pub mod transaction_handler;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::broker::BrokerClient;

/// What the consume loop should do with a delivery once a handler has run.
pub enum HandlerOutcome {
    Ack,
    NackRequeue,
    NackReject,
}

#[async_trait]
pub trait Handler: Send + Sync {
    /// The queue this handler consumes from.
    fn queue(&self) -> &'static str;

    /// Processes one delivery's raw JSON payload.
    async fn handle(&self, payload: &[u8]) -> HandlerOutcome;
}

/// Runs `handler`'s consume loop until `token` is cancelled. On a lost
/// consumer channel, backs off 5s and re-declares/re-consumes.
pub async fn run_consume_loop(
    broker: Arc<BrokerClient>,
    handler: Arc<dyn Handler>,
    token: CancellationToken,
) {
    let queue = handler.queue();
    while !token.is_cancelled() {
        let (tag, mut deliveries) = match broker.consume(queue).await {
            Ok(pair) => pair,
            Err(err) => {
                error!(queue, err = %err, "failed to start consuming, retrying in 5s");
                tokio::time::sleep(Duration::from_secs(5)).await;
                continue;
            }
        };

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    if let Err(err) = broker.cancel(&tag).await {
                        warn!(queue, err = %err, "failed to cancel consumer tag during shutdown");
                    }
                    return;
                }
                next = deliveries.next() => {
                    match next {
                        Some(Ok(delivery)) => {
                            let outcome = handler.handle(&delivery.data).await;
                            let ack_result = match outcome {
                                HandlerOutcome::Ack => delivery.ack().await,
                                HandlerOutcome::NackRequeue => delivery.nack_requeue().await,
                                HandlerOutcome::NackReject => delivery.nack_reject().await,
                            };
                            if let Err(err) = ack_result {
                                warn!(queue, err = %err, "failed to acknowledge delivery");
                            }
                        }
                        Some(Err(err)) => {
                            error!(queue, err = %err, "delivery stream error, reconnecting");
                            break;
                        }
                        None => {
                            warn!(queue, "consumer stream ended, reconnecting");
                            break;
                        }
                    }
                }
            }
        }

        if token.is_cancelled() {
            return;
        }
        tokio::time::sleep(Duration::from_secs(5)).await;
    }
}
