//! Durable-queue broker client: idempotent queue declaration, persistent
//! publish with retry, manual-ack consumption under a unique consumer tag,
//! and reconnect-with-backoff when the connection drops.

mod consumer_tag;

pub use consumer_tag::generate_consumer_tag;

use std::sync::Arc;
use std::time::Duration;

use lapin::{
    BasicProperties, Channel, Connection, ConnectionProperties,
    options::{
        BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicPublishOptions,
        BasicQosOptions, QueueDeclareOptions,
    },
    types::FieldTable,
};
use parking_lot::RwLock;
use tokio::sync::Mutex;

use crate::error::BrokerError;
use crate::jobs::ALL_QUEUES;
use crate::metrics::{BROKER_RECONNECTS_TOTAL, JOBS_PUBLISHED_TOTAL};
use crate::settings::BrokerSettings;

/// A single delivered message, carrying the pieces a handler needs to ack,
/// nack-with-requeue, or nack-without-requeue.
pub struct Delivery {
    pub data: Vec<u8>,
    channel: Channel,
    delivery_tag: u64,
}

impl Delivery {
    pub async fn ack(&self) -> Result<(), BrokerError> {
        self.channel
            .basic_ack(self.delivery_tag, BasicAckOptions::default())
            .await?;
        Ok(())
    }

    pub async fn nack_requeue(&self) -> Result<(), BrokerError> {
        self.channel
            .basic_nack(
                self.delivery_tag,
                BasicNackOptions {
                    requeue: true,
                    ..Default::default()
                },
            )
            .await?;
        Ok(())
    }

    pub async fn nack_reject(&self) -> Result<(), BrokerError> {
        self.channel
            .basic_nack(
                self.delivery_tag,
                BasicNackOptions {
                    requeue: false,
                    ..Default::default()
                },
            )
            .await?;
        Ok(())
    }
}

/// Reconnectable AMQP client: holds the live connection/channel behind a
/// lock so a dropped connection is transparently re-established on next
/// use, generalized from the multi-node provider-pool's reconnect loop to a
/// single always-durable broker connection.
pub struct BrokerClient {
    settings: BrokerSettings,
    conn: RwLock<Option<Connection>>,
    connect_lock: Mutex<()>,
}

impl BrokerClient {
    pub fn new(settings: BrokerSettings) -> Arc<Self> {
        Arc::new(Self {
            settings,
            conn: RwLock::new(None),
            connect_lock: Mutex::new(()),
        })
    }

    async fn ensure_connected(&self) -> Result<Connection, BrokerError> {
        if let Some(conn) = self.conn.read().clone() {
            if conn.status().connected() {
                return Ok(conn);
            }
        }

        let _guard = self.connect_lock.lock().await;
        if let Some(conn) = self.conn.read().clone() {
            if conn.status().connected() {
                return Ok(conn);
            }
        }

        let mut delay = self.settings.reconnect_base_delay;
        loop {
            match Connection::connect(&self.settings.url, ConnectionProperties::default()).await {
                Ok(conn) => {
                    BROKER_RECONNECTS_TOTAL.with_label_values(&["connect"]).inc();
                    *self.conn.write() = Some(conn.clone());
                    self.declare_all_queues(&conn).await?;
                    return Ok(conn);
                }
                Err(err) => {
                    tracing::error!(err = %err, ?delay, "broker connect failed, backing off");
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(self.settings.reconnect_max_delay);
                }
            }
        }
    }

    async fn declare_all_queues(&self, conn: &Connection) -> Result<(), BrokerError> {
        let channel = conn.create_channel().await?;
        for queue in ALL_QUEUES {
            declare_durable_queue(&channel, queue).await?;
        }
        Ok(())
    }

    async fn channel(&self) -> Result<Channel, BrokerError> {
        let conn = self.ensure_connected().await?;
        Ok(conn.create_channel().await?)
    }

    /// Publishes a persistent message, retrying across reconnects up to
    /// `publish_retries` times.
    pub async fn publish(&self, queue: &str, payload: &[u8]) -> Result<(), BrokerError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = self.try_publish(queue, payload).await;
            match result {
                Ok(()) => {
                    JOBS_PUBLISHED_TOTAL.with_label_values(&[queue]).inc();
                    return Ok(());
                }
                Err(err) if err.is_retryable() && attempt < self.settings.publish_retries => {
                    tracing::warn!(queue, attempt, err = %err, "publish failed, retrying");
                    *self.conn.write() = None;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn try_publish(&self, queue: &str, payload: &[u8]) -> Result<(), BrokerError> {
        let channel = self.channel().await?;
        declare_durable_queue(&channel, queue).await?;
        channel
            .basic_publish(
                "",
                queue,
                BasicPublishOptions::default(),
                payload,
                BasicProperties::default().with_delivery_mode(2),
            )
            .await?
            .await?;
        Ok(())
    }

    /// Declares `queue` durable and begins consuming with a freshly
    /// generated unique consumer tag. Returns the tag alongside the
    /// delivery stream so the caller can cancel it on shutdown.
    pub async fn consume(
        &self,
        queue: &str,
    ) -> Result<
        (
            String,
            impl futures::Stream<Item = Result<Delivery, BrokerError>>,
        ),
        BrokerError,
    > {
        let channel = self.channel().await?;
        declare_durable_queue(&channel, queue).await?;
        channel
            .basic_qos(self.settings.prefetch, BasicQosOptions::default())
            .await?;

        let tag = generate_consumer_tag(self.settings.consumer_tag_prefix.as_deref());
        let consumer = match channel
            .basic_consume(
                queue,
                &tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
        {
            Ok(consumer) => consumer,
            Err(_) => {
                // Tag collision or transient failure: regenerate and retry once.
                let retry_tag =
                    generate_consumer_tag(self.settings.consumer_tag_prefix.as_deref());
                let consumer = channel
                    .basic_consume(
                        queue,
                        &retry_tag,
                        BasicConsumeOptions::default(),
                        FieldTable::default(),
                    )
                    .await?;
                return Ok((retry_tag, wrap_consumer(channel, consumer)));
            }
        };

        Ok((tag, wrap_consumer(channel, consumer)))
    }

    /// Cancels `consumer_tag` on `queue`'s channel. Call during graceful
    /// shutdown before closing the channel/connection.
    pub async fn cancel(&self, consumer_tag: &str) -> Result<(), BrokerError> {
        let channel = self.channel().await?;
        channel
            .basic_cancel(consumer_tag, Default::default())
            .await?;
        Ok(())
    }

    pub async fn close(&self) -> Result<(), BrokerError> {
        if let Some(conn) = self.conn.write().take() {
            conn.close(200, "graceful shutdown").await?;
        }
        Ok(())
    }
}

fn wrap_consumer(
    channel: Channel,
    consumer: lapin::Consumer,
) -> impl futures::Stream<Item = Result<Delivery, BrokerError>> {
    use futures::StreamExt;
    consumer.map(move |delivery| {
        let delivery = delivery?;
        Ok(Delivery {
            data: delivery.data,
            channel: channel.clone(),
            delivery_tag: delivery.delivery_tag,
        })
    })
}

async fn declare_durable_queue(channel: &Channel, queue: &str) -> Result<(), BrokerError> {
    channel
        .queue_declare(
            queue,
            QueueDeclareOptions {
                durable: true,
                auto_delete: false,
                exclusive: false,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_match_the_documented_backoff() {
        let settings = BrokerSettings::default();
        assert_eq!(settings.reconnect_base_delay, Duration::from_secs(1));
        assert_eq!(settings.reconnect_max_delay, Duration::from_secs(30));
    }
}
