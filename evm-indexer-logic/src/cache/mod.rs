//! Best-effort hot-path cache. Every method degrades to a logged miss on
//! error — the cache is never a hard dependency, and callers always have a
//! store read available as a fallback.

use std::time::Duration;

use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::CacheError;
use crate::metrics::CACHE_OPS_TOTAL;
use crate::settings::CacheSettings;

#[derive(Debug, Clone, Copy)]
pub enum TtlTier {
    Hot,
    Warm,
    Cold,
}

#[derive(Clone)]
pub struct Cache {
    conn: ConnectionManager,
    ttl_hot: Duration,
    ttl_warm: Duration,
    ttl_cold: Duration,
}

impl Cache {
    pub async fn connect(settings: &CacheSettings) -> anyhow::Result<Self> {
        let client = redis::Client::open(settings.url.as_str())?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self {
            conn,
            ttl_hot: settings.ttl_hot,
            ttl_warm: settings.ttl_warm,
            ttl_cold: settings.ttl_cold,
        })
    }

    fn ttl(&self, tier: TtlTier) -> Duration {
        match tier {
            TtlTier::Hot => self.ttl_hot,
            TtlTier::Warm => self.ttl_warm,
            TtlTier::Cold => self.ttl_cold,
        }
    }

    /// Returns `None` on any cache error (connection issue, decode
    /// failure) — logged at `warn`, never propagated.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    CACHE_OPS_TOTAL.with_label_values(&["get", "hit"]).inc();
                    Some(value)
                }
                Err(err) => {
                    CACHE_OPS_TOTAL.with_label_values(&["get", "decode_error"]).inc();
                    tracing::warn!(key, err = %err, "cache value failed to decode");
                    None
                }
            },
            Ok(None) => {
                CACHE_OPS_TOTAL.with_label_values(&["get", "miss"]).inc();
                None
            }
            Err(err) => {
                CACHE_OPS_TOTAL.with_label_values(&["get", "error"]).inc();
                tracing::warn!(key, err = %err, "cache get failed");
                None
            }
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T, tier: TtlTier) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(key, err = %err, "cache value failed to encode");
                return;
            }
        };
        let mut conn = self.conn.clone();
        let result: Result<(), redis::RedisError> = conn
            .set_ex(key, raw, self.ttl(tier).as_secs().max(1))
            .await;
        match result {
            Ok(()) => {
                CACHE_OPS_TOTAL.with_label_values(&["set", "ok"]).inc();
            }
            Err(err) => {
                CACHE_OPS_TOTAL.with_label_values(&["set", "error"]).inc();
                tracing::warn!(key, err = %err, "cache set failed");
            }
        }
    }

    pub async fn del(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }
}

pub mod keys {
    pub fn latest_block() -> String {
        "latest_block".to_owned()
    }

    pub fn block_summary(number: u64) -> String {
        format!("block:{number}")
    }

    pub fn tx_summary(hash: &str) -> String {
        format!("tx:{hash}")
    }

    pub fn contract_name(address: &str) -> String {
        format!("contract-name:{address}")
    }
}
