use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

#[serde_as]
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct NodeClientSettings {
    pub rpc_url: String,
    #[serde(default)]
    pub ws_url: Option<String>,
    pub chain_id: u64,
    #[serde(default = "default_poll_interval")]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub poll_interval: Duration,
    #[serde(default = "default_call_timeout")]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub call_timeout: Duration,
    #[serde(default = "default_call_retries")]
    pub call_retries: u32,
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_call_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_call_retries() -> u32 {
    3
}

impl Default for NodeClientSettings {
    fn default() -> Self {
        Self {
            rpc_url: String::new(),
            ws_url: None,
            chain_id: 0,
            poll_interval: default_poll_interval(),
            call_timeout: default_call_timeout(),
            call_retries: default_call_retries(),
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct BrokerSettings {
    pub url: String,
    #[serde(default = "default_prefetch")]
    pub prefetch: u16,
    #[serde(default = "default_publish_timeout")]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub publish_timeout: Duration,
    #[serde(default = "default_publish_retries")]
    pub publish_retries: u32,
    #[serde(default = "default_reconnect_base_delay")]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub reconnect_base_delay: Duration,
    #[serde(default = "default_reconnect_max_delay")]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub reconnect_max_delay: Duration,
    #[serde(default)]
    pub consumer_tag_prefix: Option<String>,
}

fn default_prefetch() -> u16 {
    32
}

fn default_publish_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_publish_retries() -> u32 {
    5
}

fn default_reconnect_base_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_reconnect_max_delay() -> Duration {
    Duration::from_secs(30)
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            prefetch: default_prefetch(),
            publish_timeout: default_publish_timeout(),
            publish_retries: default_publish_retries(),
            reconnect_base_delay: default_reconnect_base_delay(),
            reconnect_max_delay: default_reconnect_max_delay(),
            consumer_tag_prefix: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct StoreSettings {
    pub dsn: String,
    #[serde(default = "default_max_open_conn")]
    pub max_open_conn: u32,
    #[serde(default = "default_max_idle_conn")]
    pub max_idle_conn: u32,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_max_open_conn() -> u32 {
    20
}

fn default_max_idle_conn() -> u32 {
    5
}

fn default_batch_size() -> usize {
    25
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            dsn: String::new(),
            max_open_conn: default_max_open_conn(),
            max_idle_conn: default_max_idle_conn(),
            batch_size: default_batch_size(),
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CacheSettings {
    pub url: String,
    #[serde(default = "default_ttl_hot")]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub ttl_hot: Duration,
    #[serde(default = "default_ttl_warm")]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub ttl_warm: Duration,
    #[serde(default = "default_ttl_cold")]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub ttl_cold: Duration,
}

fn default_ttl_hot() -> Duration {
    Duration::from_secs(30)
}

fn default_ttl_warm() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_ttl_cold() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            ttl_hot: default_ttl_hot(),
            ttl_warm: default_ttl_warm(),
            ttl_cold: default_ttl_cold(),
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct BatchSettings {
    #[serde(default = "default_batch_size")]
    pub size: usize,
    #[serde(default = "default_flush_interval")]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub flush_interval: Duration,
}

fn default_flush_interval() -> Duration {
    Duration::from_secs(5)
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            size: default_batch_size(),
            flush_interval: default_flush_interval(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorMonitorSettings {
    #[serde(default = "default_active_window")]
    pub active_window_blocks: u64,
    #[serde(default = "default_poll_interval_blocks")]
    pub poll_interval_blocks: u64,
}

fn default_active_window() -> u64 {
    1000
}

fn default_poll_interval_blocks() -> u64 {
    50
}

impl Default for ValidatorMonitorSettings {
    fn default() -> Self {
        Self {
            active_window_blocks: default_active_window(),
            poll_interval_blocks: default_poll_interval_blocks(),
        }
    }
}

/// Resume-position override. When set, the indexer starts from this block
/// instead of the persisted checkpoint (used for backfills / recovery).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct StartingBlockSettings {
    pub starting_block: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct WorkerPoolSettings {
    #[serde(default = "default_worker_pool_size")]
    pub worker_pool_size: usize,
}

fn default_worker_pool_size() -> usize {
    4
}

impl Default for WorkerPoolSettings {
    fn default() -> Self {
        Self {
            worker_pool_size: default_worker_pool_size(),
        }
    }
}
