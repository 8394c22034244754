use blockscout_service_launcher::database::DatabaseSettings;
use blockscout_service_launcher::launcher::ConfigSettings;
use blockscout_service_launcher::tracing::{JaegerSettings, TracingSettings};
use evm_indexer_logic::settings::{
    BrokerSettings, NodeClientSettings, StartingBlockSettings, ValidatorMonitorSettings,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub node: NodeClientSettings,
    pub broker: BrokerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub validator_monitor: ValidatorMonitorSettings,
    #[serde(default)]
    pub starting_block: StartingBlockSettings,
    #[serde(default = "default_metrics_bind_addr")]
    pub metrics_bind_addr: String,
    #[serde(default)]
    pub tracing: TracingSettings,
    #[serde(default)]
    pub jaeger: JaegerSettings,
}

fn default_metrics_bind_addr() -> String {
    "0.0.0.0:9090".to_owned()
}

impl ConfigSettings for Settings {
    const SERVICE_NAME: &'static str = "EVM_INDEXER_NODE";
}
