mod settings;

use std::sync::Arc;

use blockscout_service_launcher::{database, launcher::ConfigSettings, tracing as bs_tracing};
use evm_indexer_logic::broker::BrokerClient;
use evm_indexer_logic::indexer::Indexer;
use evm_indexer_logic::metrics as indexer_metrics;
use evm_indexer_logic::node::AlloyNodeClient;
use evm_indexer_logic::store::Store;
use evm_indexer_migration::Migrator;
use settings::Settings;
use tokio_util::sync::CancellationToken;

const SERVICE_NAME: &str = "evm_indexer_node";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::build().expect("failed to read config");
    bs_tracing::init_logs(SERVICE_NAME, &settings.tracing, &settings.jaeger)?;

    let token = CancellationToken::new();

    let metrics_bind_addr = settings.metrics_bind_addr.clone();

    let db_connection = database::initialize_postgres::<Migrator>(&settings.database).await?;
    let store = Store::new(db_connection);

    let node = Arc::new(AlloyNodeClient::connect(settings.node).await?);
    let broker = BrokerClient::new(settings.broker);

    let indexer = Arc::new(Indexer::new(
        node,
        broker,
        store,
        settings.validator_monitor,
        settings.starting_block.starting_block,
    ));
    indexer.start().await?;

    let metrics_token = token.clone();
    let metrics_handle =
        tokio::spawn(async move { indexer_metrics::serve(&metrics_bind_addr, metrics_token).await });

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received, stopping indexer");
    token.cancel();
    indexer.stop().await;
    let _ = metrics_handle.await;

    Ok(())
}
