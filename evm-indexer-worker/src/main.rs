mod settings;

use std::sync::Arc;

use blockscout_service_launcher::{database, launcher::ConfigSettings, tracing as bs_tracing};
use evm_indexer_logic::broker::BrokerClient;
use evm_indexer_logic::cache::Cache;
use evm_indexer_logic::metrics as indexer_metrics;
use evm_indexer_logic::node::{AlloyNodeClient, NodeBlock};
use evm_indexer_logic::store::{BatchBuffer, Store};
use evm_indexer_logic::worker::account_handler::AccountHandler;
use evm_indexer_logic::worker::block_handler::BlockHandler;
use evm_indexer_logic::worker::event_handler::EventHandler;
use evm_indexer_logic::worker::pending_tx_handler::PendingTxHandler;
use evm_indexer_logic::worker::transaction_handler::TransactionHandler;
use evm_indexer_logic::worker::{run_consume_loop, Handler};
use evm_indexer_migration::Migrator;
use settings::Settings;
use tokio_util::sync::CancellationToken;

const SERVICE_NAME: &str = "evm_indexer_worker";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::build().expect("failed to read config");
    bs_tracing::init_logs(SERVICE_NAME, &settings.tracing, &settings.jaeger)?;

    let token = CancellationToken::new();
    let metrics_bind_addr = settings.metrics_bind_addr.clone();
    let pool_size = settings.worker_pool.worker_pool_size.max(1);

    let db_connection = database::initialize_postgres::<Migrator>(&settings.database).await?;
    let store = Store::new(db_connection);
    let cache = Cache::connect(&settings.cache).await?;
    let node = Arc::new(AlloyNodeClient::connect(settings.node).await?);
    let broker = BrokerClient::new(settings.broker);

    let batch = Arc::new(BatchBuffer::<NodeBlock>::new(
        "blocks",
        settings.batch.size,
        settings.batch.flush_interval,
    ));
    let batch_store = store.clone();
    let batch_token = token.clone();
    let batch_handle = tokio::spawn(batch.clone().run_timer(batch_token, move |items| {
        let store = batch_store.clone();
        async move {
            for block in items {
                if let Err(err) = store.block_upsert(&block).await {
                    tracing::error!(err = %err, "failed to flush block batch on timer");
                }
            }
        }
    }));

    let handlers: Vec<Arc<dyn Handler>> = vec![
        Arc::new(BlockHandler::new(
            node.clone(),
            store.clone(),
            cache.clone(),
            broker.clone(),
            batch.clone(),
        )),
        Arc::new(TransactionHandler::new(
            node.clone(),
            store.clone(),
            cache.clone(),
            broker.clone(),
        )),
        Arc::new(EventHandler::new(store.clone(), broker.clone())),
        Arc::new(AccountHandler::new(node.clone(), store.clone())),
        Arc::new(PendingTxHandler::new(node.clone(), store.clone())),
    ];

    let mut consume_handles = Vec::new();
    for handler in handlers {
        for _ in 0..pool_size {
            let broker = broker.clone();
            let handler = handler.clone();
            let token = token.clone();
            consume_handles.push(tokio::spawn(run_consume_loop(broker, handler, token)));
        }
    }

    let metrics_token = token.clone();
    let metrics_handle =
        tokio::spawn(async move { indexer_metrics::serve(&metrics_bind_addr, metrics_token).await });

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received, stopping worker");
    token.cancel();

    for handle in consume_handles {
        let _ = handle.await;
    }
    let _ = batch_handle.await;
    let _ = metrics_handle.await;
    let _ = broker.close().await;

    Ok(())
}
