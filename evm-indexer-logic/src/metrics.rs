use lazy_static::lazy_static;
use prometheus::{
    Encoder, GaugeVec, HistogramVec, IntCounterVec, register_gauge_vec, register_histogram_vec,
    register_int_counter_vec,
};

// Keep labels low-cardinality: queue name and outcome, not block/tx hashes.
lazy_static! {
    pub static ref INDEXER_CURSOR: GaugeVec = register_gauge_vec!(
        "evm_indexer_cursor_block_number",
        "highest block number whose ingest jobs have been durably enqueued",
        &["component"],
    )
    .unwrap();

    pub static ref JOBS_PUBLISHED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "evm_indexer_jobs_published_total",
        "jobs published onto a queue",
        &["queue"],
    )
    .unwrap();

    pub static ref JOBS_CONSUMED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "evm_indexer_jobs_consumed_total",
        "deliveries consumed from a queue, by outcome",
        &["queue", "outcome"],
    )
    .unwrap();

    pub static ref HANDLER_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "evm_indexer_handler_duration_seconds",
        "time spent processing one delivery, per handler",
        &["handler"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .unwrap();

    pub static ref NODE_CALL_RETRIES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "evm_indexer_node_call_retries_total",
        "node RPC calls retried, by method",
        &["method"],
    )
    .unwrap();

    pub static ref BROKER_RECONNECTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "evm_indexer_broker_reconnects_total",
        "broker connection re-establishments",
        &["reason"],
    )
    .unwrap();

    pub static ref CACHE_OPS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "evm_indexer_cache_ops_total",
        "cache operations, by kind and outcome",
        &["op", "outcome"],
    )
    .unwrap();

    pub static ref BATCH_FLUSH_ENTRIES: HistogramVec = register_histogram_vec!(
        "evm_indexer_batch_flush_entries",
        "entries flushed in a single batch-buffer flush",
        &["entity"],
        vec![0.0, 1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0]
    )
    .unwrap();
}

/// Serves the Prometheus text exposition format on `GET /metrics` until
/// `token` is cancelled. No router is pulled in for this — the indexer and
/// worker binaries carry no other HTTP surface, so one plain-text endpoint
/// isn't worth a web framework dependency.
pub async fn serve(bind_addr: &str, token: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(bind_addr, "metrics endpoint listening");

    loop {
        tokio::select! {
            _ = token.cancelled() => return Ok(()),
            accepted = listener.accept() => {
                let (mut socket, _) = match accepted {
                    Ok(pair) => pair,
                    Err(err) => {
                        tracing::warn!(err = %err, "metrics listener accept failed");
                        continue;
                    }
                };
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    // Discard the request line/headers; every response is the
                    // same text body regardless of path or method.
                    let _ = socket.read(&mut buf).await;

                    let families = prometheus::gather();
                    let mut body = Vec::new();
                    let encoder = prometheus::TextEncoder::new();
                    if encoder.encode(&families, &mut body).is_err() {
                        return;
                    }

                    let header = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        encoder.format_type(),
                        body.len()
                    );
                    let _ = socket.write_all(header.as_bytes()).await;
                    let _ = socket.write_all(&body).await;
                });
            }
        }
    }
}
