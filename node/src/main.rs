//! Node binary: the orchestrator tying together the store, the DPoS
//! forging loop, the gossip surface, and longest-chain sync (spec.md
//! §2 step 8, §5).

mod config;
mod keys;
mod routes;
mod state;
mod time;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio_util::sync::CancellationToken;

use ledger::{GossipClient, GossipConfig, MetricsRegistry, Store, run_prometheus_http_server, spawn_forger_loop, synchronize_chain};

use config::NodeConfig;
use state::{AppState, SharedState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "node=info,ledger=info".to_string()))
        .init();

    if let Err(err) = run().await {
        tracing::error!(error = %err, "fatal startup error");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let config = NodeConfig::from_env();

    match keys::load_private_key_hex(&config.private_key_path) {
        Ok(_) => {
            tracing::info!(path = %config.private_key_path.display(), "loaded node private key");
        }
        Err(err) => {
            tracing::warn!(
                path = %config.private_key_path.display(),
                error = %err,
                "no usable private key file found; this node only validates and forges, it does not sign its own transactions"
            );
        }
    }

    let metrics = Arc::new(
        MetricsRegistry::new().map_err(|e| format!("failed to initialize metrics registry: {e}"))?,
    );

    if config.ledger.metrics.enabled {
        let metrics_for_exporter = metrics.clone();
        let addr = config.ledger.metrics.listen_addr;
        tokio::spawn(async move {
            if let Err(err) = run_prometheus_http_server(metrics_for_exporter, addr).await {
                tracing::error!(error = %err, "metrics HTTP server error");
            }
        });
        tracing::info!(%addr, "metrics exporter listening");
    }

    let store = Arc::new(Store::open(&config.ledger.store.path).map_err(|e| {
        format!("failed to open store at {}: {e}", config.ledger.store.path.display())
    })?);

    let gossip = Arc::new(
        GossipClient::new(config.peers.clone(), GossipConfig::default()).with_metrics(metrics.clone()),
    );

    // Startup sync: pull any blocks we're missing from the tallest known
    // peer before joining forging/gossip (spec.md §4.9).
    {
        let store = store.clone();
        let gossip = gossip.clone();
        tokio::spawn(async move {
            let outcome = synchronize_chain(&store, &gossip).await;
            tracing::info!(?outcome, "startup sync finished");
        });
    }

    let forging_cancel = CancellationToken::new();
    let mut forged_blocks = spawn_forger_loop(
        store.clone(),
        config.ledger.consensus.clone(),
        config.node_name.clone(),
        forging_cancel.clone(),
    );

    // The forger never broadcasts itself (spec.md §9 "cycle between miner
    // and transport"); this task is the other end of that channel.
    {
        let gossip = gossip.clone();
        tokio::spawn(async move {
            while let Some(block) = forged_blocks.recv().await {
                gossip.broadcast_block(&block).await;
            }
        });
    }

    let app_state: SharedState = Arc::new(AppState {
        node_name: config.node_name.clone(),
        store: store.clone(),
        gossip: gossip.clone(),
        metrics: metrics.clone(),
    });

    let app = Router::new()
        .route("/info", get(routes::get_info))
        .route("/chain", get(routes::get_chain))
        .route("/transaction", post(routes::post_transaction))
        .route("/block", post(routes::post_block))
        .with_state(app_state);

    tracing::info!(addr = %config.http.listen_addr, node = %config.node_name, "node HTTP surface listening");

    let listener = tokio::net::TcpListener::bind(config.http.listen_addr)
        .await
        .map_err(|e| format!("failed to bind {}: {e}", config.http.listen_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(forging_cancel))
        .await
        .map_err(|e| format!("HTTP server error: {e}"))?;

    Ok(())
}

/// Waits for Ctrl-C, then cancels the forging loop so it stops cleanly
/// alongside the HTTP server (spec.md §5 "cooperatively cancellable on
/// process shutdown").
async fn shutdown_signal(forging_cancel: CancellationToken) {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
    forging_cancel.cancel();
}
