//! Outbound gossip: broadcasting transactions/blocks to peers and
//! fetching `/info` and `/chain` for sync (spec.md §4.8/§4.9).

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use url::Url;

use crate::metrics::MetricsRegistry;
use crate::types::{Block, Transaction};

use super::config::GossipConfig;

/// Node-name -> base URL map, the same shape the original's hardcoded
/// `p2p.py` peer table takes, made configurable.
pub type PeerSet = HashMap<String, Url>;

/// Errors talking to a peer over HTTP. Always recovered from locally
/// (§7 `TransportError`): never surfaced to an end user, only logged.
#[derive(Debug, Error)]
pub enum GossipError {
    #[error("request to peer failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("peer response was not valid JSON: {0}")]
    Decode(String),
}

/// Wire shape of a `GET /info` response (spec.md §4.8/§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInfo {
    pub node_name: String,
    pub height: u64,
    pub last_hash: String,
}

/// Async HTTP client fanning transactions and blocks out to every
/// configured peer, and pulling `/info`/`/chain` for longest-chain sync.
///
/// Broadcast is best-effort: per-peer failures are logged via
/// `tracing::warn!` and otherwise ignored (§4.8's "Failures to individual
/// peers are logged and ignored; delivery is eventually completed by
/// peer-to-peer re-gossip").
pub struct GossipClient {
    http: reqwest::Client,
    peers: PeerSet,
    config: GossipConfig,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl GossipClient {
    pub fn new(peers: PeerSet, config: GossipConfig) -> Self {
        GossipClient {
            http: reqwest::Client::new(),
            peers,
            config,
            metrics: None,
        }
    }

    /// Attaches a metrics registry so broadcast failures are counted in
    /// `gossip_broadcast_failures_total`.
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn peers(&self) -> &PeerSet {
        &self.peers
    }

    fn record_broadcast_failure(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.ledger.gossip_broadcast_failures.inc();
        }
    }

    /// Fans `POST /transaction` out to every peer concurrently.
    pub async fn broadcast_transaction(&self, tx: &Transaction) {
        let requests = self.peers.iter().map(|(name, base_url)| {
            let url = join_path(base_url, "transaction");
            let http = self.http.clone();
            let timeout = self.config.transaction_timeout;
            let body = tx.clone();
            let name = name.clone();
            async move {
                let result = http.post(url).timeout(timeout).json(&body).send().await;
                (name, result)
            }
        });

        for (name, result) in join_all(requests).await {
            if let Err(err) = result.and_then(|resp| resp.error_for_status()) {
                warn!(peer = %name, error = %err, "failed to broadcast transaction to peer");
                self.record_broadcast_failure();
            }
        }
    }

    /// Fans `POST /block` out to every peer concurrently.
    pub async fn broadcast_block(&self, block: &Block) {
        let requests = self.peers.iter().map(|(name, base_url)| {
            let url = join_path(base_url, "block");
            let http = self.http.clone();
            let timeout = self.config.block_timeout;
            let body = block.clone();
            let name = name.clone();
            async move {
                let result = http.post(url).timeout(timeout).json(&body).send().await;
                (name, result)
            }
        });

        for (name, result) in join_all(requests).await {
            if let Err(err) = result.and_then(|resp| resp.error_for_status()) {
                warn!(peer = %name, error = %err, "failed to broadcast block to peer");
                self.record_broadcast_failure();
            }
        }
    }

    /// `GET /info` on a single peer.
    pub async fn fetch_info(&self, base_url: &Url) -> Result<NodeInfo, GossipError> {
        let url = join_path(base_url, "info");
        let resp = self
            .http
            .get(url)
            .timeout(self.config.info_timeout)
            .send()
            .await?
            .error_for_status()?;
        resp.json::<NodeInfo>()
            .await
            .map_err(|e| GossipError::Decode(e.to_string()))
    }

    /// `GET /chain` on a single peer.
    pub async fn fetch_chain(&self, base_url: &Url) -> Result<Vec<Block>, GossipError> {
        let url = join_path(base_url, "chain");
        let resp = self
            .http
            .get(url)
            .timeout(self.config.chain_timeout)
            .send()
            .await?
            .error_for_status()?;
        resp.json::<Vec<Block>>()
            .await
            .map_err(|e| GossipError::Decode(e.to_string()))
    }
}

fn join_path(base_url: &Url, path: &str) -> Url {
    base_url
        .join(path)
        .unwrap_or_else(|_| base_url.clone())
}
