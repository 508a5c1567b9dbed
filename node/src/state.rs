//! Shared application state handed to every `axum` request handler.

use std::sync::Arc;

use ledger::{GossipClient, MetricsRegistry, Store};

/// State shared across HTTP handlers and the background forger/sync
/// tasks: this node's identity, its store, its outbound gossip client,
/// and the metrics registry.
pub struct AppState {
    pub node_name: String,
    pub store: Arc<Store>,
    pub gossip: Arc<GossipClient>,
    pub metrics: Arc<MetricsRegistry>,
}

pub type SharedState = Arc<AppState>;
