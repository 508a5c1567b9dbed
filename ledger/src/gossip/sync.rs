//! Longest-chain synchronization (spec.md §4.9): at startup, and whenever
//! `/block` rejects a gossiped block with an index gap, query every
//! peer's `/info`, pull the tallest one's `/chain`, and replay blocks
//! from `local_height + 1` onward.

use tracing::{info, warn};

use crate::store::Store;
use crate::validation::validate_block_linkage;

use super::client::GossipClient;

/// Result of one `synchronize_chain` attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// No peer reported a height greater than ours; nothing to do.
    UpToDate { height: u64 },
    /// Replayed `committed` blocks from `peer`, reaching `height`.
    Synced { peer: String, committed: u64, height: u64 },
    /// A peer was ahead but replay stopped partway through, per §4.9
    /// "stop on first failure and log".
    Failed { peer: String, committed: u64, reason: String },
}

/// Runs one synchronization pass against every peer in `client`.
pub async fn synchronize_chain(store: &Store, client: &GossipClient) -> SyncOutcome {
    let local_height = match store.last_block() {
        Ok(Some(block)) => block.index,
        Ok(None) => 0,
        Err(err) => {
            warn!(error = %err, "failed to read local tip before sync");
            return SyncOutcome::Failed { peer: String::new(), committed: 0, reason: err.to_string() };
        }
    };

    let mut tallest: Option<(String, url::Url, u64)> = None;
    for (name, base_url) in client.peers() {
        match client.fetch_info(base_url).await {
            Ok(info) if info.height > local_height => {
                let is_taller = tallest.as_ref().map(|(_, _, h)| info.height > *h).unwrap_or(true);
                if is_taller {
                    tallest = Some((name.clone(), base_url.clone(), info.height));
                }
            }
            Ok(_) => {}
            Err(err) => {
                warn!(peer = %name, error = %err, "failed to query peer /info during sync");
            }
        }
    }

    let Some((peer_name, peer_url, peer_height)) = tallest else {
        return SyncOutcome::UpToDate { height: local_height };
    };

    info!(peer = %peer_name, peer_height, local_height, "syncing from tallest known peer");

    let chain = match client.fetch_chain(&peer_url).await {
        Ok(chain) => chain,
        Err(err) => {
            warn!(peer = %peer_name, error = %err, "failed to download /chain during sync");
            return SyncOutcome::Failed { peer: peer_name, committed: 0, reason: err.to_string() };
        }
    };

    let mut committed = 0u64;
    for block in chain.into_iter().filter(|b| b.index > local_height) {
        let last = match store.last_block() {
            Ok(last) => last,
            Err(err) => {
                return SyncOutcome::Failed { peer: peer_name, committed, reason: err.to_string() };
            }
        };

        if let Err(err) = validate_block_linkage(&block, last.as_ref()) {
            warn!(peer = %peer_name, index = block.index, error = %err, "sync stopped: block failed linkage validation");
            return SyncOutcome::Failed { peer: peer_name, committed, reason: err.to_string() };
        }

        if let Err(err) = store.commit_block(&block) {
            warn!(peer = %peer_name, index = block.index, error = %err, "sync stopped: failed to commit block");
            return SyncOutcome::Failed { peer: peer_name, committed, reason: err.to_string() };
        }

        committed += 1;
    }

    SyncOutcome::Synced { peer: peer_name, committed, height: local_height + committed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gossip::{GossipConfig, NodeInfo};
    use crate::types::{Block, GENESIS_PREVIOUS_HASH};
    use std::collections::HashMap;

    #[tokio::test]
    async fn up_to_date_when_no_peers_configured() {
        let store = Store::open_in_memory().unwrap();
        let genesis = Block::finalize(1, 1.0, GENESIS_PREVIOUS_HASH.to_string(), "A".into(), vec![]);
        store.commit_block(&genesis).unwrap();

        let client = GossipClient::new(HashMap::new(), GossipConfig::default());
        let outcome = synchronize_chain(&store, &client).await;
        assert_eq!(outcome, SyncOutcome::UpToDate { height: 1 });
    }

    #[tokio::test]
    async fn up_to_date_at_genesis_with_no_blocks() {
        let store = Store::open_in_memory().unwrap();
        let client = GossipClient::new(HashMap::new(), GossipConfig::default());
        let outcome = synchronize_chain(&store, &client).await;
        assert_eq!(outcome, SyncOutcome::UpToDate { height: 0 });
    }

    /// Builds `n` contiguously linked, empty-transaction blocks starting
    /// at genesis, as a stand-in for a peer's committed chain.
    fn build_chain(n: u64, validator: &str) -> Vec<Block> {
        let mut blocks = Vec::with_capacity(n as usize);
        let mut previous_hash = GENESIS_PREVIOUS_HASH.to_string();
        for index in 1..=n {
            let block = Block::finalize(index, index as f64, previous_hash.clone(), validator.to_string(), vec![]);
            previous_hash = block.hash.clone();
            blocks.push(block);
        }
        blocks
    }

    /// A bare `hyper` server (the same stack `metrics.rs` uses) serving a
    /// fixed chain over `/info` and `/chain`, standing in for a real peer
    /// node during sync tests.
    async fn spawn_mock_peer(chain: Vec<Block>) -> url::Url {
        use bytes::Bytes;
        use http_body_util::Full;
        use hyper::body::Incoming;
        use hyper::server::conn::http1;
        use hyper::service::service_fn;
        use hyper::{Request, Response};
        use hyper_util::rt::TokioIo;
        use std::sync::Arc as StdArc;
        use tokio::net::TcpListener;

        let chain = StdArc::new(chain);
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock peer listener");
        let addr = listener.local_addr().expect("mock peer local addr");

        tokio::spawn(async move {
            loop {
                let (stream, _) = match listener.accept().await {
                    Ok(pair) => pair,
                    Err(_) => return,
                };
                let io = TokioIo::new(stream);
                let chain = chain.clone();

                tokio::spawn(async move {
                    let svc = service_fn(move |req: Request<Incoming>| {
                        let chain = chain.clone();
                        async move {
                            let tip = chain.last();
                            let body = match req.uri().path() {
                                "/info" => {
                                    let info = NodeInfo {
                                        node_name: "peer".to_string(),
                                        height: tip.map(|b| b.index).unwrap_or(0),
                                        last_hash: tip
                                            .map(|b| b.hash.clone())
                                            .unwrap_or_else(|| GENESIS_PREVIOUS_HASH.to_string()),
                                    };
                                    serde_json::to_vec(&info).unwrap()
                                }
                                "/chain" => serde_json::to_vec(chain.as_slice()).unwrap(),
                                _ => b"not found".to_vec(),
                            };
                            Ok::<_, std::convert::Infallible>(Response::new(Full::new(Bytes::from(body))))
                        }
                    });
                    let _ = http1::Builder::new().serve_connection(io, svc).await;
                });
            }
        });

        format!("http://{addr}").parse().expect("mock peer url")
    }

    #[tokio::test]
    async fn syncs_full_chain_from_tallest_peer() {
        let peer_chain = build_chain(7, "Y");
        let peer_url = spawn_mock_peer(peer_chain.clone()).await;

        let store = Store::open_in_memory().unwrap();
        let mut peers = HashMap::new();
        peers.insert("Y".to_string(), peer_url);
        let client = GossipClient::new(peers, GossipConfig::default());

        let outcome = synchronize_chain(&store, &client).await;
        assert_eq!(
            outcome,
            SyncOutcome::Synced { peer: "Y".to_string(), committed: 7, height: 7 }
        );

        let local_chain = store.all_blocks().unwrap();
        assert_eq!(local_chain.len(), 7);
        for (local, remote) in local_chain.iter().zip(peer_chain.iter()) {
            assert_eq!(local.hash, remote.hash);
        }
    }

    #[tokio::test]
    async fn gap_triggered_resync_catches_up_to_peer_height() {
        // Node X is at height 3; a peer Y is at height 5. A background
        // sync (as `routes::post_block` would trigger on an IndexGap
        // rejection, spec.md §4.10 scenario 6) must fetch blocks #4 and
        // #5 and converge X to height 5.
        let peer_chain = build_chain(5, "Y");
        let peer_url = spawn_mock_peer(peer_chain.clone()).await;

        let store = Store::open_in_memory().unwrap();
        for block in &peer_chain[..3] {
            store.commit_block(block).unwrap();
        }
        assert_eq!(store.last_block().unwrap().unwrap().index, 3);

        let mut peers = HashMap::new();
        peers.insert("Y".to_string(), peer_url);
        let client = GossipClient::new(peers, GossipConfig::default());

        let outcome = synchronize_chain(&store, &client).await;
        assert_eq!(
            outcome,
            SyncOutcome::Synced { peer: "Y".to_string(), committed: 2, height: 5 }
        );
        assert_eq!(store.last_block().unwrap().unwrap().index, 5);
        assert_eq!(store.last_block().unwrap().unwrap().hash, peer_chain[4].hash);
    }
}
