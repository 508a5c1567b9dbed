//! Node-process configuration: the listen address, the peer table, and
//! the private-key file path. Generalizes spec.md §9's "implicit
//! globals" (`node_name`, `db_path`, the peers map that the original
//! read from module scope and the working directory) into an explicit
//! record passed to every component, mirroring the teacher's
//! `ApiConfig` (binary-specific) sitting alongside `ledger::LedgerConfig`
//! (library-specific).

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use url::Url;

use ledger::LedgerConfig;

/// Node-name -> base URL peer table (generalizes the hardcoded
/// `nodes/*/p2p.py` peer map from `original_source`).
pub type PeersConfig = HashMap<String, Url>;

/// Configuration for this node's HTTP gossip surface.
#[derive(Clone, Debug)]
pub struct HttpConfig {
    pub listen_addr: SocketAddr,
}

impl Default for HttpConfig {
    fn default() -> Self {
        let addr: SocketAddr = "0.0.0.0:8081"
            .parse()
            .expect("hard-coded API listen address should parse");
        HttpConfig { listen_addr: addr }
    }
}

/// Top-level configuration for a running node process: this node's
/// identity, where to find its private key, its HTTP surface, its peer
/// table, and the shared `ledger` configuration (store, consensus,
/// metrics).
#[derive(Clone, Debug)]
pub struct NodeConfig {
    /// This node's participant name, used as `block.validator` and
    /// matched against DPoS selection results.
    pub node_name: String,
    /// Path to a file holding a hex-encoded SECP256k1 private scalar.
    /// Provisioning that file is an external collaborator (spec.md §1);
    /// this process only reads it.
    pub private_key_path: PathBuf,
    pub http: HttpConfig,
    pub peers: PeersConfig,
    pub ledger: LedgerConfig,
}

impl NodeConfig {
    /// Builds configuration from defaults overridden by environment
    /// variables, the same hand-rolled `std::env::var` pattern the
    /// teacher uses rather than a config-file crate.
    ///
    /// `NODE_NAME`, `NODE_PRIVATE_KEY_PATH`, `NODE_LISTEN_ADDR`, and
    /// `NODE_PEERS` (a comma-separated `name=url` list, e.g.
    /// `"B=http://127.0.0.1:8082,C=http://127.0.0.1:8083"`) are read in
    /// addition to the `LEDGER_*` variables `LedgerConfig::from_env`
    /// already understands.
    pub fn from_env() -> NodeConfig {
        let node_name = std::env::var("NODE_NAME").unwrap_or_else(|_| "A".to_string());

        let private_key_path = std::env::var("NODE_PRIVATE_KEY_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("node.key"));

        let mut http = HttpConfig::default();
        if let Ok(addr) = std::env::var("NODE_LISTEN_ADDR") {
            if let Ok(parsed) = addr.parse() {
                http.listen_addr = parsed;
            }
        }

        let peers = std::env::var("NODE_PEERS")
            .map(|raw| parse_peers(&raw))
            .unwrap_or_default();

        NodeConfig {
            node_name,
            private_key_path,
            http,
            peers,
            ledger: LedgerConfig::from_env(),
        }
    }
}

fn parse_peers(raw: &str) -> PeersConfig {
    let mut peers = PeersConfig::new();
    for entry in raw.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        if let Some((name, url)) = entry.split_once('=') {
            match url.trim().parse::<Url>() {
                Ok(parsed) => {
                    peers.insert(name.trim().to_string(), parsed);
                }
                Err(err) => {
                    tracing::warn!(entry, error = %err, "ignoring malformed NODE_PEERS entry");
                }
            }
        } else {
            tracing::warn!(entry, "ignoring NODE_PEERS entry without a '=' separator");
        }
    }
    peers
}
