//! Configuration for the parts of a node that live in this crate:
//! persistent-store location, consensus tuning, and the metrics exporter.
//!
//! Mirrors the teacher's `ChainConfig` aggregate-of-sub-configs shape —
//! node-process concerns (listen address, peer map, key file path) stay
//! in the `node` binary crate's own config, same split as the teacher's
//! `ChainConfig` (library) vs. `ApiConfig` (binary).

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::consensus::ConsensusConfig;

/// Where the embedded relational store keeps its database file.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig { path: PathBuf::from("ledger.sqlite3") }
    }
}

/// Configuration for the Prometheus metrics exporter, kept verbatim from
/// the teacher — an ambient concern carried regardless of the spec's
/// Non-goals around rewarding/slashing.
#[derive(Clone, Debug)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub listen_addr: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        let addr: SocketAddr = "127.0.0.1:9898"
            .parse()
            .expect("hard-coded metrics listen address should parse");
        MetricsConfig { enabled: true, listen_addr: addr }
    }
}

/// Aggregate configuration for the store, consensus tuning, and metrics
/// exporter — everything `ledger` needs that isn't specific to the HTTP
/// binary wrapping it.
#[derive(Clone, Debug, Default)]
pub struct LedgerConfig {
    pub store: StoreConfig,
    pub consensus: ConsensusConfig,
    pub metrics: MetricsConfig,
}

impl LedgerConfig {
    /// Builds a config from defaults, overridden by environment
    /// variables, mirroring the teacher's hand-rolled `std::env::var`
    /// pattern rather than a config-file crate.
    pub fn from_env() -> LedgerConfig {
        let mut config = LedgerConfig::default();

        if let Ok(path) = std::env::var("LEDGER_STORE_PATH") {
            config.store.path = PathBuf::from(path);
        }
        if let Ok(secs) = std::env::var("LEDGER_BLOCK_TIME_SECS") {
            if let Ok(parsed) = secs.parse() {
                config.consensus.block_time_secs = parsed;
            }
        }
        if let Ok(count) = std::env::var("LEDGER_DELEGATE_COUNT") {
            if let Ok(parsed) = count.parse() {
                config.consensus.delegate_count = parsed;
            }
        }
        if let Ok(enabled) = std::env::var("LEDGER_METRICS_ENABLED") {
            config.metrics.enabled = enabled != "0" && enabled.to_lowercase() != "false";
        }
        if let Ok(addr) = std::env::var("LEDGER_METRICS_LISTEN_ADDR") {
            if let Ok(parsed) = addr.parse() {
                config.metrics.listen_addr = parsed;
            }
        }

        config
    }
}
