//! Ledger library crate.
//!
//! Core building blocks for a permissioned, replicated supply-chain
//! provenance ledger:
//!
//! - cryptographic primitives (`crypto`) — SHA-256 hashing and SECP256k1
//!   sign/verify over hex-encoded keys,
//! - canonical JSON encoding (`canonical`) for hash and signature payloads,
//! - the data model (`types`) — participants, goods, shipments,
//!   transactions, and blocks,
//! - the `rusqlite`-backed persistent store and derived world state
//!   (`store`),
//! - the validation engine (`validation`) — signature checks, smart-contract
//!   shipment-lifecycle rules, and block-chain linkage checks,
//! - DPoS validator selection and the block-forging loop (`consensus`),
//! - the outbound gossip client and longest-chain sync (`gossip`),
//! - Prometheus-based metrics (`metrics`),
//! - and node configuration (`config`).
//!
//! The `node` binary crate composes these pieces into a running HTTP node.

pub mod canonical;
pub mod config;
pub mod consensus;
pub mod crypto;
pub mod error;
pub mod gossip;
pub mod metrics;
pub mod store;
pub mod types;
pub mod validation;

pub use config::{LedgerConfig, MetricsConfig, StoreConfig};
pub use consensus::{ConsensusConfig, UNKNOWN_VALIDATOR, select_validator, spawn_forger_loop};
pub use error::{ChainLinkageError, ContractViolation, LedgerError};
pub use gossip::{GossipClient, GossipConfig, GossipError, NodeInfo, PeerSet, SyncOutcome, synchronize_chain};
pub use metrics::{LedgerMetrics, MetricsRegistry, run_prometheus_http_server};
pub use store::{Store, StoreError};
pub use types::{
    ActionType, Block, Good, MempoolEntry, Participant, Shipment, Transaction,
    GENESIS_PREVIOUS_HASH,
};
pub use validation::{StateView, TempStateOverlay, validate_block_linkage, validate_transaction};
