//! The outbound gossip client and longest-chain sync (spec.md §4.8/§4.9).
//!
//! Inbound gossip (the `/info`, `/chain`, `/transaction`, `/block` HTTP
//! endpoints themselves) is mounted by the `node` binary crate's `axum`
//! router; this module is only the *outbound* side — broadcasting what a
//! node learns to its peers, and pulling a peer's chain during sync.

mod client;
mod config;
mod sync;

pub use client::{GossipClient, GossipError, NodeInfo, PeerSet};
pub use config::GossipConfig;
pub use sync::{SyncOutcome, synchronize_chain};
