use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::canonical::to_canonical_bytes;
use crate::crypto;

use super::Transaction;

/// The hex previous_hash carried by the genesis block: 64 `'0'` characters.
pub const GENESIS_PREVIOUS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// A forged block: a header bound to an ordered transaction list via
/// `merkle_root`.
///
/// `hash` covers only the header fields (`index`, `timestamp`,
/// `previous_hash`, `merkle_root`, `validator`) — the transaction list
/// itself is bound in by `merkle_root`, not by inclusion in the hashed
/// header. This asymmetry is deliberate and required for cross-node
/// consensus; do not fold `transactions` into the hash payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: f64,
    pub previous_hash: String,
    pub validator: String,
    pub transactions: Vec<Transaction>,
    pub merkle_root: String,
    pub hash: String,
}

impl Block {
    /// Builds a block's final `merkle_root` and `hash` from the already
    /// populated header fields and transaction list, returning a fully
    /// formed `Block`. Callers supply every field but the two derived
    /// ones.
    pub fn finalize(
        index: u64,
        timestamp: f64,
        previous_hash: String,
        validator: String,
        transactions: Vec<Transaction>,
    ) -> Block {
        let merkle_root = Block::compute_merkle_root(&transactions);
        let hash = Block::compute_hash(index, timestamp, &previous_hash, &merkle_root, &validator);
        Block {
            index,
            timestamp,
            previous_hash,
            validator,
            transactions,
            merkle_root,
            hash,
        }
    }

    /// Iteratively pairwise-hashes transaction hashes into a single root.
    /// An odd tail at any level is paired with itself. Empty input yields
    /// the empty string.
    pub fn compute_merkle_root(transactions: &[Transaction]) -> String {
        if transactions.is_empty() {
            return String::new();
        }

        let mut level: Vec<String> = transactions.iter().map(Transaction::tx_hash).collect();

        while level.len() > 1 {
            let mut next = Vec::with_capacity(level.len().div_ceil(2));
            let mut i = 0;
            while i < level.len() {
                let left = &level[i];
                let right = if i + 1 < level.len() {
                    &level[i + 1]
                } else {
                    left
                };
                let combined = format!("{left}{right}");
                next.push(crypto::sha256_hex(combined.as_bytes()));
                i += 2;
            }
            level = next;
        }

        level.into_iter().next().unwrap_or_default()
    }

    /// Recomputes the header hash for the given header fields, matching
    /// the canonical payload `{index, timestamp, previous_hash,
    /// merkle_root, validator}`.
    pub fn compute_hash(
        index: u64,
        timestamp: f64,
        previous_hash: &str,
        merkle_root: &str,
        validator: &str,
    ) -> String {
        let payload = json!({
            "index": index,
            "timestamp": timestamp,
            "previous_hash": previous_hash,
            "merkle_root": merkle_root,
            "validator": validator,
        });
        crypto::sha256_hex(&to_canonical_bytes(&payload))
    }

    /// Recomputes `self.hash` from the current header fields; does not
    /// mutate `self`.
    pub fn recompute_hash(&self) -> String {
        Block::compute_hash(
            self.index,
            self.timestamp,
            &self.previous_hash,
            &self.merkle_root,
            &self.validator,
        )
    }

    /// Serializes this block to wire JSON bytes (ordinary `serde_json`,
    /// not canonical form — this is for the gossip API, not hashing).
    pub fn to_wire_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Decodes a block from wire JSON bytes.
    pub fn from_wire_json(bytes: &[u8]) -> serde_json::Result<Block> {
        serde_json::from_slice(bytes)
    }

    /// True when `self.index == 1` and `self.previous_hash` is the
    /// genesis sentinel.
    pub fn is_genesis(&self) -> bool {
        self.index == 1 && self.previous_hash == GENESIS_PREVIOUS_HASH
    }
}
