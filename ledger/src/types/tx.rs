use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::canonical::to_canonical_bytes;
use crate::crypto::{self, CryptoError};

use super::ActionType;

/// A signed action against a shipment (or, for `Vote`, a participant).
///
/// `tx_hash` is derived from every other field and is never trusted from
/// the wire: callers must call [`Transaction::tx_hash`] rather than read a
/// caller-supplied hash field, mirroring `blockchain_core.py`'s
/// `Transaction.calculate_hash` being recomputed rather than cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub receiver: String,
    pub shipment_id: String,
    pub action: ActionType,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub good_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub metadata: Option<HashMap<String, Value>>,
    pub timestamp: f64,
    pub signature: String,
}

impl Transaction {
    /// The exact field set hashed per the spec's canonical transaction
    /// payload: everything except `signature` (and the derived hash
    /// itself, which this type never stores).
    fn canonical_value(&self) -> Value {
        json!({
            "sender": self.sender,
            "receiver": self.receiver,
            "shipment_id": self.shipment_id,
            "action": self.action.as_str(),
            "good_id": self.good_id,
            "quantity": self.quantity,
            "timestamp": self.timestamp,
            "location": self.location,
            "metadata": self.metadata,
        })
    }

    /// The transaction hash: SHA-256 of the canonical JSON of every field
    /// except `signature`, returned as lowercase hex.
    pub fn tx_hash(&self) -> String {
        crypto::sha256_hex(&to_canonical_bytes(&self.canonical_value()))
    }

    /// Signs this transaction's hash with `private_key_hex`, writing the
    /// resulting hex signature into `self.signature`.
    ///
    /// Mirrors the original signer: the signature covers
    /// `SHA256(tx_hash_string_bytes)`, i.e. the hash of the *hex string*
    /// of the transaction hash, not the raw digest bytes.
    pub fn sign(&mut self, private_key_hex: &str) -> Result<(), CryptoError> {
        let hash_of_hash = crypto::sha256(self.tx_hash().as_bytes());
        self.signature = crypto::sign(private_key_hex, &hash_of_hash)?;
        Ok(())
    }

    /// Verifies `self.signature` against `self.sender` as the SECP256k1
    /// public key, over the same `SHA256(tx_hash_string_bytes)` payload
    /// used by [`Transaction::sign`].
    pub fn verify(&self) -> Result<(), CryptoError> {
        let hash_of_hash = crypto::sha256(self.tx_hash().as_bytes());
        crypto::verify(&self.sender, &hash_of_hash, &self.signature)
    }
}
