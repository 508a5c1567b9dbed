//! Ledger data model: participants, catalog goods, shipment world-state
//! rows, transactions, and blocks.

mod block;
mod tx;

pub use block::{Block, GENESIS_PREVIOUS_HASH};
pub use tx::Transaction;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The eight actions a signed transaction may perform against a shipment
/// (or, for `Vote`, against a participant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ActionType {
    Extracted,
    Manufactured,
    Shipped,
    Received,
    Sold,
    Destroyed,
    Consumed,
    Vote,
}

impl ActionType {
    /// Returns the uppercase wire literal for this action, e.g. `"SHIPPED"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Extracted => "EXTRACTED",
            ActionType::Manufactured => "MANUFACTURED",
            ActionType::Shipped => "SHIPPED",
            ActionType::Received => "RECEIVED",
            ActionType::Sold => "SOLD",
            ActionType::Destroyed => "DESTROYED",
            ActionType::Consumed => "CONSUMED",
            ActionType::Vote => "VOTE",
        }
    }

    /// Actions which create a new, active shipment row.
    pub fn is_creation(&self) -> bool {
        matches!(self, ActionType::Extracted | ActionType::Manufactured)
    }

    /// Actions which deactivate a shipment's world-state row.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ActionType::Destroyed | ActionType::Consumed)
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EXTRACTED" => Ok(ActionType::Extracted),
            "MANUFACTURED" => Ok(ActionType::Manufactured),
            "SHIPPED" => Ok(ActionType::Shipped),
            "RECEIVED" => Ok(ActionType::Received),
            "SOLD" => Ok(ActionType::Sold),
            "DESTROYED" => Ok(ActionType::Destroyed),
            "CONSUMED" => Ok(ActionType::Consumed),
            "VOTE" => Ok(ActionType::Vote),
            other => Err(format!("unknown action type: {other}")),
        }
    }
}

impl TryFrom<String> for ActionType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ActionType> for String {
    fn from(action: ActionType) -> Self {
        action.as_str().to_string()
    }
}

/// A registered participant: identity is the public key, the name is an
/// index used for display and delegate ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub public_key: String,
    pub role: String,
    pub reputation: i64,
    pub votes: i64,
}

/// A catalog entry describing a kind of good tracked by the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Good {
    pub good_id: String,
    pub name: String,
    pub unit_of_measure: String,
}

/// A mutable world-state row tracking one shipment's current owner,
/// location, and lifecycle status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    pub shipment_id: String,
    pub good_id: Option<String>,
    pub quantity: f64,
    pub current_owner: String,
    pub current_location: String,
    pub last_action: ActionType,
    pub last_updated_timestamp: f64,
    pub is_active: bool,
}

/// A queued, signature-verified transaction awaiting inclusion in a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MempoolEntry {
    pub tx_hash: String,
    pub transaction: Transaction,
    pub arrival_timestamp: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_type_roundtrips_through_wire_string() {
        for action in [
            ActionType::Extracted,
            ActionType::Manufactured,
            ActionType::Shipped,
            ActionType::Received,
            ActionType::Sold,
            ActionType::Destroyed,
            ActionType::Consumed,
            ActionType::Vote,
        ] {
            let s = action.as_str();
            let parsed: ActionType = s.parse().expect("known literal parses");
            assert_eq!(parsed, action);
        }
    }

    #[test]
    fn unknown_action_literal_is_rejected() {
        assert!("FROBNICATE".parse::<ActionType>().is_err());
    }

    #[test]
    fn serializes_as_bare_uppercase_string() {
        let json = serde_json::to_string(&ActionType::Shipped).unwrap();
        assert_eq!(json, "\"SHIPPED\"");
    }
}
