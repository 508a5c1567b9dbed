//! Block proposal: draining the mempool through the validation filter and
//! assembling a new block (spec.md §4.7 steps 4-5).

use std::sync::Arc;

use tracing::{instrument, warn};

use crate::store::Store;
use crate::types::{Block, Transaction};
use crate::validation::{self, TempStateOverlay};

/// Builds the next block on top of `last`, draining the mempool in
/// arrival order and filtering through signature + contract validation
/// with a progressively built temp-state overlay (§4.7 step 4), so a
/// block may contain an `EXTRACTED` immediately followed by a `SHIPPED`
/// of the same new shipment.
///
/// Returns `None` if, after filtering, no transaction survives — empty
/// blocks are never produced.
#[instrument(skip(store), fields(last_index = last.index))]
pub fn propose_block(store: &Arc<Store>, last: &Block, validator_name: &str, now: f64) -> Option<Block> {
    let pending = match store.drain_in_arrival_order() {
        Ok(entries) => entries,
        Err(err) => {
            warn!(error = %err, "failed to read mempool while proposing a block");
            return None;
        }
    };

    let mut overlay = TempStateOverlay::new(store);
    let mut included = Vec::new();

    for entry in pending {
        let tx: Transaction = entry.transaction;
        match validation::validate_transaction(&tx, &overlay) {
            Ok(()) => {
                overlay.apply(&tx);
                included.push(tx);
            }
            Err(err) => {
                warn!(tx_hash = %entry.tx_hash, error = %err, "dropping mempool transaction during forging");
            }
        }
    }

    if included.is_empty() {
        return None;
    }

    Some(Block::finalize(
        last.index + 1,
        now,
        last.hash.clone(),
        validator_name.to_string(),
        included,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActionType, GENESIS_PREVIOUS_HASH};

    fn tx(shipment_id: &str, action: ActionType, sender: &str, receiver: &str) -> Transaction {
        Transaction {
            sender: sender.into(),
            receiver: receiver.into(),
            shipment_id: shipment_id.into(),
            action,
            location: "Mine".into(),
            good_id: Some("G-LI".into()),
            quantity: Some(10.0),
            metadata: None,
            timestamp: 1_700_000_000.0,
            signature: "deadbeef".into(),
        }
    }

    #[test]
    fn proposer_includes_valid_in_block_sequence_in_arrival_order() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let genesis = Block::finalize(1, 0.0, GENESIS_PREVIOUS_HASH.to_string(), "A".into(), vec![]);
        store.commit_block(&genesis).unwrap();

        let extract = tx("SHIP-2", ActionType::Extracted, "A", "A");
        let ship = tx("SHIP-2", ActionType::Shipped, "A", "B");
        store.admit_transaction(&extract.tx_hash(), &extract, 1.0).unwrap();
        store.admit_transaction(&ship.tx_hash(), &ship, 2.0).unwrap();

        let block = propose_block(&store, &genesis, "A", 3.0).expect("block should be proposed");
        assert_eq!(block.transactions.len(), 2);
        assert_eq!(block.transactions[0].shipment_id, "SHIP-2");
        assert_eq!(block.transactions[0].action, ActionType::Extracted);
        assert_eq!(block.transactions[1].action, ActionType::Shipped);
    }

    #[test]
    fn proposer_drops_invalid_and_produces_none_when_nothing_survives() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let genesis = Block::finalize(1, 0.0, GENESIS_PREVIOUS_HASH.to_string(), "A".into(), vec![]);
        store.commit_block(&genesis).unwrap();

        let bad_ship = tx("SHIP-404", ActionType::Shipped, "A", "B");
        store.admit_transaction(&bad_ship.tx_hash(), &bad_ship, 1.0).unwrap();

        assert!(propose_block(&store, &genesis, "A", 2.0).is_none());
    }
}
