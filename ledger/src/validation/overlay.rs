//! A pluggable source of shipment/participant facts for rule checking:
//! either the committed store directly, or the store layered under an
//! in-memory overlay of not-yet-committed intra-block mutations.

use std::collections::HashMap;

use crate::store::Store;
use crate::types::{ActionType, Shipment, Transaction};

/// A read-only view of the facts smart-contract rules need: does a
/// shipment exist and is it active, does a participant exist.
///
/// Implemented both by the committed [`Store`] directly and by
/// [`TempStateOverlay`], so the same rule-checking code in
/// [`super::check_contract_rules`] runs unchanged against either.
pub trait StateView {
    fn shipment(&self, shipment_id: &str) -> Option<Shipment>;
    fn participant_exists(&self, public_key: &str) -> bool;
}

impl StateView for Store {
    fn shipment(&self, shipment_id: &str) -> Option<Shipment> {
        self.get_shipment(shipment_id).ok().flatten()
    }

    fn participant_exists(&self, public_key: &str) -> bool {
        self.get_participant_by_key(public_key).ok().flatten().is_some()
    }
}

/// Layers an in-memory map of shipment mutations over a committed store,
/// so later transactions within the same forged block see the effects of
/// earlier ones before anything is committed.
pub struct TempStateOverlay<'a> {
    store: &'a Store,
    overlay: HashMap<String, Shipment>,
}

impl<'a> TempStateOverlay<'a> {
    pub fn new(store: &'a Store) -> Self {
        TempStateOverlay { store, overlay: HashMap::new() }
    }

    /// Records `tx`'s semantic effect (§4.5) on the shipment overlay, so
    /// subsequent calls to `shipment` see it. Does not touch participant
    /// votes: vote tallies are not consulted by later rule checks within
    /// the same block.
    pub fn apply(&mut self, tx: &Transaction) {
        match tx.action {
            ActionType::Vote => {}
            ActionType::Extracted | ActionType::Manufactured => {
                self.overlay.insert(
                    tx.shipment_id.clone(),
                    Shipment {
                        shipment_id: tx.shipment_id.clone(),
                        good_id: tx.good_id.clone(),
                        quantity: tx.quantity.unwrap_or(0.0),
                        current_owner: tx.receiver.clone(),
                        current_location: tx.location.clone(),
                        last_action: tx.action,
                        last_updated_timestamp: tx.timestamp,
                        is_active: true,
                    },
                );
            }
            ActionType::Destroyed | ActionType::Consumed => {
                if let Some(mut row) = self.shipment(&tx.shipment_id) {
                    row.is_active = false;
                    row.last_action = tx.action;
                    row.last_updated_timestamp = tx.timestamp;
                    self.overlay.insert(tx.shipment_id.clone(), row);
                }
            }
            ActionType::Shipped | ActionType::Received | ActionType::Sold => {
                if let Some(mut row) = self.shipment(&tx.shipment_id) {
                    row.current_owner = tx.receiver.clone();
                    row.current_location = tx.location.clone();
                    row.last_action = tx.action;
                    row.last_updated_timestamp = tx.timestamp;
                    if let Some(quantity) = tx.quantity {
                        row.quantity = quantity;
                    }
                    self.overlay.insert(tx.shipment_id.clone(), row);
                }
            }
        }
    }
}

impl<'a> StateView for TempStateOverlay<'a> {
    fn shipment(&self, shipment_id: &str) -> Option<Shipment> {
        if let Some(row) = self.overlay.get(shipment_id) {
            return Some(row.clone());
        }
        self.store.get_shipment(shipment_id).ok().flatten()
    }

    fn participant_exists(&self, public_key: &str) -> bool {
        self.store.get_participant_by_key(public_key).ok().flatten().is_some()
    }
}
