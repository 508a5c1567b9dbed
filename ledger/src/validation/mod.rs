//! Signature checking, smart-contract shipment-lifecycle rules, and
//! block-chain linkage validation (spec.md §4.4/§4.5).

mod overlay;

pub use overlay::{StateView, TempStateOverlay};

use crate::error::{ChainLinkageError, ContractViolation, LedgerError};
use crate::types::{ActionType, Block, Transaction, GENESIS_PREVIOUS_HASH};

/// Verifies `tx.signature` against `tx.sender`, per §4.2.
pub fn verify_signature(tx: &Transaction) -> Result<(), LedgerError> {
    tx.verify()?;
    Ok(())
}

/// Checks the smart-contract shipment-lifecycle rules (§4.5) for `tx`
/// against `state`, which may be the committed store or an overlay
/// reflecting prior transactions in the same not-yet-committed block.
pub fn check_contract_rules(
    tx: &Transaction,
    state: &dyn StateView,
) -> Result<(), ContractViolation> {
    match tx.action {
        ActionType::Vote => {
            if state.participant_exists(&tx.receiver) {
                Ok(())
            } else {
                Err(ContractViolation::UnknownCandidate)
            }
        }
        ActionType::Extracted | ActionType::Manufactured => match state.shipment(&tx.shipment_id) {
            Some(row) if row.is_active => Err(ContractViolation::AlreadyActive),
            _ => Ok(()),
        },
        _ => match state.shipment(&tx.shipment_id) {
            None => Err(ContractViolation::UnknownShipment),
            Some(row) if !row.is_active => Err(ContractViolation::InactiveShipment),
            Some(row) if row.current_owner != tx.sender => Err(ContractViolation::NotOwner),
            Some(_) => Ok(()),
        },
    }
}

/// Full transaction admission check (mempool admission and forging
/// filter, §4.4): signature then contract rules.
pub fn validate_transaction(tx: &Transaction, state: &dyn StateView) -> Result<(), LedgerError> {
    verify_signature(tx)?;
    check_contract_rules(tx, state)?;
    Ok(())
}

/// Validates a candidate block's chain linkage and recomputed hashes
/// against the local tip (§4.4 "Block validation"). Does not re-check
/// smart-contract rules — per §9's Open Questions, peers trust the
/// forger's contract filtering and only enforce linkage + hash here.
pub fn validate_block_linkage(block: &Block, last: Option<&Block>) -> Result<(), ChainLinkageError> {
    if block.index == 1 {
        if last.is_some() {
            return Err(ChainLinkageError::BadGenesis);
        }
        if block.previous_hash != GENESIS_PREVIOUS_HASH {
            return Err(ChainLinkageError::BadGenesis);
        }
    } else {
        let last = last.ok_or(ChainLinkageError::IndexGap)?;
        if block.index != last.index + 1 {
            return Err(ChainLinkageError::IndexGap);
        }
        if block.previous_hash != last.hash {
            return Err(ChainLinkageError::BrokenChain);
        }
    }

    let recomputed_merkle = Block::compute_merkle_root(&block.transactions);
    if recomputed_merkle != block.merkle_root {
        return Err(ChainLinkageError::BadHash);
    }
    if block.recompute_hash() != block.hash {
        return Err(ChainLinkageError::BadHash);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use crate::types::Participant;

    fn tx(action: ActionType, sender: &str, receiver: &str, shipment_id: &str) -> Transaction {
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
    fn vote_requires_known_candidate() {
        let store = Store::open_in_memory().unwrap();
        let t = tx(ActionType::Vote, "A", "pk-unknown", "SHIP-1");
        let err = check_contract_rules(&t, &store).unwrap_err();
        assert_eq!(err, ContractViolation::UnknownCandidate);

        store
            .upsert_participant(&Participant {
                name: "B".into(),
                public_key: "pk-unknown".into(),
                role: "carrier".into(),
                reputation: 0,
                votes: 0,
            })
            .unwrap();
        check_contract_rules(&t, &store).unwrap();
    }

    #[test]
    fn extract_fails_if_already_active() {
        let store = Store::open_in_memory().unwrap();
        let create = tx(ActionType::Extracted, "A", "A", "SHIP-1");
        let block = Block::finalize(1, 1.0, GENESIS_PREVIOUS_HASH.to_string(), "A".into(), vec![create.clone()]);
        store.commit_block(&block).unwrap();

        let err = check_contract_rules(&create, &store).unwrap_err();
        assert_eq!(err, ContractViolation::AlreadyActive);
    }

    #[test]
    fn ship_requires_current_owner() {
        let store = Store::open_in_memory().unwrap();
        let create = tx(ActionType::Extracted, "A", "A", "SHIP-1");
        let block = Block::finalize(1, 1.0, GENESIS_PREVIOUS_HASH.to_string(), "A".into(), vec![create]);
        store.commit_block(&block).unwrap();

        let ship_by_wrong_sender = tx(ActionType::Shipped, "B", "C", "SHIP-1");
        assert_eq!(
            check_contract_rules(&ship_by_wrong_sender, &store).unwrap_err(),
            ContractViolation::NotOwner
        );

        let ship_by_owner = tx(ActionType::Shipped, "A", "C", "SHIP-1");
        check_contract_rules(&ship_by_owner, &store).unwrap();
    }

    #[test]
    fn overlay_sees_intra_block_creation_before_commit() {
        let store = Store::open_in_memory().unwrap();
        let mut overlay = TempStateOverlay::new(&store);

        let create = tx(ActionType::Extracted, "A", "A", "SHIP-2");
        check_contract_rules(&create, &overlay).unwrap();
        overlay.apply(&create);

        let ship = tx(ActionType::Shipped, "A", "B", "SHIP-2");
        check_contract_rules(&ship, &overlay).unwrap();
    }

    #[test]
    fn genesis_linkage_requires_no_prior_block_and_zero_previous_hash() {
        let genesis = Block::finalize(1, 1.0, GENESIS_PREVIOUS_HASH.to_string(), "A".into(), vec![]);
        validate_block_linkage(&genesis, None).unwrap();

        let bad_genesis = Block::finalize(1, 1.0, "not-zeros".into(), "A".into(), vec![]);
        assert_eq!(
            validate_block_linkage(&bad_genesis, None).unwrap_err(),
            ChainLinkageError::BadGenesis
        );
    }

    #[test]
    fn detects_index_gap_and_broken_chain() {
        let genesis = Block::finalize(1, 1.0, GENESIS_PREVIOUS_HASH.to_string(), "A".into(), vec![]);

        let gapped = Block::finalize(3, 2.0, genesis.hash.clone(), "A".into(), vec![]);
        assert_eq!(
            validate_block_linkage(&gapped, Some(&genesis)).unwrap_err(),
            ChainLinkageError::IndexGap
        );

        let broken = Block::finalize(2, 2.0, "wrong-prev-hash".into(), "A".into(), vec![]);
        assert_eq!(
            validate_block_linkage(&broken, Some(&genesis)).unwrap_err(),
            ChainLinkageError::BrokenChain
        );
    }
}
