//! End-to-end scenarios from spec.md §8, exercised directly against
//! `ledger::Store` and `ledger::validation` — fast and deterministic,
//! no HTTP server spun up.

use rand::rngs::OsRng;
use secp256k1::Secp256k1;

use ledger::{ActionType, Block, GENESIS_PREVIOUS_HASH, Participant, Store, Transaction, TempStateOverlay, validate_transaction};

fn keypair() -> (String, String) {
    let secp = Secp256k1::new();
    let (sk, pk) = secp.generate_keypair(&mut OsRng);
    (hex::encode(sk.secret_bytes()), hex::encode(pk.serialize()))
}

fn register(store: &Store, name: &str, public_key: &str) {
    store
        .upsert_participant(&Participant {
            name: name.to_string(),
            public_key: public_key.to_string(),
            role: "carrier".into(),
            reputation: 0,
            votes: 0,
        })
        .unwrap();
}

fn signed_tx(
    sk: &str,
    sender: &str,
    receiver: &str,
    shipment_id: &str,
    action: ActionType,
    location: &str,
    quantity: Option<f64>,
    timestamp: f64,
) -> Transaction {
    let mut tx = Transaction {
        sender: sender.to_string(),
        receiver: receiver.to_string(),
        shipment_id: shipment_id.to_string(),
        action,
        location: location.to_string(),
        good_id: Some("G-LI".to_string()),
        quantity,
        metadata: None,
        timestamp,
        signature: String::new(),
    };
    tx.sign(sk).unwrap();
    tx
}

/// Scenario 1: "Genesis + first extract". A submits an EXTRACTED
/// transaction; forging it produces a world-state shipment row owned by
/// A, active, with the submitted quantity.
#[test]
fn genesis_then_first_extract_creates_active_shipment() {
    let store = Store::open_in_memory().unwrap();
    let (sk_a, pk_a) = keypair();
    let (_, pk_b) = keypair();
    let (_, pk_c) = keypair();
    register(&store, "A", &pk_a);
    register(&store, "B", &pk_b);
    register(&store, "C", &pk_c);

    let genesis = Block::finalize(1, 0.0, GENESIS_PREVIOUS_HASH.to_string(), "A".into(), vec![]);
    store.commit_block(&genesis).unwrap();

    let extract = signed_tx(&sk_a, &pk_a, &pk_a, "SHIP-1", ActionType::Extracted, "Mine", Some(500.0), 1.0);
    assert!(!store.mempool_contains(&extract.tx_hash()).unwrap());
    store.admit_transaction(&extract.tx_hash(), &extract, 1.0).unwrap();
    assert_eq!(store.drain_in_arrival_order().unwrap().len(), 1);

    let block = Block::finalize(2, 2.0, genesis.hash.clone(), "A".into(), vec![extract]);
    store.commit_block(&block).unwrap();

    let shipment = store.get_shipment("SHIP-1").unwrap().unwrap();
    assert_eq!(shipment.current_owner, pk_a);
    assert!(shipment.is_active);
    assert_eq!(shipment.quantity, 500.0);
    assert_eq!(store.last_block().unwrap().unwrap().index, 2);
    assert_eq!(store.drain_in_arrival_order().unwrap().len(), 0);
}

/// Scenario 2: "Not-owner rejection". SHIP-1 is owned by A; B submits a
/// SHIPPED transaction for it. Rejected with NotOwner; mempool/world
/// state unchanged.
#[test]
fn shipped_by_non_owner_is_rejected() {
    let store = Store::open_in_memory().unwrap();
    let (sk_a, pk_a) = keypair();
    let (sk_b, pk_b) = keypair();
    let (_, pk_c) = keypair();
    register(&store, "A", &pk_a);
    register(&store, "B", &pk_b);
    register(&store, "C", &pk_c);

    let extract = signed_tx(&sk_a, &pk_a, &pk_a, "SHIP-1", ActionType::Extracted, "Mine", Some(500.0), 1.0);
    let genesis = Block::finalize(1, 0.0, GENESIS_PREVIOUS_HASH.to_string(), "A".into(), vec![extract]);
    store.commit_block(&genesis).unwrap();

    let bad_ship = signed_tx(&sk_b, &pk_b, &pk_c, "SHIP-1", ActionType::Shipped, "Truck", None, 2.0);
    let err = validate_transaction(&bad_ship, &store).unwrap_err();
    assert!(err.to_string().contains("sender is not"));

    assert!(!store.mempool_contains(&bad_ship.tx_hash()).unwrap());
    let shipment = store.get_shipment("SHIP-1").unwrap().unwrap();
    assert_eq!(shipment.current_owner, pk_a);
}

/// Scenario 3: "In-block sequencing". A submits EXTRACTED SHIP-2 then
/// SHIPPED SHIP-2 to B, back to back. Both validate against a
/// progressively built overlay and commit in that order.
#[test]
fn extract_then_ship_in_same_block_sequences_correctly() {
    let store = Store::open_in_memory().unwrap();
    let (sk_a, pk_a) = keypair();
    let (_, pk_b) = keypair();
    register(&store, "A", &pk_a);
    register(&store, "B", &pk_b);

    let genesis = Block::finalize(1, 0.0, GENESIS_PREVIOUS_HASH.to_string(), "A".into(), vec![]);
    store.commit_block(&genesis).unwrap();

    let extract = signed_tx(&sk_a, &pk_a, &pk_a, "SHIP-2", ActionType::Extracted, "Mine", Some(10.0), 1.0);
    let ship = signed_tx(&sk_a, &pk_a, &pk_b, "SHIP-2", ActionType::Shipped, "Port", None, 2.0);

    let mut overlay = TempStateOverlay::new(&store);
    validate_transaction(&extract, &overlay).unwrap();
    overlay.apply(&extract);
    validate_transaction(&ship, &overlay).unwrap();
    overlay.apply(&ship);

    let block = Block::finalize(2, 2.0, genesis.hash.clone(), "A".into(), vec![extract, ship]);
    store.commit_block(&block).unwrap();

    let shipment = store.get_shipment("SHIP-2").unwrap().unwrap();
    assert_eq!(shipment.current_owner, pk_b);
    assert!(shipment.is_active);
}

/// Scenario 4: "Double-create rejection". A resubmits EXTRACTED SHIP-1
/// after it is already active; rejected AlreadyActive, row unchanged.
#[test]
fn re_extracting_an_active_shipment_is_rejected() {
    let store = Store::open_in_memory().unwrap();
    let (sk_a, pk_a) = keypair();
    register(&store, "A", &pk_a);

    let extract = signed_tx(&sk_a, &pk_a, &pk_a, "SHIP-1", ActionType::Extracted, "Mine", Some(500.0), 1.0);
    let genesis = Block::finalize(1, 0.0, GENESIS_PREVIOUS_HASH.to_string(), "A".into(), vec![extract.clone()]);
    store.commit_block(&genesis).unwrap();

    let re_extract = signed_tx(&sk_a, &pk_a, &pk_a, "SHIP-1", ActionType::Extracted, "Mine", Some(999.0), 2.0);
    let err = validate_transaction(&re_extract, &store).unwrap_err();
    assert!(err.to_string().contains("already has an active row"));

    let shipment = store.get_shipment("SHIP-1").unwrap().unwrap();
    assert_eq!(shipment.quantity, 500.0);
}
