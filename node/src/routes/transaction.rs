use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use ledger::{LedgerError, Transaction, validate_transaction};

use crate::state::SharedState;
use crate::time::now_seconds;

/// Response body for `POST /transaction` (spec.md §4.8).
#[derive(Debug, Serialize)]
pub struct TransactionAck {
    pub status: &'static str,
    pub tx_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// `POST /transaction` — mempool admission.
///
/// - `201` on a new, valid transaction: admitted to the mempool and
///   asynchronously relayed to every peer.
/// - `200` if the transaction is already in the mempool or already
///   committed (idempotent resubmission, §4.10 `DuplicateSubmit`).
/// - `400` on signature or smart-contract rule failure.
pub async fn post_transaction(
    State(state): State<SharedState>,
    Json(tx): Json<Transaction>,
) -> (StatusCode, Json<TransactionAck>) {
    let tx_hash = tx.tx_hash();

    match state.store.mempool_contains(&tx_hash) {
        Ok(true) => return duplicate(tx_hash),
        Ok(false) => {}
        Err(err) => return store_error(tx_hash, err.into()),
    }
    match state.store.contains_committed_tx(&tx_hash) {
        Ok(true) => return duplicate(tx_hash),
        Ok(false) => {}
        Err(err) => return store_error(tx_hash, err.into()),
    }

    if let Err(err) = validate_transaction(&tx, state.store.as_ref()) {
        return rejected(tx_hash, err);
    }

    match state.store.admit_transaction(&tx_hash, &tx, now_seconds()) {
        Ok(true) => {
            let gossip = state.gossip.clone();
            let tx_for_broadcast = tx.clone();
            tokio::spawn(async move {
                gossip.broadcast_transaction(&tx_for_broadcast).await;
            });
            (
                StatusCode::CREATED,
                Json(TransactionAck { status: "accepted", tx_hash, reason: None }),
            )
        }
        // Lost a race with another admission of the same tx_hash.
        Ok(false) => duplicate(tx_hash),
        Err(err) => store_error(tx_hash, err.into()),
    }
}

fn duplicate(tx_hash: String) -> (StatusCode, Json<TransactionAck>) {
    (StatusCode::OK, Json(TransactionAck { status: "duplicate", tx_hash, reason: None }))
}

fn rejected(tx_hash: String, err: LedgerError) -> (StatusCode, Json<TransactionAck>) {
    (
        StatusCode::BAD_REQUEST,
        Json(TransactionAck { status: "rejected", tx_hash, reason: Some(err.to_string()) }),
    )
}

fn store_error(tx_hash: String, err: LedgerError) -> (StatusCode, Json<TransactionAck>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(TransactionAck { status: "error", tx_hash, reason: Some(err.to_string()) }),
    )
}
