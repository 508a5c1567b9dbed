use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use ledger::{Block, LedgerError, synchronize_chain, validate_block_linkage};

use crate::state::SharedState;

/// Response body for `POST /block` (spec.md §4.8).
#[derive(Debug, Serialize)]
pub struct BlockAck {
    pub status: &'static str,
    pub index: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// `POST /block` — gossip-received block acceptance.
///
/// - `201` on acceptance: committed locally and asynchronously
///   re-broadcast to every peer.
/// - `409` on rejection (bad genesis, index gap, broken chain, or a
///   header/merkle hash mismatch). An index-gap rejection spawns a
///   background `synchronize_chain` task (§4.10).
///
/// Per §9's Open Questions, a peer receiving an already-forged block
/// trusts the forger's smart-contract filtering: only chain linkage and
/// the header/merkle hashes are re-checked here.
pub async fn post_block(
    State(state): State<SharedState>,
    Json(block): Json<Block>,
) -> (StatusCode, Json<BlockAck>) {
    let index = block.index;

    let last = match state.store.last_block() {
        Ok(last) => last,
        Err(err) => return store_error(index, err.into()),
    };

    if let Err(linkage_err) = validate_block_linkage(&block, last.as_ref()) {
        let ledger_err: LedgerError = linkage_err.into();
        if ledger_err.triggers_resync() {
            spawn_background_sync(&state);
        }
        return rejected(index, ledger_err);
    }

    match state.store.commit_block(&block) {
        Ok(()) => {
            let gossip = state.gossip.clone();
            let block_for_broadcast = block.clone();
            tokio::spawn(async move {
                gossip.broadcast_block(&block_for_broadcast).await;
            });
            (StatusCode::CREATED, Json(BlockAck { status: "accepted", index, reason: None }))
        }
        Err(err) => store_error(index, err.into()),
    }
}

fn spawn_background_sync(state: &SharedState) {
    let store = state.store.clone();
    let gossip = state.gossip.clone();
    tokio::spawn(async move {
        let outcome = synchronize_chain(&store, &gossip).await;
        tracing::info!(?outcome, "background sync after index-gap rejection finished");
    });
}

fn rejected(index: u64, err: LedgerError) -> (StatusCode, Json<BlockAck>) {
    (
        StatusCode::CONFLICT,
        Json(BlockAck { status: "rejected", index, reason: Some(err.to_string()) }),
    )
}

fn store_error(index: u64, err: LedgerError) -> (StatusCode, Json<BlockAck>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(BlockAck { status: "error", index, reason: Some(err.to_string()) }),
    )
}
