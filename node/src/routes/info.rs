use axum::{Json, extract::State};

use ledger::{GENESIS_PREVIOUS_HASH, NodeInfo};

use crate::state::SharedState;

/// `GET /info` — this node's name, tip height (0 if no blocks yet), and
/// tip hash (spec.md §4.8/§6).
pub async fn get_info(State(state): State<SharedState>) -> Json<NodeInfo> {
    let tip = state.store.last_block().ok().flatten();
    let (height, last_hash) = match tip {
        Some(block) => (block.index, block.hash),
        None => (0, GENESIS_PREVIOUS_HASH.to_string()),
    };

    Json(NodeInfo { node_name: state.node_name.clone(), height, last_hash })
}
