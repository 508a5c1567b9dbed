use axum::{Json, extract::State, http::StatusCode};

use ledger::Block;

use crate::state::SharedState;

/// `GET /chain` — every committed block, ascending by index (spec.md
/// §4.8/§6).
pub async fn get_chain(
    State(state): State<SharedState>,
) -> Result<Json<Vec<Block>>, (StatusCode, String)> {
    state
        .store
        .all_blocks()
        .map(Json)
        .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))
}
