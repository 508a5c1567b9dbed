//! The periodic forging loop (§4.7) and the channel that decouples it
//! from the gossip/transport layer.
//!
//! The forger imports the block-commit path; the transport layer needs
//! to learn about newly forged blocks to broadcast them. Importing the
//! transport layer back into the forger would create a module cycle, so
//! instead the forger only ever pushes onto an `outbound blocks` channel;
//! whatever owns the transport layer subscribes to it (§9 "Cycle between
//! miner and transport").

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::consensus::config::ConsensusConfig;
use crate::consensus::proposer::propose_block;
use crate::consensus::selector::select_validator;
use crate::store::Store;
use crate::types::Block;

/// Spawns the forger loop as a background task, returning a receiver of
/// every block this node successfully forges and committed locally.
///
/// Ticks every `config.block_time_secs`. On each tick: reads the last
/// block (skipping if none exists yet), computes the expected validator,
/// and if this node is the winner, proposes and locally commits a block.
/// Committed blocks are pushed onto the returned channel for the caller
/// to gossip; the loop never broadcasts itself. Stops cleanly when
/// `cancel` is triggered.
pub fn spawn_forger_loop(
    store: Arc<Store>,
    config: ConsensusConfig,
    node_name: String,
    cancel: CancellationToken,
) -> mpsc::Receiver<Block> {
    let (tx, rx) = mpsc::channel(16);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(config.block_time_secs));
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("forger loop cancelled, shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    forging_tick(&store, &config, &node_name, &tx).await;
                }
            }
        }
    });

    rx
}

#[instrument(skip(store, config, tx), fields(node = %node_name))]
async fn forging_tick(
    store: &Arc<Store>,
    config: &ConsensusConfig,
    node_name: &str,
    tx: &mpsc::Sender<Block>,
) {
    let last = match store.last_block() {
        Ok(Some(block)) => block,
        Ok(None) => return,
        Err(err) => {
            warn!(error = %err, "failed to read last block during forging tick");
            return;
        }
    };

    let expected = match select_validator(store, &last.hash, 0, config.delegate_count) {
        Ok(name) => name,
        Err(err) => {
            warn!(error = %err, "failed to select validator during forging tick");
            return;
        }
    };

    if expected != node_name {
        return;
    }

    let now = now_seconds();
    let Some(block) = propose_block(store, &last, node_name, now) else {
        return;
    };

    match store.commit_block(&block) {
        Ok(()) => {
            info!(index = block.index, tx_count = block.transactions.len(), "forged and committed a new block");
            if tx.send(block).await.is_err() {
                warn!("forger's outbound block channel has no receiver; dropping forged block from broadcast");
            }
        }
        Err(err) => {
            warn!(error = %err, "failed to commit locally forged block, dropping it");
        }
    }
}

fn now_seconds() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
