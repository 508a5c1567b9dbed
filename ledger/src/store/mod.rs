//! The embedded relational store: five tables (`blocks`, `participants`,
//! `goods`, `shipments`, `mempool`), one guarded connection per node.

mod schema;

use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;
use tracing::instrument;

use crate::types::{ActionType, Block, Good, MempoolEntry, Participant, Shipment, Transaction};

/// Errors raised by the persistent store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("stored row failed to decode: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("mutex guarding the store connection was poisoned")]
    Poisoned,
}

/// The embedded relational store backing one node.
///
/// A single physical connection is sufficient for a per-process embedded
/// store: SQLite serializes writers internally, and guarding the one
/// connection with a `Mutex` keeps atomic-commit reasoning simple (no
/// connection pool, no cross-connection isolation surprises).
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Opens (creating if absent) the database file at `path` and
    /// idempotently creates the schema.
    pub fn open(path: &std::path::Path) -> Result<Store, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(schema::SCHEMA_SQL)?;
        Ok(Store { conn: Mutex::new(conn) })
    }

    /// Opens an in-memory store, used by tests.
    pub fn open_in_memory() -> Result<Store, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(schema::SCHEMA_SQL)?;
        Ok(Store { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    // ---- participants ---------------------------------------------------

    /// Inserts or updates a participant row (registration / bootstrap
    /// path; vote counts are normally mutated via `bump_votes`).
    pub fn upsert_participant(&self, p: &Participant) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO participants (name, public_key, role, reputation, votes)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(public_key) DO UPDATE SET
                name = excluded.name,
                role = excluded.role,
                reputation = excluded.reputation,
                votes = excluded.votes",
            params![p.name, p.public_key, p.role, p.reputation, p.votes],
        )?;
        Ok(())
    }

    /// Looks up a participant by public key.
    pub fn get_participant_by_key(&self, public_key: &str) -> Result<Option<Participant>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT name, public_key, role, reputation, votes FROM participants WHERE public_key = ?1",
            params![public_key],
            row_to_participant,
        )
        .optional()
        .map_err(StoreError::from)
    }

    /// Returns the top `n` participants ordered by `(votes DESC, name
    /// ASC)`, per §4.6 step 1.
    pub fn top_delegates(&self, n: usize) -> Result<Vec<Participant>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT name, public_key, role, reputation, votes FROM participants
             ORDER BY votes DESC, name ASC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![n as i64], row_to_participant)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Increments `votes` for the participant identified by `public_key`
    /// by one. A no-op if the participant does not exist (callers must
    /// validate existence beforehand, per §4.5 `UnknownCandidate`).
    fn bump_votes(conn: &Connection, public_key: &str) -> Result<(), StoreError> {
        conn.execute(
            "UPDATE participants SET votes = votes + 1 WHERE public_key = ?1",
            params![public_key],
        )?;
        Ok(())
    }

    // ---- goods ------------------------------------------------------------

    /// Inserts or updates a catalog good.
    pub fn upsert_good(&self, good: &Good) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO goods (good_id, name, unit_of_measure) VALUES (?1, ?2, ?3)
             ON CONFLICT(good_id) DO UPDATE SET
                name = excluded.name,
                unit_of_measure = excluded.unit_of_measure",
            params![good.good_id, good.name, good.unit_of_measure],
        )?;
        Ok(())
    }

    // ---- shipments (world state) -------------------------------------------

    /// Reads the current world-state row for `shipment_id`, if any.
    pub fn get_shipment(&self, shipment_id: &str) -> Result<Option<Shipment>, StoreError> {
        let conn = self.lock()?;
        get_shipment_with(&conn, shipment_id)
    }

    fn upsert_shipment(conn: &Connection, row: &Shipment) -> Result<(), StoreError> {
        conn.execute(
            "INSERT INTO shipments
                (shipment_id, good_id, quantity, current_owner_pk, current_location,
                 last_action, last_updated_timestamp, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(shipment_id) DO UPDATE SET
                good_id = excluded.good_id,
                quantity = excluded.quantity,
                current_owner_pk = excluded.current_owner_pk,
                current_location = excluded.current_location,
                last_action = excluded.last_action,
                last_updated_timestamp = excluded.last_updated_timestamp,
                is_active = excluded.is_active",
            params![
                row.shipment_id,
                row.good_id,
                row.quantity,
                row.current_owner,
                row.current_location,
                row.last_action.as_str(),
                row.last_updated_timestamp,
                row.is_active as i64,
            ],
        )?;
        Ok(())
    }

    /// Applies one transaction's semantic effect (§4.5 "Semantic effect on
    /// commit") to the world-state tables, inside the caller's
    /// transaction.
    fn apply_transaction_effect(
        conn: &Connection,
        tx: &Transaction,
    ) -> Result<(), StoreError> {
        match tx.action {
            ActionType::Vote => {
                Store::bump_votes(conn, &tx.receiver)?;
            }
            ActionType::Extracted | ActionType::Manufactured => {
                Store::upsert_shipment(
                    conn,
                    &Shipment {
                        shipment_id: tx.shipment_id.clone(),
                        good_id: tx.good_id.clone(),
                        quantity: tx.quantity.unwrap_or(0.0),
                        current_owner: tx.receiver.clone(),
                        current_location: tx.location.clone(),
                        last_action: tx.action,
                        last_updated_timestamp: tx.timestamp,
                        is_active: true,
                    },
                )?;
            }
            ActionType::Destroyed | ActionType::Consumed => {
                conn.execute(
                    "UPDATE shipments SET is_active = 0, last_action = ?2, last_updated_timestamp = ?3
                     WHERE shipment_id = ?1",
                    params![tx.shipment_id, tx.action.as_str(), tx.timestamp],
                )?;
            }
            ActionType::Shipped | ActionType::Received | ActionType::Sold => {
                if let Some(quantity) = tx.quantity {
                    conn.execute(
                        "UPDATE shipments SET current_owner_pk = ?2, current_location = ?3,
                            last_action = ?4, last_updated_timestamp = ?5, quantity = ?6
                         WHERE shipment_id = ?1",
                        params![
                            tx.shipment_id,
                            tx.receiver,
                            tx.location,
                            tx.action.as_str(),
                            tx.timestamp,
                            quantity
                        ],
                    )?;
                } else {
                    conn.execute(
                        "UPDATE shipments SET current_owner_pk = ?2, current_location = ?3,
                            last_action = ?4, last_updated_timestamp = ?5
                         WHERE shipment_id = ?1",
                        params![
                            tx.shipment_id,
                            tx.receiver,
                            tx.location,
                            tx.action.as_str(),
                            tx.timestamp
                        ],
                    )?;
                }
            }
        }
        Ok(())
    }

    // ---- mempool ------------------------------------------------------------

    /// Admits a transaction into the mempool. Returns `Ok(false)` without
    /// error if `tx_hash` is already present (idempotent submit, §4.10).
    #[instrument(skip(self, tx))]
    pub fn admit_transaction(&self, tx_hash: &str, tx: &Transaction, arrival_timestamp: f64) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let data = serde_json::to_string(tx)?;
        let changed = conn.execute(
            "INSERT OR IGNORE INTO mempool (tx_hash, data, timestamp) VALUES (?1, ?2, ?3)",
            params![tx_hash, data, arrival_timestamp],
        )?;
        Ok(changed > 0)
    }

    /// True if `tx_hash` is currently queued in the mempool.
    pub fn mempool_contains(&self, tx_hash: &str) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let exists: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM mempool WHERE tx_hash = ?1",
                params![tx_hash],
                |row| row.get(0),
            )
            .optional()?;
        Ok(exists.is_some())
    }

    /// Returns every queued transaction ordered by arrival time, oldest
    /// first (mempool arrival order, per §4.7 step 4).
    pub fn drain_in_arrival_order(&self) -> Result<Vec<MempoolEntry>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT tx_hash, data, timestamp FROM mempool ORDER BY timestamp ASC, tx_hash ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                let tx_hash: String = row.get(0)?;
                let data: String = row.get(1)?;
                let arrival_timestamp: f64 = row.get(2)?;
                Ok((tx_hash, data, arrival_timestamp))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut entries = Vec::with_capacity(rows.len());
        for (tx_hash, data, arrival_timestamp) in rows {
            let transaction: Transaction = serde_json::from_str(&data)?;
            entries.push(MempoolEntry { tx_hash, transaction, arrival_timestamp });
        }
        Ok(entries)
    }

    /// Removes every entry whose `tx_hash` is in `tx_hashes`, e.g. after
    /// a block including them has committed.
    pub fn remove_many_from_mempool(&self, tx_hashes: &[String]) -> Result<(), StoreError> {
        if tx_hashes.is_empty() {
            return Ok(());
        }
        let mut conn = self.lock()?;
        let txn = conn.transaction()?;
        for tx_hash in tx_hashes {
            txn.execute("DELETE FROM mempool WHERE tx_hash = ?1", params![tx_hash])?;
        }
        txn.commit()?;
        Ok(())
    }

    // ---- blocks -------------------------------------------------------------

    /// Returns the highest-index block, if any.
    pub fn last_block(&self) -> Result<Option<Block>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT data FROM blocks ORDER BY block_index DESC LIMIT 1",
            [],
            |row| row.get::<_, String>(0),
        )
        .optional()?
        .map(|data| serde_json::from_str(&data).map_err(StoreError::from))
        .transpose()
    }

    /// Returns all blocks ascending by index, as stored in `/chain`
    /// responses.
    pub fn all_blocks(&self) -> Result<Vec<Block>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT data FROM blocks ORDER BY block_index ASC")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|data| serde_json::from_str(&data).map_err(StoreError::from))
            .collect()
    }

    /// True if `tx_hash` already appears in some committed block's
    /// transaction list — the "already committed" half of §4.8's
    /// duplicate-submission check (the mempool half is
    /// `mempool_contains`). Scans the `blocks` table; fine for the small
    /// chains this node holds in practice, and keeps the schema to
    /// exactly the five tables spec.md §4.3 names rather than adding a
    /// dedicated committed-tx index.
    pub fn contains_committed_tx(&self, tx_hash: &str) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT data FROM blocks")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        for data in rows {
            let block: Block = serde_json::from_str(&data)?;
            if block.transactions.iter().any(|tx| tx.tx_hash() == tx_hash) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Atomically inserts `block` and applies every transaction's
    /// world-state effect, then drops the now-included transactions from
    /// the mempool. A `UNIQUE` violation on `block_hash` (the block is
    /// already present) is treated as an idempotent no-op success rather
    /// than an error, per §4.10.
    #[instrument(skip(self, block), fields(index = block.index))]
    pub fn commit_block(&self, block: &Block) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let txn = conn.transaction()?;

        let data = serde_json::to_string(block)?;
        let inserted = txn.execute(
            "INSERT OR IGNORE INTO blocks (block_index, block_hash, previous_hash, validator, timestamp, data)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                block.index as i64,
                block.hash,
                block.previous_hash,
                block.validator,
                block.timestamp,
                data
            ],
        )?;

        if inserted == 0 {
            // Block already present: idempotent no-op, roll back the empty txn.
            txn.rollback()?;
            return Ok(());
        }

        for tx in &block.transactions {
            Store::apply_transaction_effect(&txn, tx)?;
        }

        let tx_hashes: Vec<String> = block.transactions.iter().map(Transaction::tx_hash).collect();
        for tx_hash in &tx_hashes {
            txn.execute("DELETE FROM mempool WHERE tx_hash = ?1", params![tx_hash])?;
        }

        txn.commit()?;
        Ok(())
    }
}

fn row_to_participant(row: &rusqlite::Row<'_>) -> rusqlite::Result<Participant> {
    Ok(Participant {
        name: row.get(0)?,
        public_key: row.get(1)?,
        role: row.get(2)?,
        reputation: row.get(3)?,
        votes: row.get(4)?,
    })
}

fn get_shipment_with(conn: &Connection, shipment_id: &str) -> Result<Option<Shipment>, StoreError> {
    conn.query_row(
        "SELECT shipment_id, good_id, quantity, current_owner_pk, current_location,
                last_action, last_updated_timestamp, is_active
         FROM shipments WHERE shipment_id = ?1",
        params![shipment_id],
        |row| {
            let last_action: String = row.get(5)?;
            let is_active: i64 = row.get(7)?;
            Ok(Shipment {
                shipment_id: row.get(0)?,
                good_id: row.get(1)?,
                quantity: row.get(2)?,
                current_owner: row.get(3)?,
                current_location: row.get(4)?,
                last_action: last_action.parse().unwrap_or(ActionType::Extracted),
                last_updated_timestamp: row.get(6)?,
                is_active: is_active != 0,
            })
        },
    )
    .optional()
    .map_err(StoreError::from)
}
