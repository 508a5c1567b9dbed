//! The five-table schema from spec.md §4.3, created idempotently.

pub const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS blocks (
    block_index     INTEGER PRIMARY KEY,
    block_hash      TEXT UNIQUE NOT NULL,
    previous_hash   TEXT NOT NULL,
    validator       TEXT NOT NULL,
    timestamp       REAL NOT NULL,
    data            TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS participants (
    name            TEXT UNIQUE NOT NULL,
    public_key      TEXT PRIMARY KEY,
    role            TEXT NOT NULL,
    reputation      INTEGER NOT NULL DEFAULT 0,
    votes           INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS goods (
    good_id         TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    unit_of_measure TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS shipments (
    shipment_id             TEXT PRIMARY KEY,
    good_id                 TEXT,
    quantity                REAL NOT NULL,
    current_owner_pk        TEXT NOT NULL,
    current_location        TEXT NOT NULL,
    last_action             TEXT NOT NULL,
    last_updated_timestamp  REAL NOT NULL,
    is_active               INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS mempool (
    tx_hash         TEXT PRIMARY KEY,
    data            TEXT NOT NULL,
    timestamp       REAL NOT NULL
);
";
