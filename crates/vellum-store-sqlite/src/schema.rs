//! SQL schema for the Vellum SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS indices (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL UNIQUE,
    title       TEXT,
    schema      TEXT,              -- JSON-Schema document or NULL
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

-- Every content-changing push appends here. Rows are only ever removed
-- wholesale when an index is cleared. AUTOINCREMENT keeps ids from being
-- reused after such a clear, so revisions stay unique forever.
CREATE TABLE IF NOT EXISTS record_log (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    index_id    INTEGER NOT NULL REFERENCES indices(id),
    record_id   TEXT NOT NULL,
    data        TEXT NOT NULL,     -- raw JSON payload, byte-for-byte
    created_at  TEXT NOT NULL
);

-- One head per key, pointing at its newest log entry.
CREATE TABLE IF NOT EXISTS records (
    record_id   TEXT NOT NULL,
    index_id    INTEGER NOT NULL REFERENCES indices(id),
    log_id      INTEGER NOT NULL REFERENCES record_log(id),
    checksum    BLOB NOT NULL CHECK (length(checksum) = 32),
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,     -- moves when the payload changes
    touched_at  TEXT NOT NULL,     -- moves on every push
    PRIMARY KEY (record_id, index_id)
);

CREATE INDEX IF NOT EXISTS record_log_key_idx ON record_log(index_id, record_id, id);
CREATE INDEX IF NOT EXISTS records_scan_idx   ON records(index_id, log_id);

PRAGMA user_version = 1;
";
