//! SQL schema for the SQLite version store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA busy_timeout = 5000;

-- One row per version. Rows are never deleted; the only permitted update
-- sets transaction_to on a current row, once.
CREATE TABLE IF NOT EXISTS versions (
    version_id       TEXT PRIMARY KEY,
    entity_id        TEXT NOT NULL,
    attributes       TEXT NOT NULL,   -- opaque JSON payload
    valid_from       TEXT NOT NULL,   -- RFC 3339 UTC, nanosecond precision
    valid_to         TEXT,            -- NULL = unbounded
    transaction_from TEXT NOT NULL,
    transaction_to   TEXT,            -- NULL = current
    CHECK (valid_to IS NULL OR valid_from < valid_to),
    CHECK (transaction_to IS NULL OR transaction_from < transaction_to)
);

CREATE INDEX IF NOT EXISTS versions_history_idx
    ON versions(entity_id, transaction_from, valid_from);
CREATE INDEX IF NOT EXISTS versions_current_idx
    ON versions(entity_id) WHERE transaction_to IS NULL;

CREATE TRIGGER IF NOT EXISTS versions_no_delete
BEFORE DELETE ON versions
BEGIN
    SELECT RAISE(ABORT, 'versions are append-only');
END;

CREATE TRIGGER IF NOT EXISTS versions_immutable
BEFORE UPDATE OF version_id, entity_id, attributes, valid_from, valid_to,
                 transaction_from ON versions
BEGIN
    SELECT RAISE(ABORT, 'only transaction_to may change');
END;

CREATE TRIGGER IF NOT EXISTS versions_close_once
BEFORE UPDATE OF transaction_to ON versions
WHEN OLD.transaction_to IS NOT NULL
BEGIN
    SELECT RAISE(ABORT, 'version already closed');
END;

PRAGMA user_version = 1;
";
