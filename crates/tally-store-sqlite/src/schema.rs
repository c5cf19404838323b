//! SQL schema for the tally SQLite store.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// `values_json` is the opaque field-name-to-value blob. It is never
/// inspected by SQL — reconciliation against the active schema happens in
/// `tally-core` after the row is read.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS records (
    id          TEXT PRIMARY KEY,
    created_at  TEXT NOT NULL,    -- RFC 3339 UTC
    updated_at  TEXT NOT NULL,    -- RFC 3339 UTC
    values_json TEXT NOT NULL     -- JSON object: field name -> value
);

CREATE INDEX IF NOT EXISTS records_updated_idx ON records(updated_at);

PRAGMA user_version = 1;
";
