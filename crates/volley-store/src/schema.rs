//! Database schema.

use rusqlite::Connection;

use crate::errors::StorageError;

/// DDL applied on open. Idempotent — every statement is `IF NOT EXISTS`.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS entities (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    entity_type TEXT NOT NULL,
    role        TEXT,
    email       TEXT,
    confidence  REAL NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_entities_type_name ON entities(entity_type, name);

CREATE TABLE IF NOT EXISTS resolution_records (
    id              TEXT PRIMARY KEY,
    problem_pattern TEXT NOT NULL,
    solution        TEXT NOT NULL,
    system_name     TEXT,
    success_count   INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_resolution_system ON resolution_records(system_name);

CREATE TABLE IF NOT EXISTS resolution_successes (
    record_id        TEXT NOT NULL REFERENCES resolution_records(id),
    completion_token TEXT NOT NULL,
    recorded_at      TEXT NOT NULL,
    PRIMARY KEY (record_id, completion_token)
);

CREATE TABLE IF NOT EXISTS routing_patterns (
    id              TEXT PRIMARY KEY,
    key             TEXT NOT NULL UNIQUE,
    assignee_id     TEXT NOT NULL,
    confidence      REAL NOT NULL,
    times_used      INTEGER NOT NULL DEFAULT 0,
    times_confirmed INTEGER NOT NULL DEFAULT 0,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS lobs (
    id           TEXT PRIMARY KEY,
    text         TEXT NOT NULL,
    sender_id    TEXT NOT NULL,
    workspace_id TEXT NOT NULL,
    submitted_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_lobs_workspace ON lobs(workspace_id);
";

/// Apply the schema to a connection.
pub fn migrate(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}
