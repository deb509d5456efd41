//! SQLite DDL for the widget engine database.
//!
//! All `CREATE TABLE` / `CREATE INDEX` statements live here so they are
//! reviewable and testable in isolation.

use rusqlite::Connection;

/// Current schema version stamped into `schema_meta`.
pub(crate) const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Complete DDL for the widget engine database.
///
/// Uses `IF NOT EXISTS` throughout so `apply_schema` is idempotent.
pub(crate) const SCHEMA_SQL: &str = r#"
-- Enable WAL mode for concurrent reads during writes.
PRAGMA journal_mode = WAL;

-- Schema version tracking.
CREATE TABLE IF NOT EXISTS schema_meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- One row per placed widget instance — mirrors WidgetRecord fields.
CREATE TABLE IF NOT EXISTS widgets (
    widget_id    INTEGER PRIMARY KEY,
    kind         TEXT NOT NULL,       -- WidgetType string id
    size         TEXT NOT NULL,       -- small | medium | large
    payload      TEXT,                -- opaque JSON blob, NULL until first refresh
    last_updated INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_widgets_kind ON widgets(kind);

-- One row per widget holding its current display state machine value.
-- Independent of the widgets table: states outlive failed refreshes and
-- are only removed with the widget instance itself.
CREATE TABLE IF NOT EXISTS widget_states (
    widget_id  INTEGER PRIMARY KEY,
    state      TEXT NOT NULL,         -- JSON AppWidgetState
    updated_at INTEGER NOT NULL DEFAULT 0
);

-- Durable refresh-queue ledger. One row per widget id: inserting over an
-- existing id replaces it, which is the queue's dedup-and-replace rule.
CREATE TABLE IF NOT EXISTS pending_jobs (
    widget_id    INTEGER PRIMARY KEY,
    seq          INTEGER NOT NULL,    -- submission counter, guards deletes
    job          TEXT NOT NULL,       -- JSON RefreshJob
    submitted_at INTEGER NOT NULL DEFAULT 0
);
"#;

/// Apply the full schema to an open connection.
///
/// Safe to call multiple times. Seeds the schema version on a fresh
/// database.
pub(crate) fn apply_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    let version_str = CURRENT_SCHEMA_VERSION.to_string();
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', ?1)",
        rusqlite::params![version_str],
    )?;

    Ok(())
}

/// Read the schema version stamp.
///
/// Returns `None` if the `schema_meta` table is empty or the key is missing.
pub(crate) fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<u32>> {
    let mut stmt = conn.prepare("SELECT value FROM schema_meta WHERE key = 'schema_version'")?;
    let mut rows = stmt.query([])?;
    match rows.next()? {
        Some(row) => {
            let val: String = row.get(0)?;
            Ok(val.parse::<u32>().ok())
        }
        None => Ok(None),
    }
}
